use async_trait::async_trait;
use hub_core::{FileStorage, Handler, StatusResponse};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct PostgresParams {
    /// PostgreSQL connection URL (built from individual fields or provided directly)
    pub url: String,

    /// Path to a TLS root certificate, when the server requires one
    pub ssl_ca: Option<String>,

    /// Connection attempt timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

impl<'de> Deserialize<'de> for PostgresParams {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct PostgresParamsHelper {
            // Direct URL format
            url: Option<String>,

            // Individual fields format
            host: Option<String>,
            port: Option<u16>,
            #[serde(alias = "username")]
            user: Option<String>,
            password: Option<String>,
            database: Option<String>,

            ssl_ca: Option<String>,
            #[serde(default = "default_connect_timeout")]
            connect_timeout: u64,
        }

        let helper = PostgresParamsHelper::deserialize(deserializer)?;

        let url = if let Some(url) = helper.url {
            url
        } else if let (Some(host), Some(user)) = (helper.host, helper.user) {
            let port = helper.port.unwrap_or(5432);
            let password = helper.password.unwrap_or_default();
            let database = helper.database.unwrap_or_else(|| "postgres".to_string());

            if password.is_empty() {
                format!("postgresql://{}@{}:{}/{}", user, host, port, database)
            } else {
                format!(
                    "postgresql://{}:{}@{}:{}/{}",
                    user, password, host, port, database
                )
            }
        } else {
            return Err(D::Error::custom(
                "either 'url' or 'host' and 'user' params are required",
            ));
        };

        Ok(PostgresParams {
            url,
            ssl_ca: helper.ssl_ca,
            connect_timeout: helper.connect_timeout,
        })
    }
}

/// Handler for PostgreSQL integrations.
///
/// A supplied TLS root certificate is copied into handler storage on
/// creation, so it survives temp-dir cleanup and travels with storage
/// export/import.
pub struct PostgresHandler {
    params: PostgresParams,
    storage: FileStorage,
}

const ROOT_CERT_NAME: &str = "root.crt";

impl PostgresHandler {
    pub fn new(params: PostgresParams, storage: FileStorage) -> hub_core::Result<Self> {
        if let Some(ssl_ca) = &params.ssl_ca {
            let contents = std::fs::read(ssl_ca)?;
            storage.put(ROOT_CERT_NAME, &contents)?;
        }
        Ok(Self { params, storage })
    }

    fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        let mut options = PgConnectOptions::from_str(&self.params.url)?;
        if self.storage.contains(ROOT_CERT_NAME) {
            options = options.ssl_root_cert(self.storage.root().join(ROOT_CERT_NAME));
        }
        Ok(options)
    }
}

#[async_trait]
impl Handler for PostgresHandler {
    fn engine(&self) -> &str {
        "postgres"
    }

    async fn check_connection(&self) -> StatusResponse {
        let options = match self.connect_options() {
            Ok(options) => options,
            Err(e) => return StatusResponse::failed(format!("Invalid connection params: {}", e)),
        };

        debug!("Checking PostgreSQL connection");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.params.connect_timeout))
            .connect_with(options)
            .await;

        let pool = match pool {
            Ok(pool) => pool,
            Err(e) => return StatusResponse::failed(format!("Connection failed: {}", e)),
        };

        let result = sqlx::query("SELECT 1").execute(&pool).await;
        pool.close().await;

        match result {
            Ok(_) => StatusResponse::ok(),
            Err(e) => StatusResponse::failed(format!("Query failed: {}", e)),
        }
    }

    fn file_storage(&self) -> Option<&FileStorage> {
        Some(&self.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_from_url() {
        let params: PostgresParams =
            serde_json::from_value(json!({"url": "postgresql://u@h:5433/db"})).unwrap();
        assert_eq!(params.url, "postgresql://u@h:5433/db");
        assert_eq!(params.connect_timeout, 10);
    }

    #[test]
    fn test_params_from_fields() {
        let params: PostgresParams = serde_json::from_value(json!({
            "host": "db.local",
            "user": "hub",
            "password": "pw",
            "database": "main",
        }))
        .unwrap();
        assert_eq!(params.url, "postgresql://hub:pw@db.local:5432/main");
    }

    #[test]
    fn test_params_missing_fields() {
        let result = serde_json::from_value::<PostgresParams>(json!({"host": "db.local"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_cert_copied_into_storage() {
        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("uploaded.crt");
        std::fs::write(&cert_path, b"---cert---").unwrap();

        let params: PostgresParams = serde_json::from_value(json!({
            "url": "postgresql://u@h/db",
            "ssl_ca": cert_path.to_string_lossy(),
        }))
        .unwrap();

        let handler = PostgresHandler::new(params, FileStorage::temporary().unwrap()).unwrap();
        let storage = handler.file_storage().unwrap();
        assert!(storage.contains(ROOT_CERT_NAME));
    }
}
