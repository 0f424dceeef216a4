use async_trait::async_trait;
use hub_core::{Handler, StatusResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsParams {
    /// NATS server URL(s)
    pub servers: Vec<String>,

    /// Optional username for authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Optional password for authentication
    #[serde(default)]
    pub password: Option<String>,

    /// Optional token for authentication
    #[serde(default)]
    pub token: Option<String>,
}

/// Handler for NATS integrations. Keeps no file storage.
pub struct NatsHandler {
    params: NatsParams,
}

impl NatsHandler {
    pub fn new(params: NatsParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Handler for NatsHandler {
    fn engine(&self) -> &str {
        "nats"
    }

    async fn check_connection(&self) -> StatusResponse {
        debug!("Checking NATS connection to {:?}", self.params.servers);

        let mut opts = async_nats::ConnectOptions::new();

        if let Some(username) = &self.params.username {
            if let Some(password) = &self.params.password {
                opts = opts.user_and_password(username.clone(), password.clone());
            }
        }
        if let Some(token) = &self.params.token {
            opts = opts.token(token.clone());
        }

        match opts.connect(self.params.servers.join(",")).await {
            Ok(client) => {
                drop(client);
                StatusResponse::ok()
            }
            Err(e) => StatusResponse::failed(format!("Connection failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_deserialization() {
        let params: NatsParams = serde_json::from_value(json!({
            "servers": ["nats://localhost:4222"],
            "token": "t",
        }))
        .unwrap();
        assert_eq!(params.servers.len(), 1);
        assert!(params.username.is_none());
        assert_eq!(params.token.as_deref(), Some("t"));
    }
}
