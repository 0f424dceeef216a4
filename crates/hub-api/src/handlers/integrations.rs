use crate::params::{extract_params, RequestParams};
use crate::{handlers::AppState, ApiError};
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hub_core::{Error, StatusResponse};
use hub_store::is_truthy;
use serde_json::{json, Value};
use tracing::{error, warn};

const DEFAULT_SECRET_KEY: &str = "dummy-key";

/// The system secret key used for storage blob encryption.
///
/// Falls back to a well-known default when unset, which is only suitable
/// for development; the fallback is logged so operators notice.
async fn secret_key(state: &AppState) -> String {
    let config = state.config.read().await;
    match config.secret_key() {
        Some(key) => key.to_string(),
        None => {
            warn!("secret_key is not configured, using the default development key");
            DEFAULT_SECRET_KEY.to_string()
        }
    }
}

pub async fn list_integrations(State(state): State<AppState>) -> impl IntoResponse {
    let controller = state.controller.read().await;
    Json(json!({"integrations": controller.names()}))
}

pub async fn all_integrations(State(state): State<AppState>) -> impl IntoResponse {
    let controller = state.controller.read().await;
    Json(controller.get_all(false))
}

pub async fn get_integration(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let controller = state.controller.read().await;
    match controller.get(&name, false) {
        Some(entry) => Ok(Json(entry).into_response()),
        None => Err(ApiError::not_found(
            "Not found",
            format!("Can't find integration: {}", name),
        )),
    }
}

/// Create an integration, or run a transient connection test when the
/// `test` param is set. Test mode never persists anything.
pub async fn upsert_integration(
    State(state): State<AppState>,
    Path(name): Path<String>,
    req: Request,
) -> Result<Response, ApiError> {
    // temp_dir holds any uploaded files; dropping it at any exit removes them
    let RequestParams {
        mut params,
        temp_dir: _temp_dir,
    } = extract_params(req).await?;

    if params.is_empty() {
        return Err(ApiError::bad_request(
            "Wrong argument",
            "type of 'params' must be dict",
        ));
    }

    let is_test = params.get("test").map(is_truthy).unwrap_or(false);

    if is_test {
        params.remove("test");
        let engine = params
            .remove("type")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        params.remove("publish");
        let has_code = params.contains_key("code");

        let controller = state.controller.read().await;
        let resp = match controller.create_tmp_handler(&name, &engine, Value::Object(params)) {
            Ok(handler) => {
                let status = handler.check_connection().await;
                let mut resp = serde_json::to_value(&status)
                    .map_err(|e| ApiError::internal("Error", e.to_string()))?;

                if status.success && has_code {
                    if let Some(storage) = handler.file_storage() {
                        let export = storage
                            .export_files()
                            .map_err(|e| ApiError::internal("Error", e.to_string()))?;
                        if let Some(export) = export {
                            let encrypted = hub_crypto::encrypt(&export, &secret_key(&state).await)
                                .map_err(|e| ApiError::internal("Error", e.to_string()))?;
                            resp["storage"] = Value::String(encrypted);
                        }
                    }
                }
                resp
            }
            // an unknown engine is reported inside the payload, not as a
            // transport error
            Err(Error::UnknownEngine(engine)) => serde_json::to_value(StatusResponse::failed(
                format!("Unknown engine '{}'", engine),
            ))
            .map_err(|e| ApiError::internal("Error", e.to_string()))?,
            Err(e) => {
                error!("Failed to create test handler: {}", e);
                return Err(ApiError::internal(
                    "Error",
                    format!("Error during connection test: {}", e),
                ));
            }
        };

        return Ok(Json(resp).into_response());
    }

    let mut controller = state.controller.write().await;
    if controller.exists(&name) {
        return Err(ApiError::bad_request(
            "Wrong argument",
            format!("Integration with name '{}' already exists", name),
        ));
    }

    let engine = match params.remove("type") {
        Some(Value::String(engine)) => engine,
        _ => {
            return Err(ApiError::bad_request(
                "Wrong argument",
                "param 'type' is required",
            ))
        }
    };
    params.remove("publish");
    let storage_blob = params.remove("storage");

    if let Err(e) = controller.add(&name, &engine, Value::Object(params)) {
        error!("Failed to create integration '{}': {}", name, e);
        return Err(ApiError::internal(
            "Error",
            format!("Error during config update: {}", e),
        ));
    }

    if let Some(blob) = storage_blob {
        if let Err(e) = import_storage(&state, &controller, &name, &blob).await {
            error!("Failed to import storage for '{}': {}", name, e);
            return Err(ApiError::internal(
                "Error",
                format!("Error during config update: {}", e),
            ));
        }
    }

    Ok(Json(json!({})).into_response())
}

async fn import_storage(
    state: &AppState,
    controller: &hub_store::IntegrationController,
    name: &str,
    blob: &Value,
) -> anyhow::Result<()> {
    let blob = blob
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("'storage' must be a string"))?;

    let export = hub_crypto::decrypt(blob, &secret_key(state).await)?;

    let handler = controller.get_data_handler(name)?;
    match handler.file_storage() {
        Some(storage) => storage.import_files(&export)?,
        None => anyhow::bail!("handler of engine does not expose file storage"),
    }
    Ok(())
}

pub async fn delete_integration(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut controller = state.controller.write().await;

    if !controller.exists(&name) {
        return Err(ApiError::bad_request(
            "Integration does not exists",
            format!("Nothing to delete. '{}' not exists.", name),
        ));
    }

    if let Err(e) = controller.delete(&name) {
        error!("Failed to delete integration '{}': {}", name, e);
        return Err(ApiError::internal(
            "Error",
            format!("Error during integration delete: {}", e),
        ));
    }

    Ok(StatusCode::OK)
}

pub async fn modify_integration(
    State(state): State<AppState>,
    Path(name): Path<String>,
    req: Request,
) -> Result<StatusCode, ApiError> {
    let RequestParams { mut params, .. } = extract_params(req).await?;

    let mut controller = state.controller.write().await;
    if !controller.exists(&name) {
        return Err(ApiError::bad_request(
            "Integration does not exists",
            format!("Nothing to modify. '{}' not exists.", name),
        ));
    }

    // the wire flag is 'enabled'; the stored flag is 'publish'
    if let Some(enabled) = params.remove("enabled") {
        params.insert("publish".to_string(), enabled);
    }

    if let Err(e) = controller.modify(&name, params) {
        error!("Failed to modify integration '{}': {}", name, e);
        return Err(ApiError::internal(
            "Error",
            format!("Error during integration modification: {}", e),
        ));
    }

    Ok(StatusCode::OK)
}
