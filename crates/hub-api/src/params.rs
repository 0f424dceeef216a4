use crate::ApiError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use hub_core::resolve_within;
use serde_json::{Map, Value};
use tempfile::TempDir;

const BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Params extracted from a request body, plus the temp dir guard for any
/// uploaded files. The directory is removed when the guard drops, which
/// covers every exit path of the calling handler.
pub struct RequestParams {
    pub params: Map<String, Value>,
    pub temp_dir: Option<TempDir>,
}

/// Extract integration params from a request.
///
/// JSON bodies carry params under a top-level `params` object; urlencoded
/// and multipart bodies contribute each field directly. Multipart file
/// parts are saved into a per-request temp dir and the saved path replaces
/// the field value, with a containment check so a crafted filename cannot
/// land outside the temp dir.
pub async fn extract_params(req: Request) -> Result<RequestParams, ApiError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        return extract_multipart(req).await;
    }

    let bytes = axum::body::to_bytes(req.into_body(), BODY_LIMIT)
        .await
        .map_err(|e| ApiError::bad_request("Wrong argument", format!("Unreadable body: {}", e)))?;

    if content_type.starts_with("application/json") {
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::bad_request("Wrong argument", format!("Invalid JSON: {}", e)))?;

        let params = match body.get("params") {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(ApiError::bad_request(
                    "Wrong argument",
                    "type of 'params' must be dict",
                ))
            }
        };
        return Ok(RequestParams {
            params,
            temp_dir: None,
        });
    }

    // urlencoded form, also covers an empty body
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
        .map_err(|e| ApiError::bad_request("Wrong argument", format!("Invalid form body: {}", e)))?;

    let params = pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    Ok(RequestParams {
        params,
        temp_dir: None,
    })
}

async fn extract_multipart(req: Request) -> Result<RequestParams, ApiError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| ApiError::bad_request("Wrong argument", e.to_string()))?;

    let mut params = Map::new();
    let mut temp_dir: Option<TempDir> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request("Wrong argument", e.to_string()))?
    {
        let key = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request("Wrong argument", e.to_string()))?;

            let base = if let Some(dir) = &temp_dir {
                dir.path().to_path_buf()
            } else {
                let dir = tempfile::Builder::new()
                    .prefix("integration_files_")
                    .tempdir()
                    .map_err(|e| ApiError::internal("Error", e.to_string()))?;
                let path = dir.path().to_path_buf();
                temp_dir = Some(dir);
                path
            };

            // traversal guard: the save path must stay inside the temp dir
            let path = resolve_within(&base, &file_name)
                .map_err(|e| ApiError::internal("Error", e.to_string()))?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ApiError::internal("Error", e.to_string()))?;
            }
            std::fs::write(&path, &data)
                .map_err(|e| ApiError::internal("Error", e.to_string()))?;

            params.insert(key, Value::String(path.to_string_lossy().into_owned()));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request("Wrong argument", e.to_string()))?;
            params.insert(key, Value::String(text));
        }
    }

    Ok(RequestParams { params, temp_dir })
}
