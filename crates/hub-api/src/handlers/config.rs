use crate::{handlers::AppState, ApiError};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{Map, Value};

const ALLOWED_KEYS: &[&str] = &[
    "auth",
    "default_llm",
    "default_embedding_model",
    "default_reranking_model",
];

/// Keys applied as full overwrites rather than deep merges.
const OVERWRITE_KEYS: &[&str] = &[
    "default_llm",
    "default_embedding_model",
    "default_reranking_model",
];

/// Nested keys whose sub-keys must already exist in the current config.
const NESTED_VALIDATED_KEYS: &[&str] = &["auth"];

pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.config.read().await;
    Json(config.projection())
}

pub async fn put_config(
    State(state): State<AppState>,
    Json(data): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let data = match data {
        Value::Object(map) => map,
        _ => {
            return Err(ApiError::bad_request(
                "Wrong arguments",
                "Request body must be a JSON object",
            ))
        }
    };

    let unknown: Vec<_> = data
        .keys()
        .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ApiError::bad_request(
            "Wrong arguments",
            format!("Unknown arguments: {:?}", unknown),
        ));
    }

    let mut config = state.config.write().await;

    for key in NESTED_VALIDATED_KEYS {
        let Some(patch) = data.get(*key) else {
            continue;
        };
        let patch = patch.as_object().ok_or_else(|| {
            ApiError::bad_request("Wrong arguments", format!("'{}' must be an object", key))
        })?;

        let current = config.section(key).cloned().unwrap_or_default();
        let unknown: Vec<_> = patch
            .keys()
            .filter(|sub_key| !current.contains_key(*sub_key))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ApiError::bad_request(
                "Wrong arguments",
                format!("Unknown arguments: {:?}", unknown),
            ));
        }
    }

    let mut overwrite_data = Map::new();
    let mut merge_data = Map::new();
    for (key, value) in data {
        if OVERWRITE_KEYS.contains(&key.as_str()) {
            overwrite_data.insert(key, value);
        } else {
            merge_data.insert(key, value);
        }
    }

    if !overwrite_data.is_empty() {
        config
            .update(overwrite_data, true)
            .map_err(|e| ApiError::internal("Error", format!("Error during config update: {}", e)))?;
    }
    if !merge_data.is_empty() {
        config
            .update(merge_data, false)
            .map_err(|e| ApiError::internal("Error", format!("Error during config update: {}", e)))?;
    }

    Ok(StatusCode::OK)
}
