use crate::FileStorage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a connection check.
///
/// Failures are carried inside the payload rather than as transport
/// errors, so a failed check is still a successful HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// Trait for integration handlers
#[async_trait]
pub trait Handler: Send + Sync {
    /// Engine identifier this handler was built for
    fn engine(&self) -> &str;

    /// Try to reach the target system with the configured params
    async fn check_connection(&self) -> StatusResponse;

    /// File-backed state, for handlers that keep any
    fn file_storage(&self) -> Option<&FileStorage> {
        None
    }
}
