use thiserror::Error;

/// Shown for every transport-level failure, whatever the cause.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again later.";

/// The two ways a backend call can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server answered with `status != "success"`.
    Api,
    /// The request never produced a readable envelope.
    Network,
}

/// Backend call errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API rejected request ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Rejected { .. } => ErrorKind::Api,
            ApiError::Http(_) | ApiError::Decode(_) => ErrorKind::Network,
        }
    }

    /// Message for a toast: the server's text verbatim, else `fallback`,
    /// or the generic network message for transport failures.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected { message: Some(m), .. } if !m.is_empty() => m.clone(),
            ApiError::Rejected { .. } => fallback.to_string(),
            _ => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_is_verbatim() {
        let err = ApiError::Rejected {
            status: 404,
            message: Some("Dataset not found".to_string()),
        };
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.user_message("Failed to delete dataset"), "Dataset not found");
    }

    #[test]
    fn test_rejected_without_message_uses_fallback() {
        let err = ApiError::Rejected { status: 500, message: None };
        assert_eq!(err.user_message("Failed to delete dataset"), "Failed to delete dataset");

        let blank = ApiError::Rejected { status: 500, message: Some(String::new()) };
        assert_eq!(blank.user_message("fallback"), "fallback");
    }

    #[test]
    fn test_decode_failure_is_network_kind() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.user_message("ignored"), NETWORK_ERROR_MESSAGE);
    }
}
