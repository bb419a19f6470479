use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Largest image the client accepts (16 MiB), matching the service's upload limit.
pub const MAX_IMAGE_BYTES: u64 = 16 * 1024 * 1024;

/// Message shown when a failure carries nothing more specific from the service.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to process image. Please try again.";

/// Rejections raised while acquiring an image. These never reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file provided")]
    NoFile,

    #[error("File has no name")]
    UnnamedFile,

    #[error("File size must be less than 16MB ({size} bytes exceeds {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Not an image: declared media type is '{}'", .media_type.as_deref().unwrap_or("unknown"))]
    NotAnImage { media_type: Option<String> },
}

/// Failures talking to the extraction service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection could not be established or was dropped.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Non-2xx status or a payload that is not a well-formed success.
    #[error(
        "Service rejected the request (status {}): {}",
        .status.map(|s| s.to_string()).unwrap_or_else(|| "n/a".into()),
        .message.as_deref().unwrap_or(FALLBACK_FAILURE_MESSAGE)
    )]
    ServiceRejected {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl GatewayError {
    pub fn rejected(status: Option<u16>, message: Option<String>) -> Self {
        Self::ServiceRejected { status, message }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ServiceUnavailable(_) => FailureKind::ServiceUnavailable,
            Self::ServiceRejected { .. } => FailureKind::ServiceRejected,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Unknown(_) => FailureKind::Unknown,
        }
    }

    /// The text a front-end should show: the service's own message when it
    /// sent one, the generic fallback otherwise.
    pub fn display_message(&self) -> String {
        match self {
            Self::ServiceRejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => FALLBACK_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Category of a failed submission, kept alongside the display message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ServiceUnavailable,
    ServiceRejected,
    Timeout,
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceUnavailable => write!(f, "service unavailable"),
            Self::ServiceRejected => write!(f, "service rejected"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid service URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("Invalid request timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Error, Debug)]
pub enum KeypointError {
    #[error("Invalid image: {0}")]
    Validation(#[from] ValidationError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, KeypointError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_prefers_service_text() {
        let err = GatewayError::rejected(Some(500), Some("decode failed".into()));
        assert_eq!(err.display_message(), "decode failed");
        assert_eq!(err.kind(), FailureKind::ServiceRejected);
    }

    #[test]
    fn test_blank_service_message_falls_back() {
        let err = GatewayError::rejected(Some(502), Some("   ".into()));
        assert_eq!(err.display_message(), FALLBACK_FAILURE_MESSAGE);
    }

    #[test]
    fn test_transport_failures_use_fallback() {
        let unavailable = GatewayError::ServiceUnavailable("connection refused".into());
        let timeout = GatewayError::Timeout(Duration::from_secs(30));

        assert_eq!(unavailable.display_message(), FALLBACK_FAILURE_MESSAGE);
        assert_eq!(timeout.display_message(), FALLBACK_FAILURE_MESSAGE);
        assert_eq!(timeout.kind(), FailureKind::Timeout);
        assert_eq!(timeout.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn test_not_an_image_display() {
        let err = ValidationError::NotAnImage {
            media_type: Some("text/plain".into()),
        };
        assert!(err.to_string().contains("text/plain"));

        let unknown = ValidationError::NotAnImage { media_type: None };
        assert!(unknown.to_string().contains("unknown"));
    }
}
