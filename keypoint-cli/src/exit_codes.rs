//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell a rejected image from an unreachable
//! service without parsing stderr.

use keypoint_core::{
    ConfigError, FailureKind, GatewayError, KeypointError, SessionFailure, ValidationError,
};

/// General error (catch-all).
pub const GENERAL_ERROR: u8 = 1;

/// Command line usage error (invalid arguments or configuration).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: u8 = 64;

/// Data format error (not an image, too large, refused by the service).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: u8 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: u8 = 66;

/// Extraction service unreachable, failing or too slow.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: u8 = 69;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: u8 = 74;

/// Failure-to-exit-code mapping, with the message to print.
pub struct Exit {
    pub code: u8,
    pub message: Option<String>,
}

impl Exit {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let code = err
            .chain()
            .find_map(classify)
            .unwrap_or_else(|| classify_message(&message));

        Self {
            code,
            message: Some(message),
        }
    }
}

/// Typed errors from the core crate, wherever they sit in the chain.
fn classify(cause: &(dyn std::error::Error + 'static)) -> Option<u8> {
    if let Some(err) = cause.downcast_ref::<KeypointError>() {
        return Some(match err {
            KeypointError::Validation(_) => DATA_ERROR,
            KeypointError::Gateway(err) => for_gateway(err),
            KeypointError::Config(_) => USAGE_ERROR,
        });
    }
    if cause.downcast_ref::<ValidationError>().is_some() {
        return Some(DATA_ERROR);
    }
    if let Some(err) = cause.downcast_ref::<GatewayError>() {
        return Some(for_gateway(err));
    }
    if let Some(failure) = cause.downcast_ref::<SessionFailure>() {
        return Some(for_kind(failure.kind, failure.status));
    }
    if cause.downcast_ref::<ConfigError>().is_some() {
        return Some(USAGE_ERROR);
    }
    None
}

fn for_gateway(err: &GatewayError) -> u8 {
    match err {
        GatewayError::ServiceRejected { status, .. } => {
            for_kind(FailureKind::ServiceRejected, *status)
        }
        other => for_kind(other.kind(), None),
    }
}

fn for_kind(kind: FailureKind, status: Option<u16>) -> u8 {
    match kind {
        FailureKind::ServiceUnavailable | FailureKind::Timeout => UNAVAILABLE,
        FailureKind::ServiceRejected if status.is_some_and(|s| s >= 500) => UNAVAILABLE,
        FailureKind::ServiceRejected => DATA_ERROR,
        FailureKind::Unknown => GENERAL_ERROR,
    }
}

/// Plain I/O failures carry no type of their own; the context says which side failed.
fn classify_message(message: &str) -> u8 {
    if message.contains("Failed to read file") {
        INPUT_ERROR
    } else if message.contains("Failed to write") {
        IO_ERROR
    } else {
        GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Context;

    use super::*;

    fn code_of(err: anyhow::Error) -> u8 {
        Exit::from_anyhow(&err).code
    }

    #[test]
    fn test_validation_is_data_error() {
        let err = anyhow::Error::new(ValidationError::NoFile).context("Image rejected");
        assert_eq!(code_of(err), DATA_ERROR);
    }

    #[test]
    fn test_gateway_failures() {
        let unavailable = GatewayError::ServiceUnavailable("refused".into());
        assert_eq!(code_of(unavailable.into()), UNAVAILABLE);

        let timeout = GatewayError::Timeout(Duration::from_secs(30));
        assert_eq!(code_of(timeout.into()), UNAVAILABLE);

        let bad_request = GatewayError::rejected(Some(400), Some("bad".into()));
        assert_eq!(code_of(bad_request.into()), DATA_ERROR);

        let server = GatewayError::rejected(Some(500), None);
        assert_eq!(code_of(server.into()), UNAVAILABLE);
    }

    #[test]
    fn test_session_failure_uses_kind() {
        let failure = SessionFailure {
            kind: FailureKind::Unknown,
            message: "boom".into(),
            status: None,
        };
        assert_eq!(code_of(failure.into()), GENERAL_ERROR);
    }

    #[test]
    fn test_session_rejection_maps_like_direct_call() {
        for (status, code) in [(500, UNAVAILABLE), (400, DATA_ERROR)] {
            let err = GatewayError::rejected(Some(status), Some("Processing failed".into()));
            let failure = SessionFailure::from(&err);
            let session = anyhow::Error::new(failure).context("Extraction failed");

            assert_eq!(code_of(session), code);
            assert_eq!(code_of(err.into()), code);
        }
    }

    #[test]
    fn test_config_error_is_usage() {
        let err = ConfigError::InvalidTimeout("0".into());
        assert_eq!(code_of(KeypointError::from(err).into()), USAGE_ERROR);
    }

    #[test]
    fn test_io_context() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Err::<(), _>(missing)
            .context("Failed to read file: a.png")
            .unwrap_err();
        assert_eq!(code_of(err), INPUT_ERROR);

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro");
        let err = Err::<(), _>(denied)
            .context("Failed to write annotated image")
            .unwrap_err();
        assert_eq!(code_of(err), IO_ERROR);
    }
}
