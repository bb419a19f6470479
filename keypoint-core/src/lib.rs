//! Keypoint Core - client side of the Keypoint Lab feature extractor
//!
//! This crate implements the upload → validate → submit → render pipeline
//! of the feature extraction tool. The keypoint detection itself (SIFT, ORB,
//! AKAZE, BRISK) runs in a remote service; this crate never looks at pixels.
//!
//! # Features
//!
//! - File selection from a picker or a drop event, with 16 MiB and `image/*` checks
//! - Scoped preview handles that are released on replace, reset and drop
//! - Explicit session state machine (idle, submitting, succeeded, failed)
//! - Last-submission-wins: responses that arrive after a reset are discarded
//! - Typed normalization of service failures into displayable messages
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use keypoint_core::{
//!     ClientConfig, DetectionMethod, FeatureExtractor, FileSource, MemoryPreviewStore,
//!     PickedFile, ServiceClient, SessionState,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let timeout = config.timeout;
//! let tool = FeatureExtractor::new(
//!     Arc::new(ServiceClient::new(config)?),
//!     Arc::new(MemoryPreviewStore::new()),
//!     timeout,
//! );
//!
//! let file = PickedFile::new("scene.png", Some("image/png"), std::fs::read("scene.png")?);
//! tool.select_file(FileSource::Drop(vec![file]))?;
//! tool.set_method(DetectionMethod::Orb);
//! tool.submit().await;
//!
//! match tool.current_state() {
//!     SessionState::Succeeded(result) => println!("{}", result.image_url),
//!     SessionState::Failed(failure) => eprintln!("{}", failure.message),
//!     _ => {}
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod input;
pub mod method;
pub mod session;
pub mod statistics;

// Re-export main types for convenience
pub use config::ClientConfig;
pub use error::{
    ConfigError, FailureKind, GatewayError, KeypointError, Result, ValidationError,
    FALLBACK_FAILURE_MESSAGE, MAX_IMAGE_BYTES,
};
pub use extractor::{FeatureExtractor, Selection};
pub use gateway::{
    ExtractionGateway, ExtractionResult, HealthReport, ImageUpload, MockGateway, ToolDescriptor,
    ToolStatus,
};
pub use input::{
    FileSource, InputAcquisition, MemoryPreviewStore, PickedFile, PreviewHandle, PreviewStore,
    SelectedImage,
};
pub use method::DetectionMethod;
pub use session::{SessionController, SessionFailure, SessionState, SubmitOutcome};
pub use statistics::{FeatureStatistics, StatRow, ValueRange};

// Network-dependent exports
#[cfg(feature = "network")]
pub use gateway::ServiceClient;
