//! Extraction service gateway.
//!
//! The feature extraction service is an opaque HTTP endpoint. The session
//! controller only needs one call from it, expressed by the
//! [`ExtractionGateway`] trait:
//!
//! - [`ServiceClient`] - reqwest client for the real service (feature `network`)
//! - [`MockGateway`] - scripted replies for tests and offline demos
//!
//! ## Service contract
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/tools/feature-extractor` | multipart `image` + `method`, returns annotated image path and statistics |
//! | `GET /api/tools` | tool catalogue |
//! | `GET /api/health` | liveness report |
//!
//! Failures are normalized into [`GatewayError`]: any non-2xx status or a
//! body without `success: true` becomes `ServiceRejected` carrying the
//! service's `error`/`message` text when present.

#[cfg(feature = "network")]
mod http_client;
mod mock;
mod types;

#[cfg(feature = "network")]
pub use http_client::ServiceClient;
pub use mock::{MockGateway, RecordedCall};
pub use types::{
    failure_message, interpret_extraction, ExtractionResult, HealthReport, ImageUpload,
    ToolDescriptor, ToolStatus,
};

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::method::DetectionMethod;

/// Boundary to the feature extraction service.
///
/// Implementations must be thread-safe (`Send + Sync`) and perform exactly
/// one attempt per call: retrying is the caller's decision.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    /// Submit an image for keypoint extraction with the given method.
    async fn extract(
        &self,
        upload: ImageUpload,
        method: DetectionMethod,
    ) -> Result<ExtractionResult, GatewayError>;
}
