//! Wire types of the extraction service and their interpretation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::GatewayError;
use crate::input::SelectedImage;
use crate::method::DetectionMethod;
use crate::statistics::FeatureStatistics;

/// Image payload of an extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub media_type: Option<String>,
    pub data: Vec<u8>,
}

impl From<&SelectedImage> for ImageUpload {
    fn from(image: &SelectedImage) -> Self {
        Self {
            file_name: image.display_name().to_string(),
            media_type: image.media_type().map(str::to_string),
            data: image.data().to_vec(),
        }
    }
}

/// Successful extraction, with the annotated image URL already resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub succeeded: bool,
    pub method: DetectionMethod,
    pub image_url: Url,
    pub statistics: FeatureStatistics,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolStatus {
    Active,
    ComingSoon,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::ComingSoon => write!(f, "coming soon"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Entry of `GET /api/tools`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub available_tools: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Raw body of `POST /api/tools/feature-extractor`, success or failure.
#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    success: bool,
    method: Option<DetectionMethod>,
    image_url: Option<String>,
    statistics: Option<FeatureStatistics>,
    message: Option<String>,
    error: Option<String>,
}

/// Error body the service sends with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    /// `error` wins over `message`, matching what the service puts first.
    fn into_message(self) -> Option<String> {
        self.error
            .filter(|s| !s.trim().is_empty())
            .or(self.message.filter(|s| !s.trim().is_empty()))
    }
}

/// Extract the service-provided failure message from an arbitrary body.
pub fn failure_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
}

/// Turn a status code and body into a result or a normalized failure.
///
/// Anything other than a 2xx carrying `success: true`, a known method, an
/// `image_url` and `statistics` is a [`GatewayError::ServiceRejected`].
pub fn interpret_extraction(
    status: u16,
    body: &[u8],
    config: &ClientConfig,
) -> Result<ExtractionResult, GatewayError> {
    if !(200..300).contains(&status) {
        let message = failure_message(body);
        warn!(status, message = ?message, "Extraction request rejected");
        return Err(GatewayError::rejected(Some(status), message));
    }

    let response: ExtractionResponse = serde_json::from_slice(body).map_err(|e| {
        warn!(status, error = %e, "Malformed extraction response");
        GatewayError::rejected(Some(status), None)
    })?;

    if !response.success {
        let message = ErrorBody {
            error: response.error,
            message: response.message,
        }
        .into_message();
        warn!(status, message = ?message, "Service reported success=false");
        return Err(GatewayError::rejected(Some(status), message));
    }

    let (Some(method), Some(image_path), Some(statistics)) =
        (response.method, response.image_url, response.statistics)
    else {
        warn!(status, "Extraction response is missing required fields");
        return Err(GatewayError::rejected(Some(status), None));
    };

    let image_url = config.resolve(&image_path).map_err(|e| {
        warn!(image_url = %image_path, error = %e, "Unresolvable image URL");
        GatewayError::rejected(Some(status), None)
    })?;

    debug!(
        method = %method,
        keypoints = statistics.keypoint_count,
        image_url = %image_url,
        "Parsed extraction result"
    );

    Ok(ExtractionResult {
        succeeded: true,
        method,
        image_url,
        statistics,
        message: response.message.unwrap_or_default(),
    })
}
