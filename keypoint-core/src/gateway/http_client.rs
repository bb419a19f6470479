//! HTTP client for the extraction service.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::types::{failure_message, interpret_extraction};
use super::{ExtractionGateway, ExtractionResult, HealthReport, ImageUpload, ToolDescriptor};
use crate::config::ClientConfig;
use crate::error::{ConfigError, GatewayError};
use crate::method::DetectionMethod;

const EXTRACT_PATH: &str = "/api/tools/feature-extractor";
const TOOLS_PATH: &str = "/api/tools";
const HEALTH_PATH: &str = "/api/health";

/// Extraction service client.
///
/// One request per call, bounded by the configured timeout. No retries.
///
/// ## Example
///
/// ```no_run
/// use keypoint_core::{ClientConfig, DetectionMethod, ExtractionGateway, ImageUpload, ServiceClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ServiceClient::new(ClientConfig::from_env()?)?;
/// let upload = ImageUpload {
///     file_name: "scene.png".into(),
///     media_type: Some("image/png".into()),
///     data: std::fs::read("scene.png")?,
/// };
/// let result = client.extract(upload, DetectionMethod::Orb).await?;
/// println!("{} keypoints, see {}", result.statistics.keypoint_count, result.image_url);
/// # Ok(())
/// # }
/// ```
pub struct ServiceClient {
    client: Client,
    config: ClientConfig,
}

impl ServiceClient {
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        debug!("Creating extraction service client");

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                ConfigError::HttpClient(e.to_string())
            })?;

        info!("Extraction service client created");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the tool catalogue.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, GatewayError> {
        self.get_json(TOOLS_PATH).await
    }

    /// Query the service health endpoint.
    #[instrument(level = "debug", skip(self))]
    pub async fn health(&self) -> Result<HealthReport, GatewayError> {
        self.get_json(HEALTH_PATH).await
    }

    /// Download the annotated image a successful extraction points to.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn download(&self, url: &Url) -> Result<Vec<u8>, GatewayError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = Self::ensure_success(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        debug!(
            bytes = bytes.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Downloaded annotated image"
        );
        Ok(bytes.to_vec())
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.config
            .resolve(path)
            .map_err(|e| GatewayError::Unknown(format!("Invalid endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.endpoint(path)?;
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = Self::ensure_success(response).await?;
        let status = response.status().as_u16();

        let parsed = response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse JSON response");
            GatewayError::rejected(Some(status), None)
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed successfully"
        );
        Ok(parsed)
    }

    async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = failure_message(&body);
        warn!(status = %status, message = ?message, "Service returned an error status");
        Err(GatewayError::rejected(Some(status.as_u16()), message))
    }

    fn transport_error(&self, error: reqwest::Error) -> GatewayError {
        classify_transport_error(&error, self.config.timeout)
    }
}

/// Map a reqwest failure onto the gateway taxonomy.
fn classify_transport_error(error: &reqwest::Error, timeout: std::time::Duration) -> GatewayError {
    if error.is_timeout() {
        warn!(error = %error, "Request timed out");
        GatewayError::Timeout(timeout)
    } else if error.is_connect() || error.is_request() {
        warn!(error = %error, "Service unreachable");
        GatewayError::ServiceUnavailable(error.to_string())
    } else if error.is_decode() || error.is_body() {
        warn!(error = %error, "Failed to read response body");
        GatewayError::rejected(error.status().map(|s| s.as_u16()), None)
    } else {
        warn!(error = %error, "Unexpected HTTP error");
        GatewayError::Unknown(error.to_string())
    }
}

#[async_trait]
impl ExtractionGateway for ServiceClient {
    #[instrument(
        level = "info",
        skip(self, upload),
        fields(file = %upload.file_name, bytes = upload.data.len(), method = %method)
    )]
    async fn extract(
        &self,
        upload: ImageUpload,
        method: DetectionMethod,
    ) -> Result<ExtractionResult, GatewayError> {
        let url = self.endpoint(EXTRACT_PATH)?;
        let start = Instant::now();

        let mut part = Part::bytes(upload.data).file_name(upload.file_name);
        if let Some(media_type) = upload.media_type.as_deref() {
            part = part
                .mime_str(media_type)
                .map_err(|e| GatewayError::Unknown(format!("Invalid media type: {e}")))?;
        }
        let form = Form::new()
            .part("image", part)
            .text("method", method.as_str());

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        debug!(status, "Received HTTP response");

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        let result = interpret_extraction(status, &body, &self.config);

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(r) => info!(
                latency_ms,
                keypoints = r.statistics.keypoint_count,
                "Extraction completed"
            ),
            Err(e) => warn!(latency_ms, error = %e, "Extraction failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_create_client() {
        assert!(ServiceClient::new(ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_endpoint_resolution() {
        let client = ServiceClient::new(
            ClientConfig::default()
                .with_base_url("http://127.0.0.1:9000/")
                .unwrap(),
        )
        .unwrap();

        assert_eq!(
            client.endpoint(EXTRACT_PATH).unwrap().as_str(),
            "http://127.0.0.1:9000/api/tools/feature-extractor"
        );
        assert_eq!(
            client.endpoint(TOOLS_PATH).unwrap().as_str(),
            "http://127.0.0.1:9000/api/tools"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Port 9 (discard) on loopback is closed on test machines.
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        let client = ServiceClient::new(config).unwrap();

        let upload = ImageUpload {
            file_name: "a.png".into(),
            media_type: Some("image/png".into()),
            data: vec![1, 2, 3],
        };
        let err = client
            .extract(upload, DetectionMethod::Sift)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServiceUnavailable(_)));
    }
}
