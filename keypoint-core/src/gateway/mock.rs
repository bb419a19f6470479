//! Scripted gateway for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::types::interpret_extraction;
use super::{ExtractionGateway, ExtractionResult, ImageUpload};
use crate::config::ClientConfig;
use crate::error::GatewayError;
use crate::method::DetectionMethod;

/// A call seen by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub file_name: String,
    pub media_type: Option<String>,
    pub bytes: usize,
    pub method: DetectionMethod,
}

enum Reply {
    Http { status: u16, body: Vec<u8> },
    Error(GatewayError),
}

/// Gateway that answers from a queue of scripted replies.
///
/// HTTP-shaped replies go through the same interpretation as the real
/// client, so status/body normalization is exercised end to end. When a gate
/// is set, every call parks until the gate is notified, which lets tests
/// interleave other operations with an in-flight request.
/// WARNING: Not connected to any service.
pub struct MockGateway {
    config: ClientConfig,
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Option<Arc<Notify>>,
}

impl MockGateway {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Park every call until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Queue an HTTP reply with a JSON body.
    pub fn reply_json(self, status: u16, body: serde_json::Value) -> Self {
        let body = serde_json::to_vec(&body).unwrap_or_default();
        self.reply_raw(status, body)
    }

    /// Queue an HTTP reply with an arbitrary body.
    pub fn reply_raw(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Reply::Http {
            status,
            body: body.into(),
        });
        self
    }

    /// Queue a transport-level failure.
    pub fn reply_error(self, error: GatewayError) -> Self {
        self.push(Reply::Error(error));
        self
    }

    /// Echo of a successful extraction with the given method and keypoint count.
    pub fn success_body(method: DetectionMethod, keypoints: u64) -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "method": method.as_str(),
            "image_url": format!("/api/outputs/features_{}.png", method.as_str()),
            "statistics": { "num_keypoints": keypoints },
            "message": format!("Successfully detected {keypoints} keypoints using {method}"),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    fn push(&self, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    fn next_reply(&self) -> Option<Reply> {
        self.replies.lock().ok().and_then(|mut r| r.pop_front())
    }
}

#[async_trait]
impl ExtractionGateway for MockGateway {
    async fn extract(
        &self,
        upload: ImageUpload,
        method: DetectionMethod,
    ) -> Result<ExtractionResult, GatewayError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                file_name: upload.file_name,
                media_type: upload.media_type,
                bytes: upload.data.len(),
                method,
            });
        }

        // Replies follow call order, not wake-up order.
        let reply = self.next_reply();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match reply {
            Some(Reply::Http { status, body }) => interpret_extraction(status, &body, &self.config),
            Some(Reply::Error(err)) => Err(err),
            None => Err(GatewayError::Unknown("no scripted reply".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> ImageUpload {
        ImageUpload {
            file_name: "a.png".into(),
            media_type: Some("image/png".into()),
            data: vec![0; 16],
        }
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let gateway = MockGateway::new(ClientConfig::default())
            .reply_json(200, MockGateway::success_body(DetectionMethod::Akaze, 7))
            .reply_error(GatewayError::ServiceUnavailable("down".into()));

        let first = gateway.extract(upload(), DetectionMethod::Akaze).await.unwrap();
        assert_eq!(first.statistics.keypoint_count, 7);
        assert_eq!(first.method, DetectionMethod::Akaze);

        let second = gateway.extract(upload(), DetectionMethod::Akaze).await;
        assert!(matches!(second, Err(GatewayError::ServiceUnavailable(_))));

        let third = gateway.extract(upload(), DetectionMethod::Akaze).await;
        assert!(matches!(third, Err(GatewayError::Unknown(_))));
    }

    #[tokio::test]
    async fn test_records_calls() {
        let gateway = MockGateway::new(ClientConfig::default())
            .reply_json(200, MockGateway::success_body(DetectionMethod::Orb, 1));

        let _ = gateway.extract(upload(), DetectionMethod::Orb).await;

        assert_eq!(
            gateway.calls(),
            vec![RecordedCall {
                file_name: "a.png".into(),
                media_type: Some("image/png".into()),
                bytes: 16,
                method: DetectionMethod::Orb,
            }]
        );
    }

    #[tokio::test]
    async fn test_gated_replies_follow_call_order() {
        let gate = Arc::new(Notify::new());
        let gateway = MockGateway::new(ClientConfig::default())
            .with_gate(gate.clone())
            .reply_json(200, MockGateway::success_body(DetectionMethod::Sift, 1))
            .reply_json(200, MockGateway::success_body(DetectionMethod::Sift, 2));
        let named = |name: &str| ImageUpload {
            file_name: name.into(),
            ..upload()
        };

        let a = gateway.extract(named("a.png"), DetectionMethod::Sift);
        let b = gateway.extract(named("b.png"), DetectionMethod::Sift);
        let release = async {
            tokio::task::yield_now().await;
            gate.notify_waiters();
        };
        let (a, b, ()) = tokio::join!(a, b, release);

        let (first, second) = if gateway.calls()[0].file_name == "a.png" {
            (a, b)
        } else {
            (b, a)
        };
        assert_eq!(first.unwrap().statistics.keypoint_count, 1);
        assert_eq!(second.unwrap().statistics.keypoint_count, 2);
    }
}
