//! Extraction session controller.
//!
//! Drives one request at a time through the gateway and keeps the
//! [`SessionState`] a front-end renders. The state lives behind a mutex that
//! is never held across the gateway call, so `reset` and `current_state`
//! stay responsive while a submission is in flight.

mod machine;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

pub use machine::{SessionFailure, SessionMachine, SessionState, Ticket};

use crate::error::GatewayError;
use crate::gateway::{ExtractionGateway, ImageUpload};
use crate::method::DetectionMethod;

/// What a call to `submit` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The response was applied; the state is now `Succeeded` or `Failed`.
    Applied,
    /// The response arrived after a reset or a newer submission and was dropped.
    Discarded,
    /// A submission was already in flight; nothing was sent.
    AlreadySubmitting,
    /// No image is selected; nothing was sent.
    NoImage,
}

pub struct SessionController {
    gateway: Arc<dyn ExtractionGateway>,
    machine: Mutex<SessionMachine>,
    timeout: Duration,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn ExtractionGateway>, timeout: Duration) -> Self {
        Self {
            gateway,
            machine: Mutex::new(SessionMachine::new()),
            timeout,
        }
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> SessionState {
        self.machine().state().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.machine().state().is_submitting()
    }

    /// Send `upload` to the gateway and record the outcome.
    ///
    /// A call made while another submission is in flight returns
    /// [`SubmitOutcome::AlreadySubmitting`] without touching the state. The
    /// gateway call is bounded by the session timeout; exceeding it is a
    /// failure like any other. Nothing is retried.
    #[instrument(level = "info", skip(self, upload), fields(file = %upload.file_name, method = %method))]
    pub async fn submit(&self, upload: ImageUpload, method: DetectionMethod) -> SubmitOutcome {
        let Some(ticket) = self.machine().begin_submit() else {
            debug!("Submission already in flight, ignoring");
            return SubmitOutcome::AlreadySubmitting;
        };

        info!(seq = ticket.seq(), bytes = upload.data.len(), "Submitting image");

        let outcome = match tokio::time::timeout(self.timeout, self.gateway.extract(upload, method))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    seq = ticket.seq(),
                    timeout_secs = self.timeout.as_secs(),
                    "Extraction timed out"
                );
                Err(GatewayError::Timeout(self.timeout))
            }
        };

        if let Err(err) = &outcome {
            warn!(seq = ticket.seq(), error = %err, "Submission failed");
        }

        if self.machine().complete(ticket, outcome) {
            debug!(seq = ticket.seq(), "Applied submission outcome");
            SubmitOutcome::Applied
        } else {
            info!(seq = ticket.seq(), "Discarding stale response");
            SubmitOutcome::Discarded
        }
    }

    /// Return to `Idle`. An in-flight request keeps running but its response
    /// will be discarded.
    pub fn reset(&self) {
        debug!("Resetting session");
        self.machine().reset();
    }

    /// Drop a displayed result or failure, keeping any in-flight submission.
    pub fn clear_outcome(&self) {
        self.machine().clear_outcome();
    }

    fn machine(&self) -> MutexGuard<'_, SessionMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Notify;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::FailureKind;
    use crate::gateway::MockGateway;

    fn upload() -> ImageUpload {
        ImageUpload {
            file_name: "scene.png".into(),
            media_type: Some("image/png".into()),
            data: vec![7; 32],
        }
    }

    fn controller(gateway: MockGateway) -> (Arc<MockGateway>, SessionController) {
        let gateway = Arc::new(gateway);
        let controller = SessionController::new(gateway.clone(), Duration::from_secs(30));
        (gateway, controller)
    }

    #[tokio::test]
    async fn test_submit_success() {
        let (gateway, controller) = controller(
            MockGateway::new(ClientConfig::default())
                .reply_json(200, MockGateway::success_body(DetectionMethod::Brisk, 12)),
        );

        let outcome = controller.submit(upload(), DetectionMethod::Brisk).await;

        assert_eq!(outcome, SubmitOutcome::Applied);
        let state = controller.current_state();
        assert_eq!(state.result().unwrap().statistics.keypoint_count, 12);
        assert_eq!(gateway.calls()[0].method, DetectionMethod::Brisk);
    }

    #[tokio::test]
    async fn test_submit_failure_then_retry() {
        let (gateway, controller) = controller(
            MockGateway::new(ClientConfig::default())
                .reply_error(GatewayError::ServiceUnavailable("refused".into()))
                .reply_json(200, MockGateway::success_body(DetectionMethod::Sift, 3)),
        );

        controller.submit(upload(), DetectionMethod::Sift).await;
        assert_eq!(
            controller.current_state().failure().unwrap().kind,
            FailureKind::ServiceUnavailable
        );
        assert_eq!(gateway.call_count(), 1);

        controller.submit(upload(), DetectionMethod::Sift).await;
        assert!(controller.current_state().result().is_some());
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reentrant_submit_is_noop() {
        let gate = Arc::new(Notify::new());
        let (gateway, controller) = controller(
            MockGateway::new(ClientConfig::default())
                .with_gate(gate.clone())
                .reply_json(200, MockGateway::success_body(DetectionMethod::Orb, 4)),
        );

        let first = controller.submit(upload(), DetectionMethod::Orb);
        let second = async {
            tokio::task::yield_now().await;
            assert!(controller.is_submitting());
            let outcome = controller.submit(upload(), DetectionMethod::Orb).await;
            assert!(controller.is_submitting());
            gate.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, SubmitOutcome::Applied);
        assert_eq!(second, SubmitOutcome::AlreadySubmitting);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        // Gate is never opened, so the gateway call never completes.
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(MockGateway::new(ClientConfig::default()).with_gate(gate));
        let controller = SessionController::new(gateway, Duration::from_secs(30));

        let outcome = controller.submit(upload(), DetectionMethod::Sift).await;

        assert_eq!(outcome, SubmitOutcome::Applied);
        let failure = controller.current_state().failure().cloned().unwrap();
        assert_eq!(failure.kind, FailureKind::Timeout);
    }
}
