//! Pure transition functions of the extraction session.

use serde::Serialize;
use thiserror::Error;

use crate::error::{FailureKind, GatewayError};
use crate::gateway::ExtractionResult;

/// What a front-end renders at any instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(ExtractionResult),
    Failed(SessionFailure),
}

impl SessionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            Self::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Displayable failure of a submission.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status of a rejection, when the service answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&GatewayError> for SessionFailure {
    fn from(err: &GatewayError) -> Self {
        let status = match err {
            GatewayError::ServiceRejected { status, .. } => *status,
            _ => None,
        };

        Self {
            kind: err.kind(),
            message: err.display_message(),
            status,
        }
    }
}

/// Proof that a submission was started; identifies it by sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Session state plus the sequence number of the latest submission.
///
/// Every `begin_submit` and every `reset` advances the sequence, so a
/// completion is applied only if nothing happened since its submission.
#[derive(Debug, Default)]
pub struct SessionMachine {
    state: SessionState,
    latest: u64,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Enter `Submitting`. Returns `None` if a submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<Ticket> {
        if self.state.is_submitting() {
            return None;
        }
        self.latest += 1;
        self.state = SessionState::Submitting;
        Some(Ticket { seq: self.latest })
    }

    /// Apply the outcome of the submission identified by `ticket`.
    ///
    /// Returns `false` (and leaves the state untouched) when the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<ExtractionResult, GatewayError>,
    ) -> bool {
        if ticket.seq != self.latest || !self.state.is_submitting() {
            return false;
        }

        self.state = match outcome {
            Ok(result) => SessionState::Succeeded(result),
            Err(err) => SessionState::Failed(SessionFailure::from(&err)),
        };
        true
    }

    /// Back to `Idle`; any in-flight submission becomes stale.
    pub fn reset(&mut self) {
        self.latest += 1;
        self.state = SessionState::Idle;
    }

    /// Drop a displayed result or failure. An in-flight submission is kept.
    pub fn clear_outcome(&mut self) {
        if matches!(
            self.state,
            SessionState::Succeeded(_) | SessionState::Failed(_)
        ) {
            self.state = SessionState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::error::FALLBACK_FAILURE_MESSAGE;
    use crate::method::DetectionMethod;
    use crate::statistics::FeatureStatistics;

    fn result(keypoints: u64) -> ExtractionResult {
        ExtractionResult {
            succeeded: true,
            method: DetectionMethod::Sift,
            image_url: Url::parse("http://localhost:5001/api/outputs/x.png").unwrap(),
            statistics: FeatureStatistics::with_keypoints(keypoints),
            message: "ok".into(),
        }
    }

    #[test]
    fn test_starts_idle() {
        assert_eq!(SessionMachine::new().state(), &SessionState::Idle);
    }

    #[test]
    fn test_submit_then_success() {
        let mut machine = SessionMachine::new();
        let ticket = machine.begin_submit().unwrap();
        assert!(machine.state().is_submitting());

        assert!(machine.complete(ticket, Ok(result(5))));
        assert_eq!(machine.state().result().unwrap().statistics.keypoint_count, 5);
    }

    #[test]
    fn test_submit_then_failure() {
        let mut machine = SessionMachine::new();
        let ticket = machine.begin_submit().unwrap();

        let err = GatewayError::ServiceUnavailable("refused".into());
        assert!(machine.complete(ticket, Err(err)));

        let failure = machine.state().failure().unwrap();
        assert_eq!(failure.kind, FailureKind::ServiceUnavailable);
        assert_eq!(failure.message, FALLBACK_FAILURE_MESSAGE);
    }

    #[test]
    fn test_reentrant_submit_is_refused() {
        let mut machine = SessionMachine::new();
        let first = machine.begin_submit().unwrap();
        assert!(machine.begin_submit().is_none());

        // The original submission is still the live one.
        assert!(machine.complete(first, Ok(result(1))));
    }

    #[test]
    fn test_resubmit_from_terminal_states() {
        let mut machine = SessionMachine::new();
        let t1 = machine.begin_submit().unwrap();
        machine.complete(t1, Err(GatewayError::Unknown("x".into())));

        let t2 = machine.begin_submit().unwrap();
        assert!(t2.seq() > t1.seq());
        machine.complete(t2, Ok(result(2)));

        assert!(machine.begin_submit().is_some());
    }

    #[test]
    fn test_reset_discards_in_flight_completion() {
        let mut machine = SessionMachine::new();
        let ticket = machine.begin_submit().unwrap();
        machine.reset();

        assert!(!machine.complete(ticket, Ok(result(9))));
        assert_eq!(machine.state(), &SessionState::Idle);
    }

    #[test]
    fn test_superseded_ticket_is_discarded() {
        let mut machine = SessionMachine::new();
        let old = machine.begin_submit().unwrap();
        machine.reset();
        let new = machine.begin_submit().unwrap();

        assert!(!machine.complete(old, Ok(result(1))));
        assert!(machine.state().is_submitting());
        assert!(machine.complete(new, Ok(result(2))));
        assert_eq!(machine.state().result().unwrap().statistics.keypoint_count, 2);
    }

    #[test]
    fn test_clear_outcome_keeps_submission() {
        let mut machine = SessionMachine::new();
        let ticket = machine.begin_submit().unwrap();
        machine.clear_outcome();
        assert!(machine.state().is_submitting());

        machine.complete(ticket, Ok(result(1)));
        machine.clear_outcome();
        assert_eq!(machine.state(), &SessionState::Idle);
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let state = SessionState::Failed(SessionFailure {
            kind: FailureKind::ServiceRejected,
            message: "decode failed".into(),
            status: Some(500),
        });
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["detail"]["kind"], "service_rejected");
        assert_eq!(json["detail"]["message"], "decode failed");
        assert_eq!(json["detail"]["status"], 500);
    }

    #[test]
    fn test_failure_keeps_rejection_status() {
        let mut machine = SessionMachine::new();
        let ticket = machine.begin_submit().unwrap();

        let err = GatewayError::rejected(Some(502), Some("upstream down".into()));
        assert!(machine.complete(ticket, Err(err)));

        let failure = machine.state().failure().unwrap();
        assert_eq!(failure.status, Some(502));
        assert_eq!(failure.message, "upstream down");

        let unreachable = SessionFailure::from(&GatewayError::ServiceUnavailable("x".into()));
        assert_eq!(unreachable.status, None);
    }
}
