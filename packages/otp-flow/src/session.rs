//! Mutable state of the single active OTP attempt.

use tracing::{info, warn};

use crate::error::FlowError;
use crate::machine::{FlowEvent, Phase, PhaseMachine};
use crate::view::StatusMessage;

#[derive(Debug, Clone, Default)]
pub struct Session {
    machine: PhaseMachine,
    phone_number: Option<String>,
    status: Option<StatusMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub(crate) fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    pub(crate) fn set_phone_number(&mut self, phone_number: String) {
        self.phone_number = Some(phone_number);
    }

    pub(crate) fn clear_phone_number(&mut self) {
        self.phone_number = None;
    }

    /// Feed `event` to the phase machine.
    pub(crate) fn apply(&mut self, event: FlowEvent) -> Result<Phase, FlowError> {
        let from = self.phase();
        match self.machine.decide(&event) {
            Some(to) => {
                info!(%from, %to, ?event, "phase transition");
                Ok(to)
            }
            None => {
                warn!(phase = %from, ?event, "illegal phase transition");
                Err(FlowError::IllegalTransition { phase: from })
            }
        }
    }

    /// Phone-number invariant: held in every code phase, empty in `Idle`.
    pub fn is_consistent(&self) -> bool {
        let phase = self.phase();
        let has_phone = self.phone_number.as_deref().is_some_and(|p| !p.is_empty());
        if phase.holds_phone_number() {
            has_phone
        } else if phase == Phase::Idle {
            !has_phone
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Operation;

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.phone_number(), None);
        assert!(session.status().is_none());
        assert!(session.is_consistent());
    }

    #[test]
    fn test_illegal_event_reports_current_phase() {
        let mut session = Session::new();
        let err = session
            .apply(FlowEvent::Started(Operation::Verify))
            .unwrap_err();
        assert_eq!(err, FlowError::IllegalTransition { phase: Phase::Idle });
    }

    #[test]
    fn test_invariant_tracks_phone_number() {
        let mut session = Session::new();
        session.apply(FlowEvent::Started(Operation::Request)).unwrap();
        session.apply(FlowEvent::Succeeded(Operation::Request)).unwrap();
        assert!(!session.is_consistent());

        session.set_phone_number("+255700000000".into());
        assert!(session.is_consistent());
    }
}
