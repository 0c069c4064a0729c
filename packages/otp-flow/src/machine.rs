//! Phase machine for the OTP lifecycle.
//!
//! The machine is pure: it receives flow events and decides the next phase.
//! No IO, no async. The controller feeds it one event per step and performs
//! the network calls and view updates itself.
//!
//! ```text
//! Idle ──request──► Requesting ──ok──► AwaitingCode ──verify──► Verifying ──ok──► Verified ──reset──► Idle
//!   ▲                   │                 │  ▲  ▲                  │
//!   └──────failed───────┘                 │  │  └──────failed──────┘
//!                                         │  └── Resending (ok | failed)
//!                                         └──► Cancelling ──ok──► Idle, failed ──► AwaitingCode
//! ```

use std::fmt;

use serde::Serialize;

/// Step of the OTP lifecycle for the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Requesting,
    AwaitingCode,
    Verifying,
    Resending,
    Cancelling,
    /// Transient: collapses to `Idle` as soon as the session is cleared.
    Verified,
}

impl Phase {
    /// A network call is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Requesting | Self::Verifying | Self::Resending | Self::Cancelling
        )
    }

    /// Phases in which a phone number must be held by the session.
    pub fn holds_phone_number(self) -> bool {
        matches!(
            self,
            Self::AwaitingCode | Self::Verifying | Self::Resending | Self::Cancelling
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::AwaitingCode => "awaiting_code",
            Self::Verifying => "verifying",
            Self::Resending => "resending",
            Self::Cancelling => "cancelling",
            Self::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// The four user-triggered operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Request,
    Verify,
    Resend,
    Invalidate,
}

impl Operation {
    /// The only phase this operation may start from.
    pub fn origin(self) -> Phase {
        match self {
            Self::Request => Phase::Idle,
            Self::Verify | Self::Resend | Self::Invalidate => Phase::AwaitingCode,
        }
    }

    /// The phase held while this operation's call is in flight.
    pub fn busy_phase(self) -> Phase {
        match self {
            Self::Request => Phase::Requesting,
            Self::Verify => Phase::Verifying,
            Self::Resend => Phase::Resending,
            Self::Invalidate => Phase::Cancelling,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Request => "request",
            Self::Verify => "verify",
            Self::Resend => "resend",
            Self::Invalidate => "invalidate",
        };
        f.write_str(name)
    }
}

/// Facts about the current operation, fed to [`PhaseMachine::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    /// The call for this operation is about to be issued.
    Started(Operation),
    Succeeded(Operation),
    Failed(Operation),
    /// The in-flight call was dropped before it settled.
    Aborted(Operation),
    /// Collapse the transient `Verified` phase.
    Reset,
}

/// Holds the current phase and decides transitions.
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    phase: Phase,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Apply `event` and return the new phase.
    ///
    /// Returns `None` and leaves the phase untouched when the event is not
    /// legal in the current phase.
    pub fn decide(&mut self, event: &FlowEvent) -> Option<Phase> {
        let next = match (*event, self.phase) {
            (FlowEvent::Started(op), phase) if phase == op.origin() => op.busy_phase(),

            (FlowEvent::Succeeded(Operation::Request), Phase::Requesting) => Phase::AwaitingCode,
            (FlowEvent::Succeeded(Operation::Verify), Phase::Verifying) => Phase::Verified,
            (FlowEvent::Succeeded(Operation::Resend), Phase::Resending) => Phase::AwaitingCode,
            (FlowEvent::Succeeded(Operation::Invalidate), Phase::Cancelling) => Phase::Idle,

            (FlowEvent::Failed(op) | FlowEvent::Aborted(op), phase)
                if phase == op.busy_phase() =>
            {
                op.origin()
            }

            (FlowEvent::Reset, Phase::Verified) => Phase::Idle,

            _ => return None,
        };

        self.phase = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATIONS: [Operation; 4] = [
        Operation::Request,
        Operation::Verify,
        Operation::Resend,
        Operation::Invalidate,
    ];

    const PHASES: [Phase; 7] = [
        Phase::Idle,
        Phase::Requesting,
        Phase::AwaitingCode,
        Phase::Verifying,
        Phase::Resending,
        Phase::Cancelling,
        Phase::Verified,
    ];

    fn machine_at(phase: Phase) -> PhaseMachine {
        PhaseMachine { phase }
    }

    #[test]
    fn test_request_round_trip() {
        let mut machine = PhaseMachine::new();
        assert_eq!(
            machine.decide(&FlowEvent::Started(Operation::Request)),
            Some(Phase::Requesting)
        );
        assert_eq!(
            machine.decide(&FlowEvent::Succeeded(Operation::Request)),
            Some(Phase::AwaitingCode)
        );
    }

    #[test]
    fn test_request_failure_returns_to_idle() {
        let mut machine = machine_at(Phase::Requesting);
        assert_eq!(
            machine.decide(&FlowEvent::Failed(Operation::Request)),
            Some(Phase::Idle)
        );
    }

    #[test]
    fn test_verify_success_collapses_through_verified() {
        let mut machine = machine_at(Phase::AwaitingCode);
        machine.decide(&FlowEvent::Started(Operation::Verify));
        assert_eq!(
            machine.decide(&FlowEvent::Succeeded(Operation::Verify)),
            Some(Phase::Verified)
        );
        assert_eq!(machine.decide(&FlowEvent::Reset), Some(Phase::Idle));
    }

    #[test]
    fn test_code_phase_failures_return_to_awaiting_code() {
        for op in [Operation::Verify, Operation::Resend, Operation::Invalidate] {
            let mut machine = machine_at(op.busy_phase());
            assert_eq!(
                machine.decide(&FlowEvent::Failed(op)),
                Some(Phase::AwaitingCode),
                "{op} failure"
            );
        }
    }

    #[test]
    fn test_resend_is_a_self_loop() {
        let mut machine = machine_at(Phase::AwaitingCode);
        for _ in 0..2 {
            machine.decide(&FlowEvent::Started(Operation::Resend));
            assert_eq!(
                machine.decide(&FlowEvent::Succeeded(Operation::Resend)),
                Some(Phase::AwaitingCode)
            );
        }
    }

    #[test]
    fn test_cancel_success_returns_to_idle() {
        let mut machine = machine_at(Phase::Cancelling);
        assert_eq!(
            machine.decide(&FlowEvent::Succeeded(Operation::Invalidate)),
            Some(Phase::Idle)
        );
    }

    #[test]
    fn test_start_only_from_origin() {
        for op in OPERATIONS {
            for phase in PHASES {
                let mut machine = machine_at(phase);
                let decided = machine.decide(&FlowEvent::Started(op));
                if phase == op.origin() {
                    assert_eq!(decided, Some(op.busy_phase()));
                } else {
                    assert_eq!(decided, None, "{op} must not start from {phase}");
                    assert_eq!(machine.phase(), phase);
                }
            }
        }
    }

    #[test]
    fn test_busy_phases_cannot_start_anything() {
        for phase in PHASES.into_iter().filter(|p| p.is_busy()) {
            for op in OPERATIONS {
                assert_eq!(machine_at(phase).decide(&FlowEvent::Started(op)), None);
            }
        }
    }

    #[test]
    fn test_abort_restores_origin() {
        for op in OPERATIONS {
            let mut machine = machine_at(op.busy_phase());
            assert_eq!(machine.decide(&FlowEvent::Aborted(op)), Some(op.origin()));
        }
    }

    #[test]
    fn test_mismatched_completion_is_ignored() {
        let mut machine = machine_at(Phase::Verifying);
        assert_eq!(machine.decide(&FlowEvent::Succeeded(Operation::Resend)), None);
        assert_eq!(machine.decide(&FlowEvent::Reset), None);
        assert_eq!(machine.phase(), Phase::Verifying);
    }
}
