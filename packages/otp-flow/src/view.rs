//! The surface the controller drives: four regions and a status line.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Phone number input.
    PhoneEntry,
    /// The "request OTP" trigger.
    RequestControl,
    /// OTP code input.
    CodeEntry,
    /// Verify, resend and cancel triggers.
    CodeControls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Loading,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// A form the controller can show, hide, clear and annotate.
///
/// Implementations hold their own element handles; the controller never
/// looks anything up. Calls arrive on whatever task runs the operation, so
/// implementations use interior mutability.
pub trait FlowView: Send + Sync {
    fn set_visible(&self, region: Region, visible: bool);

    /// Enable or disable every trigger. Disabled while a call is in flight.
    fn set_controls_enabled(&self, enabled: bool);

    /// Empty the phone and code inputs.
    fn clear_inputs(&self);

    fn set_status(&self, status: &StatusMessage);
}

/// Layout for `Idle`: phone entry visible, code entry hidden.
pub(crate) fn show_phone_entry(view: &dyn FlowView) {
    view.set_visible(Region::PhoneEntry, true);
    view.set_visible(Region::RequestControl, true);
    view.set_visible(Region::CodeEntry, false);
    view.set_visible(Region::CodeControls, false);
}

/// Layout for `AwaitingCode`.
pub(crate) fn show_code_entry(view: &dyn FlowView) {
    view.set_visible(Region::PhoneEntry, false);
    view.set_visible(Region::RequestControl, false);
    view.set_visible(Region::CodeEntry, true);
    view.set_visible(Region::CodeControls, true);
}
