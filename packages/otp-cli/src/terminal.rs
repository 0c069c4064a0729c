//! Terminal rendition of the OTP form.
//!
//! Regions map to prompts: the phone prompt is offered while the phone
//! entry is visible, the verify/resend/cancel menu while the code controls
//! are visible. Status lines are printed as they arrive.

use std::collections::HashMap;
use std::sync::Mutex;

use colored::Colorize;
use otp_flow::{FlowView, Region, StatusKind, StatusMessage};
use tracing::trace;

#[derive(Debug, Default)]
struct TerminalState {
    visible: HashMap<Region, bool>,
    controls_enabled: bool,
    last_phone_number: Option<String>,
}

#[derive(Debug, Default)]
pub struct TerminalView {
    state: Mutex<TerminalState>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.with_state(|s| s.visible.get(&region).copied().unwrap_or(false))
    }

    pub fn controls_enabled(&self) -> bool {
        self.with_state(|s| s.controls_enabled)
    }

    /// Pre-fills the phone prompt after a failed request.
    pub fn last_phone_number(&self) -> Option<String> {
        self.with_state(|s| s.last_phone_number.clone())
    }

    pub fn remember_phone_number(&self, phone_number: &str) {
        self.with_state(|s| s.last_phone_number = Some(phone_number.to_string()));
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TerminalState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }
}

pub fn format_status(status: &StatusMessage) -> String {
    match status.kind {
        StatusKind::Loading => format!("⏳ {}", status.text).bright_yellow().to_string(),
        StatusKind::Success => format!("✅ {}", status.text).bright_green().to_string(),
        StatusKind::Error => format!("❌ {}", status.text).bright_red().bold().to_string(),
    }
}

impl FlowView for TerminalView {
    fn set_visible(&self, region: Region, visible: bool) {
        trace!(?region, visible, "region visibility");
        self.with_state(|s| {
            s.visible.insert(region, visible);
        });
    }

    fn set_controls_enabled(&self, enabled: bool) {
        self.with_state(|s| s.controls_enabled = enabled);
    }

    fn clear_inputs(&self) {
        self.with_state(|s| s.last_phone_number = None);
    }

    fn set_status(&self, status: &StatusMessage) {
        println!("{}", format_status(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_defaults_to_hidden() {
        let view = TerminalView::new();
        assert!(!view.is_visible(Region::PhoneEntry));

        view.set_visible(Region::PhoneEntry, true);
        assert!(view.is_visible(Region::PhoneEntry));
        assert!(!view.is_visible(Region::CodeControls));
    }

    #[test]
    fn test_clear_inputs_forgets_phone_number() {
        let view = TerminalView::new();
        view.remember_phone_number("+255700000000");
        assert_eq!(view.last_phone_number().as_deref(), Some("+255700000000"));

        view.clear_inputs();
        assert_eq!(view.last_phone_number(), None);
    }

    #[test]
    fn test_status_text_is_kept() {
        colored::control::set_override(false);
        assert_eq!(
            format_status(&StatusMessage::error("Invalid code")),
            "❌ Invalid code"
        );
    }
}
