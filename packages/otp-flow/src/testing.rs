//! Test doubles for the controller seams.
//!
//! Available to this crate's unit tests and, with the `testing` feature, to
//! downstream tests:
//!
//! ```toml
//! [dev-dependencies]
//! otp-flow = { path = "../otp-flow", features = ["testing"] }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use otp_api::models::{InvalidateOtp, RequestOtp, VerifyOtp};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::backend::OtpBackend;
use crate::error::FlowError;
use crate::view::{FlowView, Region, StatusMessage};

// =============================================================================
// Scripted backend
// =============================================================================

/// A call the backend received, with its full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Request(RequestOtp),
    Verify(VerifyOtp),
    Resend(RequestOtp),
    Invalidate(InvalidateOtp),
}

#[derive(Debug, Clone)]
enum Reply {
    Ready(Result<Value, FlowError>),
    /// Never resolves.
    Hang,
}

/// Answers calls from a queue of scripted replies, in order.
///
/// An empty queue answers `{"success": true}`.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
    entered: Arc<Notify>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(self, payload: Value) -> Self {
        self.push(Reply::Ready(Ok(payload)))
    }

    /// Reply the way the API does when it refuses: `success: false`.
    pub fn reject(self, message: &str) -> Self {
        self.push(Reply::Ready(Err(FlowError::Application(message.to_string()))))
    }

    pub fn fail_transport(self, detail: &str) -> Self {
        self.push(Reply::Ready(Err(FlowError::Transport(detail.to_string()))))
    }

    /// The next call never completes.
    pub fn hang(self) -> Self {
        self.push(Reply::Hang)
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Notified every time a call reaches the backend.
    pub fn entered(&self) -> Arc<Notify> {
        self.entered.clone()
    }

    async fn answer(&self, call: RecordedCall) -> Result<Value, FlowError> {
        self.calls.lock().unwrap().push(call);
        self.entered.notify_one();

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok(json!({ "success": true })),
        }
    }
}

#[async_trait]
impl OtpBackend for ScriptedBackend {
    async fn request(&self, body: &RequestOtp) -> Result<Value, FlowError> {
        self.answer(RecordedCall::Request(body.clone())).await
    }

    async fn verify(&self, body: &VerifyOtp) -> Result<Value, FlowError> {
        self.answer(RecordedCall::Verify(body.clone())).await
    }

    async fn resend(&self, body: &RequestOtp) -> Result<Value, FlowError> {
        self.answer(RecordedCall::Resend(body.clone())).await
    }

    async fn invalidate(&self, body: &InvalidateOtp) -> Result<Value, FlowError> {
        self.answer(RecordedCall::Invalidate(body.clone())).await
    }
}

// =============================================================================
// Recording view
// =============================================================================

#[derive(Debug, Default)]
struct ViewState {
    visible: HashMap<Region, bool>,
    controls_enabled: bool,
    clears: usize,
    statuses: Vec<StatusMessage>,
}

/// Remembers everything the controller did to it.
#[derive(Debug, Default)]
pub struct RecordingView {
    state: Mutex<ViewState>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.state
            .lock()
            .unwrap()
            .visible
            .get(&region)
            .copied()
            .unwrap_or(false)
    }

    /// Phone entry and request control shown, code regions hidden.
    pub fn shows_phone_entry(&self) -> bool {
        self.is_visible(Region::PhoneEntry)
            && self.is_visible(Region::RequestControl)
            && !self.is_visible(Region::CodeEntry)
            && !self.is_visible(Region::CodeControls)
    }

    /// Code entry and its controls shown, phone regions hidden.
    pub fn shows_code_entry(&self) -> bool {
        !self.is_visible(Region::PhoneEntry)
            && !self.is_visible(Region::RequestControl)
            && self.is_visible(Region::CodeEntry)
            && self.is_visible(Region::CodeControls)
    }

    pub fn controls_enabled(&self) -> bool {
        self.state.lock().unwrap().controls_enabled
    }

    pub fn clears(&self) -> usize {
        self.state.lock().unwrap().clears
    }

    pub fn statuses(&self) -> Vec<StatusMessage> {
        self.state.lock().unwrap().statuses.clone()
    }

    pub fn last_status(&self) -> Option<StatusMessage> {
        self.state.lock().unwrap().statuses.last().cloned()
    }
}

impl FlowView for RecordingView {
    fn set_visible(&self, region: Region, visible: bool) {
        self.state.lock().unwrap().visible.insert(region, visible);
    }

    fn set_controls_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().controls_enabled = enabled;
    }

    fn clear_inputs(&self) {
        self.state.lock().unwrap().clears += 1;
    }

    fn set_status(&self, status: &StatusMessage) {
        self.state.lock().unwrap().statuses.push(status.clone());
    }
}
