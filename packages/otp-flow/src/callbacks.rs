//! Caller-supplied success and error hooks.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::FlowError;

type PayloadHandler = Arc<dyn Fn(&Value) + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(&FlowError) + Send + Sync>;

/// Optional handlers, invoked synchronously after the view is updated.
///
/// ```ignore
/// let callbacks = Callbacks::new()
///     .on_verify_success(|payload| println!("verified: {payload}"))
///     .on_error(|err| eprintln!("{}", err.message()));
/// ```
#[derive(Clone, Default)]
pub struct Callbacks {
    on_request_success: Option<PayloadHandler>,
    on_verify_success: Option<PayloadHandler>,
    on_error: Option<ErrorHandler>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired after a successful request, resend or cancel.
    pub fn on_request_success(mut self, handler: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_request_success = Some(Arc::new(handler));
        self
    }

    /// Fired after a successful verification. Navigation belongs here.
    pub fn on_verify_success(mut self, handler: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_verify_success = Some(Arc::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl Fn(&FlowError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub(crate) fn request_succeeded(&self, payload: &Value) {
        if let Some(handler) = &self.on_request_success {
            handler(payload);
        }
    }

    pub(crate) fn verify_succeeded(&self, payload: &Value) {
        if let Some(handler) = &self.on_verify_success {
            handler(payload);
        }
    }

    pub(crate) fn failed(&self, err: &FlowError) {
        if let Some(handler) = &self.on_error {
            handler(err);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_request_success", &self.on_request_success.is_some())
            .field("on_verify_success", &self.on_verify_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
