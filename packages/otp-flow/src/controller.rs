//! The flow controller: one session, four operations, one call in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use otp_api::{OtpApiService, NETWORK_ERROR};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{HttpBackend, OtpBackend};
use crate::callbacks::Callbacks;
use crate::config::WidgetConfig;
use crate::error::FlowError;
use crate::machine::{FlowEvent, Operation, Phase};
use crate::session::Session;
use crate::view::{self, FlowView, StatusMessage};

pub const PHONE_REQUIRED: &str = "Phone number is required";
pub const CODE_REQUIRED: &str = "OTP code is required";

struct Inner {
    config: WidgetConfig,
    callbacks: Callbacks,
    view: Arc<dyn FlowView>,
    backend: Arc<dyn OtpBackend>,
    session: Mutex<Session>,
}

/// Drives one OTP attempt against the API and keeps the view in step.
///
/// Cheap to clone; clones share the session. Every operation first checks
/// the phase under the session lock, so a second call while one is in flight
/// is rejected with [`FlowError::Busy`] instead of hitting the network.
///
/// ```ignore
/// let controller = FlowController::connect(config, callbacks, view)?;
/// controller.request_otp("+255700000000").await?;
/// controller.verify_otp("123456").await?;
/// ```
#[derive(Clone)]
pub struct FlowController {
    inner: Arc<Inner>,
}

impl FlowController {
    /// Build a controller and render the idle layout on `view`.
    pub fn new(
        config: WidgetConfig,
        callbacks: Callbacks,
        view: Arc<dyn FlowView>,
        backend: Arc<dyn OtpBackend>,
    ) -> Self {
        view::show_phone_entry(view.as_ref());
        view.set_controls_enabled(true);

        info!(
            environment = %config.environment,
            api_base_url = %config.api_base_url,
            "OTP widget initialised"
        );

        Self {
            inner: Arc::new(Inner {
                config,
                callbacks,
                view,
                backend,
                session: Mutex::new(Session::new()),
            }),
        }
    }

    /// Build a controller backed by the HTTP API named in `config`.
    pub fn connect(
        config: WidgetConfig,
        callbacks: Callbacks,
        view: Arc<dyn FlowView>,
    ) -> Result<Self, FlowError> {
        let service = Arc::new(OtpApiService::new(config.api_options())?);
        let backend = Arc::new(HttpBackend::new(service));
        Ok(Self::new(config, callbacks, view, backend))
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    pub fn phone_number(&self) -> Option<String> {
        self.lock().phone_number().map(str::to_string)
    }

    pub fn status(&self) -> Option<StatusMessage> {
        self.lock().status().cloned()
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.lock().clone()
    }

    /// Send an OTP to `phone_number`. Valid only in `Idle`.
    pub async fn request_otp(&self, phone_number: &str) -> Result<Value, FlowError> {
        let input = phone_number.trim();
        let (flight, phone_number) = self.begin(Operation::Request, |_| {
            if input.is_empty() {
                Err(FlowError::Validation(PHONE_REQUIRED.to_string()))
            } else {
                Ok(input.to_string())
            }
        })?;

        self.show_status(StatusMessage::loading("Sending OTP..."));
        let body = self.inner.config.request_body(&phone_number);

        match self.inner.backend.request(&body).await {
            Ok(payload) => {
                flight.settle(true, |session| session.set_phone_number(phone_number))?;
                view::show_code_entry(self.inner.view.as_ref());
                self.show_status(StatusMessage::success("OTP sent successfully"));
                self.inner.callbacks.request_succeeded(&payload);
                Ok(payload)
            }
            Err(err) => {
                flight.settle(false, |_| {})?;
                Err(self.fail(err))
            }
        }
    }

    /// Check `code` against the stored phone number. Valid only in
    /// `AwaitingCode`; a failure leaves the session there for a retry.
    pub async fn verify_otp(&self, code: &str) -> Result<Value, FlowError> {
        let code = code.trim();
        let (flight, phone_number) = self.begin(Operation::Verify, |session| {
            if code.is_empty() {
                return Err(FlowError::Validation(CODE_REQUIRED.to_string()));
            }
            stored_phone_number(session)
        })?;

        self.show_status(StatusMessage::loading("Verifying OTP..."));
        let body = self.inner.config.verify_body(&phone_number, code);

        match self.inner.backend.verify(&body).await {
            Ok(payload) => {
                flight.settle(true, Session::clear_phone_number)?;
                view::show_phone_entry(self.inner.view.as_ref());
                self.inner.view.clear_inputs();
                self.show_status(StatusMessage::success("OTP verified successfully"));
                self.lock().apply(FlowEvent::Reset)?;
                self.inner.callbacks.verify_succeeded(&payload);
                Ok(payload)
            }
            Err(err) => {
                flight.settle(false, |_| {})?;
                Err(self.fail(err))
            }
        }
    }

    /// Send a fresh OTP to the stored phone number. The phase stays
    /// `AwaitingCode` whatever the outcome.
    pub async fn resend_otp(&self) -> Result<Value, FlowError> {
        let (flight, phone_number) = self.begin(Operation::Resend, stored_phone_number)?;

        self.show_status(StatusMessage::loading("Resending OTP..."));
        let body = self.inner.config.request_body(&phone_number);

        match self.inner.backend.resend(&body).await {
            Ok(payload) => {
                flight.settle(true, |_| {})?;
                self.show_status(StatusMessage::success("OTP resent successfully"));
                self.inner.callbacks.request_succeeded(&payload);
                Ok(payload)
            }
            Err(err) => {
                flight.settle(false, |_| {})?;
                Err(self.fail(err))
            }
        }
    }

    /// Cancel the outstanding OTP and return to phone entry.
    pub async fn invalidate_otp(&self) -> Result<Value, FlowError> {
        let (flight, phone_number) = self.begin(Operation::Invalidate, stored_phone_number)?;

        self.show_status(StatusMessage::loading("Cancelling OTP..."));
        let body = self.inner.config.invalidate_body(&phone_number);

        match self.inner.backend.invalidate(&body).await {
            Ok(payload) => {
                flight.settle(true, Session::clear_phone_number)?;
                view::show_phone_entry(self.inner.view.as_ref());
                self.inner.view.clear_inputs();
                self.show_status(StatusMessage::success("OTP cancelled successfully"));
                self.inner.callbacks.request_succeeded(&payload);
                Ok(payload)
            }
            Err(err) => {
                flight.settle(false, |_| {})?;
                Err(self.fail(err))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Phase guard and input validation, then enter the busy phase.
    ///
    /// `validate` runs under the session lock and yields the phone number the
    /// call is made for. Guard rejections leave the view alone; validation
    /// failures are reported like any other failure.
    fn begin(
        &self,
        operation: Operation,
        validate: impl FnOnce(&Session) -> Result<String, FlowError>,
    ) -> Result<(InFlight<'_>, String), FlowError> {
        let validated = {
            let mut session = self.lock();
            let phase = session.phase();
            if phase != operation.origin() {
                debug!(%operation, %phase, "ignoring operation in current phase");
                return Err(if phase.is_busy() {
                    FlowError::Busy { phase }
                } else {
                    FlowError::InvalidPhase { operation, phase }
                });
            }

            match validate(&*session) {
                Ok(phone_number) => {
                    session.apply(FlowEvent::Started(operation))?;
                    Ok(phone_number)
                }
                Err(err) => Err(err),
            }
        };

        match validated {
            Ok(phone_number) => {
                self.inner.view.set_controls_enabled(false);
                Ok((
                    InFlight {
                        controller: self,
                        operation,
                        settled: false,
                    },
                    phone_number,
                ))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn show_status(&self, status: StatusMessage) {
        self.lock().set_status(status.clone());
        self.inner.view.set_status(&status);
    }

    /// Report a user-facing failure on the status line and to `on_error`.
    fn fail(&self, err: FlowError) -> FlowError {
        warn!(error = %err, "OTP operation failed");
        self.show_status(StatusMessage::error(err.message()));
        self.inner.callbacks.failed(&err);
        err
    }
}

fn stored_phone_number(session: &Session) -> Result<String, FlowError> {
    session
        .phone_number()
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(|| FlowError::Validation(PHONE_REQUIRED.to_string()))
}

/// The busy phase of one operation. Dropping it unsettled (the operation's
/// future was cancelled mid-call) puts the session back where it started
/// and replaces the loading status with a network error.
struct InFlight<'a> {
    controller: &'a FlowController,
    operation: Operation,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(
        mut self,
        succeeded: bool,
        update: impl FnOnce(&mut Session),
    ) -> Result<Phase, FlowError> {
        self.settled = true;
        let event = if succeeded {
            FlowEvent::Succeeded(self.operation)
        } else {
            FlowEvent::Failed(self.operation)
        };

        let phase = {
            let mut session = self.controller.lock();
            let phase = session.apply(event)?;
            update(&mut session);
            phase
        };
        self.controller.inner.view.set_controls_enabled(true);
        Ok(phase)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        warn!(operation = %self.operation, "OTP call dropped before completion");
        let restored = self
            .controller
            .lock()
            .apply(FlowEvent::Aborted(self.operation));
        if let Ok(phase) = restored {
            debug!(%phase, "session restored after dropped call");
        }

        self.controller.show_status(StatusMessage::error(NETWORK_ERROR));
        self.controller.inner.view.set_controls_enabled(true);
    }
}
