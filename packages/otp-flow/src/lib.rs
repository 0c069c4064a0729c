//! # OTP flow
//!
//! Client-side driver for a phone-number OTP flow: request a code, verify
//! it, resend it, or cancel it, while keeping a small form in step.
//!
//! ## Pieces
//!
//! - [`WidgetConfig`]: immutable settings, resolved once from defaults and
//!   [`ConfigOverrides`].
//! - [`PhaseMachine`]: pure phase transitions, no IO.
//! - [`FlowView`]: the form the controller shows, hides and annotates.
//! - [`OtpBackend`]: the four API calls; [`HttpBackend`] in production.
//! - [`Callbacks`]: optional success and error hooks.
//! - [`FlowController`]: owns the session and ties the rest together.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ─request─► AwaitingCode ─verify─► Verified ─► Idle
//!                   │  ▲
//!                   │  └─ resend, or any failed call
//!                   └─ cancel ─► Idle
//! ```
//!
//! At most one call is in flight per session. Operations invoked from the
//! wrong phase (including while busy) are ignored with an error and never
//! reach the network.

pub mod backend;
pub mod callbacks;
pub mod config;
pub mod controller;
pub mod error;
pub mod machine;
pub mod session;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{HttpBackend, OtpBackend};
pub use callbacks::Callbacks;
pub use config::{ConfigOverrides, Environment, WidgetConfig};
pub use controller::{FlowController, CODE_REQUIRED, PHONE_REQUIRED};
pub use error::FlowError;
pub use machine::{FlowEvent, Operation, Phase, PhaseMachine};
pub use session::Session;
pub use view::{FlowView, Region, StatusKind, StatusMessage};
