//! Backend seam between the controller and the OTP API.
//!
//! The controller only sees [`OtpBackend`]. Production wires in
//! [`HttpBackend`]; tests inject a scripted implementation.

use std::sync::Arc;

use async_trait::async_trait;
use otp_api::models::{InvalidateOtp, RequestOtp, VerifyOtp};
use otp_api::OtpApiService;
use serde_json::Value;

use crate::error::FlowError;

/// The four OTP calls. Each resolves to the full response payload.
#[async_trait]
pub trait OtpBackend: Send + Sync {
    async fn request(&self, body: &RequestOtp) -> Result<Value, FlowError>;

    async fn verify(&self, body: &VerifyOtp) -> Result<Value, FlowError>;

    async fn resend(&self, body: &RequestOtp) -> Result<Value, FlowError>;

    async fn invalidate(&self, body: &InvalidateOtp) -> Result<Value, FlowError>;
}

/// Wrapper around [`OtpApiService`] that implements [`OtpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend(pub Arc<OtpApiService>);

impl HttpBackend {
    pub fn new(service: Arc<OtpApiService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl OtpBackend for HttpBackend {
    async fn request(&self, body: &RequestOtp) -> Result<Value, FlowError> {
        self.0
            .request_otp(body)
            .await
            .map(|resp| resp.payload)
            .map_err(FlowError::from)
    }

    async fn verify(&self, body: &VerifyOtp) -> Result<Value, FlowError> {
        self.0
            .verify_otp(body)
            .await
            .map(|resp| resp.payload)
            .map_err(FlowError::from)
    }

    async fn resend(&self, body: &RequestOtp) -> Result<Value, FlowError> {
        self.0
            .resend_otp(body)
            .await
            .map(|resp| resp.payload)
            .map_err(FlowError::from)
    }

    async fn invalidate(&self, body: &InvalidateOtp) -> Result<Value, FlowError> {
        self.0
            .invalidate_otp(body)
            .await
            .map(|resp| resp.payload)
            .map_err(FlowError::from)
    }
}
