//! Async client for the developer-app OTP API.
//!
//! Four endpoints, one POST helper. Every failure (transport, undecodable
//! body, non-2xx status, `success: false`) comes back as an [`ApiError`]
//! carrying the message a user should see.

use std::time::Duration;

pub mod models;
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{InvalidateOtp, OtpResponse, RequestOtp, VerifyOtp};

pub const REQUEST_PATH: &str = "/otp/developer-app/request";
pub const VERIFY_PATH: &str = "/otp/developer-app/verify";
pub const RESEND_PATH: &str = "/otp/developer-app/resend";
pub const INVALIDATE_PATH: &str = "/otp/developer-app/invalidate";

/// Message shown for any failure below the application layer.
pub const NETWORK_ERROR: &str = "Network error";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// DNS, connect, timeout, or a body that is not JSON.
    #[error("Network error: {detail}")]
    Transport { detail: String },

    /// The server answered but refused: non-2xx, or a falsy `success` flag.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The HTTP client could not be built from the options.
    #[error("Failed to build HTTP client: {detail}")]
    Setup { detail: String },
}

impl ApiError {
    /// Text for the status line.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { .. } | Self::Setup { .. } => NETWORK_ERROR,
            Self::Rejected { message, .. } => message,
        }
    }

    fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            detail: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpApiOptions {
    /// Prefix every endpoint path is appended to, e.g. `https://host/api`.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OtpApiOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpApiService {
    options: OtpApiOptions,
    http: Client,
}

impl OtpApiService {
    /// Build the service. Fails only if the HTTP client cannot be built.
    pub fn new(options: OtpApiOptions) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Setup {
                detail: e.to_string(),
            })?;

        Ok(Self { options, http })
    }

    pub fn options(&self) -> &OtpApiOptions {
        &self.options
    }

    pub async fn request_otp(&self, body: &RequestOtp) -> Result<OtpResponse, ApiError> {
        self.post(REQUEST_PATH, body).await
    }

    pub async fn verify_otp(&self, body: &VerifyOtp) -> Result<OtpResponse, ApiError> {
        self.post(VERIFY_PATH, body).await
    }

    pub async fn resend_otp(&self, body: &RequestOtp) -> Result<OtpResponse, ApiError> {
        self.post(RESEND_PATH, body).await
    }

    pub async fn invalidate_otp(&self, body: &InvalidateOtp) -> Result<OtpResponse, ApiError> {
        self.post(INVALIDATE_PATH, body).await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.options.base_url.trim_end_matches('/'), endpoint)
    }

    /// POST `body` as JSON and decode the `{success, message?}` envelope.
    ///
    /// A refusal without a server message reads as [`NETWORK_ERROR`].
    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<OtpResponse, ApiError> {
        let url = self.url(endpoint);
        debug!(%url, "posting OTP request");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "OTP request failed");
                ApiError::transport(e)
            })?;

        let status = response.status();
        let value = response.json::<Value>().await.map_err(|e| {
            warn!(%url, %status, error = %e, "failed to decode OTP response");
            ApiError::transport(e)
        })?;

        let decoded = OtpResponse::from_value(value);
        if !status.is_success() || !decoded.success {
            let message = decoded
                .message
                .unwrap_or_else(|| NETWORK_ERROR.to_string());
            warn!(%url, %status, %message, "OTP API rejected request");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(%url, %status, "OTP request succeeded");
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn service(base_url: String) -> OtpApiService {
        OtpApiService::new(OtpApiOptions {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn request_body() -> RequestOtp {
        RequestOtp {
            phone_number: "+255700000000".into(),
            app_key: "app-key".into(),
            sender_id: "ACME".into(),
            otp_length: 6,
            minutes_to_expire: 5,
            delivery_method: "sms".into(),
            message_template: "Your code is {code}".into(),
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let svc = service("https://otp.example.com/api/".into());
        assert_eq!(
            svc.url(VERIFY_PATH),
            "https://otp.example.com/api/otp/developer-app/verify"
        );
    }

    #[test]
    fn transport_errors_read_as_network_error() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.message(), NETWORK_ERROR);
    }

    #[test]
    fn new_keeps_configured_options() -> Result<()> {
        let svc = OtpApiService::new(OtpApiOptions {
            base_url: "https://otp.example.com/api".into(),
            timeout: Duration::from_millis(1500),
        })?;
        assert_eq!(svc.options().timeout, Duration::from_millis(1500));
        assert_eq!(svc.options().base_url, "https://otp.example.com/api");
        Ok(())
    }

    #[test]
    fn setup_errors_read_as_network_error() {
        let err = ApiError::Setup {
            detail: "no TLS backend".into(),
        };
        assert_eq!(err.message(), NETWORK_ERROR);
        assert_eq!(err.to_string(), "Failed to build HTTP client: no TLS backend");
    }

    #[tokio::test]
    async fn request_posts_full_payload() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(REQUEST_PATH))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "phone_number": "+255700000000",
                "app_key": "app-key",
                "sender_id": "ACME",
                "otp_length": 6,
                "minutes_to_expire": 5,
                "delivery_method": "sms",
                "message_template": "Your code is {code}",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "request_id": "r-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = service(server.uri()).request_otp(&request_body()).await?;
        assert!(resp.success);
        assert_eq!(resp.payload["request_id"], "r-1");
        Ok(())
    }

    #[tokio::test]
    async fn verify_success_false_is_rejected_with_server_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .and(body_json(json!({
                "phone_number": "+255700000000",
                "app_key": "app-key",
                "code": "123456",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Invalid code"
            })))
            .mount(&server)
            .await;

        let body = VerifyOtp {
            phone_number: "+255700000000".into(),
            app_key: "app-key".into(),
            code: "123456".into(),
        };
        let err = service(server.uri())
            .verify_otp(&body)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 200,
                message: "Invalid code".into()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn error_status_without_message_reads_as_network_error() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(INVALIDATE_PATH))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let body = InvalidateOtp {
            phone_number: "+255700000000".into(),
            app_key: "app-key".into(),
        };
        let err = service(server.uri())
            .invalidate_otp(&body)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 422,
                message: NETWORK_ERROR.into()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn success_false_without_message_reads_as_network_error() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(REQUEST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let err = service(server.uri())
            .request_otp(&request_body())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(matches!(err, ApiError::Rejected { status: 200, .. }));
        assert_eq!(err.message(), NETWORK_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_json_is_network_error() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(RESEND_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = service(server.uri())
            .resend_otp(&request_body())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(matches!(err, ApiError::Transport { .. }));
        assert_eq!(err.message(), NETWORK_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() -> Result<()> {
        // Grab a free port, then release it so nothing is listening.
        let port = match TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener.local_addr()?.port(),
            Err(_) => {
                eprintln!("Skipping test: cannot bind localhost");
                return Ok(());
            }
        };

        let err = service(format!("http://127.0.0.1:{port}"))
            .request_otp(&request_body())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(err.message(), NETWORK_ERROR);
        Ok(())
    }
}
