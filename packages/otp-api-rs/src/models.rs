//! Request bodies and the decoded response envelope for the developer-app
//! OTP endpoints.

use serde::Serialize;
use serde_json::Value;

/// Body of `/request` and `/resend`. Both endpoints take the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOtp {
    pub phone_number: String,
    pub app_key: String,
    pub sender_id: String,
    pub otp_length: u32,
    pub minutes_to_expire: u32,
    pub delivery_method: String,
    pub message_template: String,
}

/// Body of `/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyOtp {
    pub phone_number: String,
    pub app_key: String,
    pub code: String,
}

/// Body of `/invalidate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidateOtp {
    pub phone_number: String,
    pub app_key: String,
}

/// A decoded `{success, message?, ...}` response.
///
/// The server is free to add fields next to `success` and `message`, so the
/// whole body is kept in `payload` and handed to callers untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct OtpResponse {
    pub success: bool,
    pub message: Option<String>,
    pub payload: Value,
}

impl OtpResponse {
    pub fn from_value(payload: Value) -> Self {
        let success = payload.get("success").is_some_and(is_truthy);
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string);

        Self {
            success,
            message,
            payload,
        }
    }
}

/// Loose truthiness: `null`, `false`, `0` and `""` are failures, anything
/// else is success.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
