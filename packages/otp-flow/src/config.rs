//! Widget configuration.
//!
//! Every field has a default. Callers supply a [`ConfigOverrides`] where each
//! `Some` replaces exactly one default; [`WidgetConfig::resolve`] does the
//! field-by-field merge once and the result is never mutated afterwards.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use otp_api::models::{InvalidateOtp, RequestOtp, VerifyOtp};
use otp_api::OtpApiOptions;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        })
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => bail!("unknown environment '{other}' (expected sandbox or production)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub api_base_url: String,
    pub app_key: String,
    pub sender_id: String,
    pub otp_length: u32,
    pub minutes_to_expire: u32,
    pub delivery_method: String,
    pub message_template: String,
    pub environment: Environment,
    pub request_timeout: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            app_key: String::new(),
            sender_id: String::new(),
            otp_length: 6,
            minutes_to_expire: 5,
            delivery_method: "sms".to_string(),
            message_template: "Your verification code is {code}".to_string(),
            environment: Environment::Sandbox,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl WidgetConfig {
    /// Defaults with every `Some` in `overrides` applied.
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: overrides.api_base_url.unwrap_or(defaults.api_base_url),
            app_key: overrides.app_key.unwrap_or(defaults.app_key),
            sender_id: overrides.sender_id.unwrap_or(defaults.sender_id),
            otp_length: overrides.otp_length.unwrap_or(defaults.otp_length),
            minutes_to_expire: overrides
                .minutes_to_expire
                .unwrap_or(defaults.minutes_to_expire),
            delivery_method: overrides
                .delivery_method
                .unwrap_or(defaults.delivery_method),
            message_template: overrides
                .message_template
                .unwrap_or(defaults.message_template),
            environment: overrides.environment.unwrap_or(defaults.environment),
            request_timeout: overrides
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn api_options(&self) -> OtpApiOptions {
        OtpApiOptions {
            base_url: self.api_base_url.clone(),
            timeout: self.request_timeout,
        }
    }

    /// Body for `/request` and `/resend`.
    pub fn request_body(&self, phone_number: &str) -> RequestOtp {
        RequestOtp {
            phone_number: phone_number.to_string(),
            app_key: self.app_key.clone(),
            sender_id: self.sender_id.clone(),
            otp_length: self.otp_length,
            minutes_to_expire: self.minutes_to_expire,
            delivery_method: self.delivery_method.clone(),
            message_template: self.message_template.clone(),
        }
    }

    pub fn verify_body(&self, phone_number: &str, code: &str) -> VerifyOtp {
        VerifyOtp {
            phone_number: phone_number.to_string(),
            app_key: self.app_key.clone(),
            code: code.to_string(),
        }
    }

    pub fn invalidate_body(&self, phone_number: &str) -> InvalidateOtp {
        InvalidateOtp {
            phone_number: phone_number.to_string(),
            app_key: self.app_key.clone(),
        }
    }
}

/// Caller-supplied values. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub app_key: Option<String>,
    pub sender_id: Option<String>,
    pub otp_length: Option<u32>,
    pub minutes_to_expire: Option<u32>,
    pub delivery_method: Option<String>,
    pub message_template: Option<String>,
    pub environment: Option<Environment>,
    pub request_timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Read `OTP_*` variables, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read overrides through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_base_url: get("OTP_API_BASE_URL"),
            app_key: get("OTP_APP_KEY"),
            sender_id: get("OTP_SENDER_ID"),
            otp_length: get("OTP_LENGTH")
                .map(|v| v.trim().parse())
                .transpose()
                .context("OTP_LENGTH must be a valid number")?,
            minutes_to_expire: get("OTP_MINUTES_TO_EXPIRE")
                .map(|v| v.trim().parse())
                .transpose()
                .context("OTP_MINUTES_TO_EXPIRE must be a valid number")?,
            delivery_method: get("OTP_DELIVERY_METHOD"),
            message_template: get("OTP_MESSAGE_TEMPLATE"),
            environment: get("OTP_ENVIRONMENT")
                .map(|v| v.parse())
                .transpose()
                .context("OTP_ENVIRONMENT is invalid")?,
            request_timeout_secs: get("OTP_REQUEST_TIMEOUT_SECS")
                .map(|v| v.trim().parse())
                .transpose()
                .context("OTP_REQUEST_TIMEOUT_SECS must be a valid number")?,
        })
    }

    /// Field-by-field merge where `other` wins.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_base_url: other.api_base_url.or(self.api_base_url),
            app_key: other.app_key.or(self.app_key),
            sender_id: other.sender_id.or(self.sender_id),
            otp_length: other.otp_length.or(self.otp_length),
            minutes_to_expire: other.minutes_to_expire.or(self.minutes_to_expire),
            delivery_method: other.delivery_method.or(self.delivery_method),
            message_template: other.message_template.or(self.message_template),
            environment: other.environment.or(self.environment),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
        }
    }
}
