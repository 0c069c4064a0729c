//! Command-line flags. Each flag overrides the matching `OTP_*` variable.

use anyhow::Result;
use clap::{Args, Parser};
use otp_flow::{ConfigOverrides, Environment};

#[derive(Debug, Parser)]
#[command(
    name = "otp-widget",
    version,
    about = "Request, verify, resend or cancel a phone-number OTP from the terminal"
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Opened in the browser once the code is verified
    #[arg(long)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Base URL the /otp/developer-app/* paths are appended to
    #[arg(long)]
    pub api_base_url: Option<String>,

    #[arg(long)]
    pub app_key: Option<String>,

    #[arg(long)]
    pub sender_id: Option<String>,

    #[arg(long)]
    pub otp_length: Option<u32>,

    #[arg(long)]
    pub minutes_to_expire: Option<u32>,

    /// Delivery channel, e.g. sms
    #[arg(long)]
    pub delivery_method: Option<String>,

    #[arg(long)]
    pub message_template: Option<String>,

    /// sandbox or production
    #[arg(long)]
    pub environment: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ConfigArgs {
    pub fn into_overrides(self) -> Result<ConfigOverrides> {
        let environment = self
            .environment
            .map(|e| e.parse::<Environment>())
            .transpose()?;

        Ok(ConfigOverrides {
            api_base_url: self.api_base_url,
            app_key: self.app_key,
            sender_id: self.sender_id,
            otp_length: self.otp_length,
            minutes_to_expire: self.minutes_to_expire,
            delivery_method: self.delivery_method,
            message_template: self.message_template,
            environment,
            request_timeout_secs: self.timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "otp-widget",
            "--app-key",
            "k",
            "--otp-length",
            "4",
            "--environment",
            "production",
            "--redirect-url",
            "https://example.com/welcome",
        ])
        .unwrap();

        assert_eq!(cli.redirect_url.as_deref(), Some("https://example.com/welcome"));
        let overrides = cli.config.into_overrides().unwrap();
        assert_eq!(overrides.app_key.as_deref(), Some("k"));
        assert_eq!(overrides.otp_length, Some(4));
        assert_eq!(overrides.environment, Some(Environment::Production));
        assert_eq!(overrides.sender_id, None);
    }

    #[test]
    fn test_no_flags_override_nothing() {
        let cli = Cli::try_parse_from(["otp-widget"]).unwrap();
        assert_eq!(cli.config.into_overrides().unwrap(), ConfigOverrides::default());
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        let cli = Cli::try_parse_from(["otp-widget", "--environment", "staging"]).unwrap();
        assert!(cli.config.into_overrides().is_err());
    }
}
