// Interactive OTP widget for the terminal

mod args;
mod terminal;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use otp_flow::{Callbacks, ConfigOverrides, FlowController, Region, WidgetConfig};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Cli;
use crate::terminal::TerminalView;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the prompts on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,otp_flow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let env = ConfigOverrides::from_env().context("Failed to load configuration")?;
    let flags = cli
        .config
        .into_overrides()
        .context("Invalid command-line configuration")?;
    let config = WidgetConfig::resolve(env.merge(flags));
    if config.app_key.is_empty() {
        warn!("OTP_APP_KEY is not set; the API will most likely reject every call");
    }

    let term = Term::stdout();
    print_banner(&term, &config)?;

    let verified = Arc::new(AtomicBool::new(false));
    let callbacks = build_callbacks(verified.clone(), cli.redirect_url);

    let view = Arc::new(TerminalView::new());
    let controller = FlowController::connect(config, callbacks, view.clone())
        .context("Failed to set up the OTP API client")?;

    run(&term, &controller, &view, &verified).await?;

    println!("{}", "👋 Goodbye!".bright_blue());
    Ok(())
}

fn print_banner(term: &Term, config: &WidgetConfig) -> Result<()> {
    term.clear_screen()?;
    println!("{}", "╔════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║         Phone Number OTP Widget        ║".bright_cyan());
    println!("{}", "╚════════════════════════════════════════╝".bright_cyan());
    println!(
        "{} {} ({})",
        "API:".dimmed(),
        config.api_base_url,
        config.environment
    );
    println!();
    Ok(())
}

/// Navigation on success happens here, never inside the controller.
fn build_callbacks(verified: Arc<AtomicBool>, redirect_url: Option<String>) -> Callbacks {
    Callbacks::new()
        .on_request_success(|payload| debug!(%payload, "OTP call succeeded"))
        .on_verify_success(move |payload| {
            info!(%payload, "phone number verified");
            verified.store(true, Ordering::SeqCst);

            if let Some(url) = &redirect_url {
                println!("{} {}", "🌐 Redirecting to".bright_blue(), url);
                if let Err(e) = open::that(url) {
                    warn!(%url, error = %e, "failed to open redirect URL");
                }
            }
        })
        .on_error(|err| debug!(error = %err, "OTP call failed"))
}

async fn run(
    term: &Term,
    controller: &FlowController,
    view: &TerminalView,
    verified: &AtomicBool,
) -> Result<()> {
    let theme = ColorfulTheme::default();

    while !verified.load(Ordering::SeqCst) {
        println!();

        if !view.controls_enabled() {
            warn!(phase = %controller.phase(), "controls still disabled after the last call");
            break;
        }

        if view.is_visible(Region::PhoneEntry) {
            let selection = Select::with_theme(&theme)
                .with_prompt("What would you like to do?")
                .items(&["📱 Request OTP", "🛑 Exit"])
                .default(0)
                .interact_on(term)?;
            if selection != 0 {
                break;
            }

            let phone_number: String = Input::with_theme(&theme)
                .with_prompt("Phone number")
                .with_initial_text(view.last_phone_number().unwrap_or_default())
                .allow_empty(true)
                .interact_text_on(term)?;
            view.remember_phone_number(&phone_number);

            // Failures are already on the status line
            let _ = controller.request_otp(&phone_number).await;
        } else if view.is_visible(Region::CodeControls) {
            let phone_number = controller.phone_number().unwrap_or_default();
            let selection = Select::with_theme(&theme)
                .with_prompt(format!("Code sent to {phone_number}"))
                .items(&[
                    "✅ Verify code",
                    "🔄 Resend code",
                    "✖️  Cancel",
                    "🛑 Exit",
                ])
                .default(0)
                .interact_on(term)?;

            let _ = match selection {
                0 => {
                    let code: String = Input::with_theme(&theme)
                        .with_prompt("OTP code")
                        .allow_empty(true)
                        .interact_text_on(term)?;
                    controller.verify_otp(&code).await
                }
                1 => controller.resend_otp().await,
                2 => controller.invalidate_otp().await,
                _ => break,
            };
        } else {
            // The controller always lays out one of the two stages
            warn!(phase = %controller.phase(), "no visible region to prompt for");
            break;
        }
    }

    Ok(())
}
