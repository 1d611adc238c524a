//! hook-notify: Discord + ElevenLabs notifications for agent hook events.
//!
//! Reads one hook event from stdin. `UserPromptSubmit` and `Stop` post an
//! embed to the configured Discord webhook and speak a short announcement;
//! every other event is ignored.

mod config;
mod discord;
mod event;
mod hook;
mod speech;
mod transcript;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::speech::{RodioPlayer, SpeechOutcome};

#[derive(Parser, Debug)]
#[command(name = "hook-notify", about = "Agent hook notifications via Discord and ElevenLabs")]
struct Args {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the spoken announcement
    #[arg(long)]
    no_speech: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // stdout belongs to the hook host, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::Config::load(args.config.as_deref());
    if args.no_speech {
        config.speech.enabled = false;
    }
    debug!("Config: {config:?}");

    let Some(webhook_url) = config.webhook_url().map(String::from) else {
        info!(
            "{} not set, notifications disabled",
            config::WEBHOOK_URL_ENV
        );
        return ExitCode::SUCCESS;
    };

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        error!("Failed to read event from stdin: {e}");
        return ExitCode::FAILURE;
    }

    let event = match event::parse(&input) {
        Ok(e) => e,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    debug!("Received {} event", event.name());

    let home = dirs::home_dir();
    let Some(notification) = hook::plan(&event, home.as_deref(), &config) else {
        return ExitCode::SUCCESS;
    };

    let chat = discord::ChatNotifier::new(&webhook_url, &config.discord);
    let speech = speech::SpeechNotifier::new(&config.speech, Arc::new(RodioPlayer));
    if !speech.is_enabled() {
        debug!("{} not set, speech disabled", config::API_KEY_ENV);
    }

    let delivery = hook::deliver(&notification, &chat, &speech).await;
    if let Ok(SpeechOutcome::Played { chars, audio_bytes }) = delivery.speech {
        debug!(
            "Announced {} event ({chars} chars, {audio_bytes} bytes of audio)",
            event.name()
        );
    }
    if delivery.chat.is_err() {
        debug!("Chat delivery is best-effort, exiting cleanly");
    }

    ExitCode::SUCCESS
}
