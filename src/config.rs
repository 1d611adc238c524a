//! Configuration for hook-notify.
//!
//! Defaults can be overridden from a YAML file given on the command line or
//! in the user's config directory. The webhook URL and speech credential
//! come only from the environment; the voice may come from either, with the
//! environment winning.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const WEBHOOK_URL_ENV: &str = "CLAUDE_CODE_DISCORD_WEBHOOK_URL";
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";
pub const VOICE_ID_ENV: &str = "ELEVENLABS_VOICE_ID";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Only ever read from the environment.
    #[serde(skip)]
    pub webhook_url: Option<String>,
    pub color: u32,
    pub stop_color: u32,
    pub timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            color: 0x0099FF,
            stop_color: 0xD2691E,
            timeout_secs: 10,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            // Rachel
            voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
            model_id: "eleven_monolingual_v1".into(),
            base_url: "https://api.elevenlabs.io".into(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    pub max_chars: usize,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self { max_chars: 2000 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub speech: SpeechConfig,
    pub transcript: TranscriptConfig,
}

impl Config {
    /// Load configuration from YAML, then apply the process environment.
    ///
    /// Without an explicit path only ~/.config/hook-notify/config.yaml is
    /// consulted. The working directory is the agent's project and is never
    /// searched.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::from_file(path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn from_file(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config/hook-notify/config.yaml"))
                .filter(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                warn!(
                    "Failed to parse {}: {e}, using defaults",
                    config_path.display()
                );
                Self::default()
            }),
            Err(e) => {
                warn!(
                    "Failed to read {}: {e}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        // An empty file deserializes to unit, not a mapping.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(contents)
    }

    /// Override file values with environment variables. Empty values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        self.discord.webhook_url = get(WEBHOOK_URL_ENV);
        self.speech.api_key = get(API_KEY_ENV);
        if let Some(voice) = get(VOICE_ID_ENV) {
            self.speech.voice_id = voice;
        }
    }

    /// The webhook URL, if notifications are enabled at all.
    pub fn webhook_url(&self) -> Option<&str> {
        self.discord
            .webhook_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
    }
}
