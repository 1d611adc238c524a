//! ElevenLabs text-to-speech with local playback.
//!
//! Speech is a side channel: every failure comes back as a [`SpeechError`]
//! for the caller to log, and nothing here ever aborts the hook.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SpeechConfig;
use crate::transcript::truncate_chars;

const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Longest announcement sent for synthesis, in characters.
pub const MAX_SPEECH_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("invalid voice id: {0}")]
    InvalidVoice(String),

    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("speech provider returned {status}: {body}")]
    Provider {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("audio playback failed: {0}")]
    Playback(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// No credential configured, or speech turned off.
    Skipped,
    Played { chars: usize, audio_bytes: usize },
}

/// Plays encoded audio to completion.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, audio: Vec<u8>) -> Result<(), SpeechError>;
}

/// Default output device via rodio.
pub struct RodioPlayer;

impl AudioPlayer for RodioPlayer {
    fn play(&self, audio: Vec<u8>) -> Result<(), SpeechError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| SpeechError::Playback(format!("failed to open audio output: {e}")))?;
        // rodio otherwise prints a notice to stderr when the stream drops
        stream.log_on_drop(false);
        let source = Decoder::new(Cursor::new(audio))
            .map_err(|e| SpeechError::Playback(format!("failed to decode audio: {e}")))?;

        let sink = Sink::connect_new(stream.mixer());
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Voice ids go into the URL path, so only alphanumerics and hyphens pass.
fn validate_voice_id(voice_id: &str) -> Result<(), SpeechError> {
    if voice_id.is_empty()
        || voice_id.len() > 128
        || !voice_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(SpeechError::InvalidVoice(voice_id.to_string()));
    }
    Ok(())
}

pub struct SpeechNotifier {
    client: Client,
    api_key: Option<String>,
    voice_id: String,
    model_id: String,
    base_url: String,
    player: Arc<dyn AudioPlayer>,
}

impl SpeechNotifier {
    pub fn new(config: &SpeechConfig, player: Arc<dyn AudioPlayer>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        let api_key = if config.enabled {
            config.api_key.clone()
        } else {
            None
        };

        Self {
            client,
            api_key,
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            player,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Synthesize `text` (truncated to [`MAX_SPEECH_CHARS`]) and play it.
    pub async fn announce(&self, text: &str) -> Result<SpeechOutcome, SpeechError> {
        let Some(api_key) = &self.api_key else {
            debug!("No speech credential configured, skipping announcement");
            return Ok(SpeechOutcome::Skipped);
        };

        let text = truncate_chars(text, MAX_SPEECH_CHARS);
        let audio = self.synthesize(api_key, &text).await?;
        let audio_bytes = audio.len();

        let t_play = Instant::now();
        let player = self.player.clone();
        tokio::task::spawn_blocking(move || player.play(audio))
            .await
            .map_err(|e| SpeechError::Playback(e.to_string()))??;
        info!(
            "Spoke {} chars ({audio_bytes} bytes, {:.0}ms playback)",
            text.chars().count(),
            t_play.elapsed().as_secs_f64() * 1000.0
        );

        Ok(SpeechOutcome::Played {
            chars: text.chars().count(),
            audio_bytes,
        })
    }

    async fn synthesize(&self, api_key: &str, text: &str) -> Result<Vec<u8>, SpeechError> {
        validate_voice_id(&self.voice_id)?;
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);

        debug!(
            voice = %self.voice_id,
            model = %self.model_id,
            text_len = text.len(),
            "sending TTS request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", api_key)
            .json(&SynthesisRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(SpeechError::Provider { status, body });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
