//! Event dispatch: decide what to send for an event, then send it.

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::discord::{abbreviate_home, ChatError, ChatNotifier, Embed};
use crate::event::Event;
use crate::speech::{SpeechError, SpeechNotifier, SpeechOutcome};
use crate::transcript;

/// Characters of the prompt read aloud on `UserPromptSubmit`.
const PROMPT_PREVIEW_CHARS: usize = 100;

/// Everything sent for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub announcement: String,
}

/// What happened on each channel.
#[derive(Debug)]
pub struct Delivery {
    pub chat: Result<(), ChatError>,
    pub speech: Result<SpeechOutcome, SpeechError>,
}

/// Build the notification for `event`, or `None` if the hook ignores it.
///
/// Transcript problems are logged and leave the description empty.
pub fn plan(event: &Event, home: Option<&Path>, config: &Config) -> Option<Notification> {
    match event {
        Event::UserPromptSubmit { cwd, prompt } => {
            let title = abbreviate_home(cwd, home);
            let preview = transcript::truncate_chars(prompt, PROMPT_PREVIEW_CHARS);
            Some(Notification {
                announcement: format!("New prompt in {title}: {preview}"),
                title,
                description: Some(prompt.clone()),
                color: config.discord.color,
            })
        }
        Event::Stop {
            cwd,
            transcript_path,
        } => {
            let title = abbreviate_home(cwd, home);
            let description =
                match transcript::last_message(transcript_path, config.transcript.max_chars) {
                    Ok(Some(message)) => Some(message),
                    Ok(None) => {
                        warn!(
                            "No textual message found in transcript {}",
                            transcript_path.display()
                        );
                        None
                    }
                    Err(e) => {
                        warn!("{e}");
                        None
                    }
                };
            Some(Notification {
                announcement: format!("Task completed in {title}"),
                title,
                description,
                color: config.discord.stop_color,
            })
        }
        Event::Other(name) => {
            info!("Ignoring {name} event");
            None
        }
    }
}

/// Send the chat message, then the spoken announcement. Neither result is
/// propagated; the caller only logs them.
pub async fn deliver(
    notification: &Notification,
    chat: &ChatNotifier,
    speech: &SpeechNotifier,
) -> Delivery {
    let embed = Embed::new(
        &notification.title,
        notification.description.as_deref(),
        notification.color,
    );

    let chat_result = chat.send(&embed).await;
    match &chat_result {
        Ok(()) => info!("Posted embed for {}", notification.title),
        Err(e) => warn!("Discord notification failed: {e}"),
    }

    let speech_result = speech.announce(&notification.announcement).await;
    if let Err(e) = &speech_result {
        warn!("ElevenLabs TTS failed: {e}");
    }

    Delivery {
        chat: chat_result,
        speech: speech_result,
    }
}
