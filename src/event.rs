//! Hook event JSON as delivered on stdin by the agent tool.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("malformed event: missing required field `{0}`")]
    MissingField(&'static str),
}

/// Raw event record. Every field is optional on the wire; which ones are
/// required depends on the event kind and is checked by [`HookEvent::classify`].
#[derive(Debug, Default, Deserialize)]
pub struct HookEvent {
    pub hook_event_name: Option<String>,
    pub cwd: Option<String>,
    pub prompt: Option<String>,
    pub transcript_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    UserPromptSubmit { cwd: String, prompt: String },
    Stop { cwd: String, transcript_path: PathBuf },
    /// Any event this hook does not react to.
    Other(String),
}

impl HookEvent {
    pub fn from_json(input: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn classify(self) -> Result<Event, EventError> {
        let name = self
            .hook_event_name
            .ok_or(EventError::MissingField("hook_event_name"))?;

        match name.as_str() {
            "UserPromptSubmit" => Ok(Event::UserPromptSubmit {
                cwd: self.cwd.ok_or(EventError::MissingField("cwd"))?,
                prompt: self.prompt.ok_or(EventError::MissingField("prompt"))?,
            }),
            "Stop" => Ok(Event::Stop {
                cwd: self.cwd.ok_or(EventError::MissingField("cwd"))?,
                transcript_path: self
                    .transcript_path
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .ok_or(EventError::MissingField("transcript_path"))?,
            }),
            _ => Ok(Event::Other(name)),
        }
    }
}

impl Event {
    pub fn name(&self) -> &str {
        match self {
            Event::UserPromptSubmit { .. } => "UserPromptSubmit",
            Event::Stop { .. } => "Stop",
            Event::Other(name) => name,
        }
    }
}

/// Decode and classify one event record.
pub fn parse(input: &str) -> Result<Event, EventError> {
    HookEvent::from_json(input)?.classify()
}
