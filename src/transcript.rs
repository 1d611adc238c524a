//! JSONL transcript scanning for the `Stop` event.
//!
//! The transcript is owned by the agent tool; we only read it and pick out
//! the most recent textual message.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
#[error("failed to open transcript {path}: {source}")]
pub struct TranscriptError {
    path: String,
    #[source]
    source: std::io::Error,
}

/// Text of `message.content[0].text` in one transcript record, if present
/// and non-empty.
fn message_text(line: &[u8]) -> Option<String> {
    let entry: serde_json::Value = serde_json::from_slice(line).ok()?;
    let text = entry
        .get("message")?
        .get("content")?
        .get(0)?
        .get("text")?
        .as_str()?;
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Scan the whole transcript and return the last textual message,
/// truncated to `max_chars` characters.
///
/// Lines that are not JSON or lack the text path are skipped.
pub fn last_message(path: &Path, max_chars: usize) -> Result<Option<String>, TranscriptError> {
    let file = File::open(path).map_err(|source| TranscriptError {
        path: path.display().to_string(),
        source,
    })?;

    let mut last = None;
    let mut skipped = 0usize;
    for line in BufReader::new(file).split(b'\n') {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Stopped reading transcript {}: {e}", path.display());
                break;
            }
        };
        match message_text(&line) {
            Some(text) => last = Some(text),
            None => skipped += 1,
        }
    }
    debug!("Transcript scan skipped {skipped} lines");

    Ok(last.map(|text| truncate_chars(&text, max_chars)))
}

/// Keep at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
