use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Hands-free navigation commands for cooking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceCommand {
    Next,
    Previous,
    Ingredients,
    Exit,
}

/// Scanned in order; the first command with a matching phrase wins.
const PHRASES: &[(VoiceCommand, &[&str])] = &[
    (VoiceCommand::Next, &["next", "continue", "go on", "move on"]),
    (
        VoiceCommand::Previous,
        &["previous", "go back", "back", "last step", "before"],
    ),
    (
        VoiceCommand::Ingredients,
        &["ingredients", "what do i need"],
    ),
    (
        VoiceCommand::Exit,
        &["exit", "stop cooking", "quit", "done cooking", "close"],
    ),
];

pub fn parse_command(transcript: &str) -> Option<VoiceCommand> {
    let text = transcript.to_lowercase();
    PHRASES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| text.contains(p)))
        .map(|(cmd, _)| *cmd)
}

lazy_static! {
    static ref TIMER_RE: Regex = Regex::new(
        r"(?i)\b(\d+(?:\.\d+)?)(?:\s*(hours?|hrs?|minutes?|mins?|seconds?|secs?))?\b"
    )
    .unwrap();
}

/// Converts "5 minutes" or "1.5 hours" style text to whole seconds.
/// Without a unit the number is minutes.
pub fn parse_timer(text: &str) -> Option<u32> {
    let caps = TIMER_RE.captures(text)?;
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();
    let factor = if unit.starts_with('h') {
        3600.0
    } else if unit.starts_with('s') {
        1.0
    } else {
        60.0
    };
    let seconds = (amount * factor).round();
    (seconds.is_finite() && seconds <= f64::from(u32::MAX)).then_some(seconds as u32)
}
