use crate::error::ApiJson;
use crate::state::AppState;
use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub mod parser;

use parser::{parse_command, parse_timer, VoiceCommand};

pub fn router() -> Router<AppState> {
    Router::new().route("/voice/parse", post(parse_transcript))
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTranscript {
    pub command: Option<VoiceCommand>,
    pub timer_seconds: Option<u32>,
}

/// Stateless; the cooking screen keeps its own step position.
#[instrument(skip(body))]
pub async fn parse_transcript(
    ApiJson(body): ApiJson<TranscriptRequest>,
) -> Json<ParsedTranscript> {
    let parsed = ParsedTranscript {
        command: parse_command(&body.transcript),
        timer_seconds: parse_timer(&body.transcript),
    };
    debug!(command = ?parsed.command, timer = ?parsed.timer_seconds, "transcript parsed");
    Json(parsed)
}
