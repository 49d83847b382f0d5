use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::repo;
use crate::{
    auth::services::AuthUser,
    claude::{types::UserPreferences, TaskContext},
    error::{ApiError, ApiJson, ApiResult},
    state::AppState,
};

pub fn preference_routes() -> Router<AppState> {
    Router::new()
        .route("/preferences", get(get_preferences).put(put_preferences))
        .route("/preferences/extract", post(extract_preferences))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

/// Unset preferences come back as the empty default rather than 404.
#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<UserPreferences>> {
    let prefs = repo::load(&state.db, user_id).await?.unwrap_or_default();
    Ok(Json(prefs))
}

#[instrument(skip(state, prefs))]
pub async fn put_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(prefs): ApiJson<UserPreferences>,
) -> ApiResult<Json<UserPreferences>> {
    repo::save(&state.db, user_id, &prefs).await?;
    info!(%user_id, "preferences saved");
    Ok(Json(prefs))
}

/// Runs free text through the extraction task. Nothing is stored; the client PUTs what it accepts.
#[instrument(skip(state, body))]
pub async fn extract_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<ExtractRequest>,
) -> ApiResult<Json<UserPreferences>> {
    if body.text.trim().is_empty() {
        return Err(ApiError::bad_request("text is required"));
    }
    let outcome = state
        .dispatcher
        .invoke(TaskContext::ExtractPreferences { text: body.text })
        .await;
    let nested = outcome
        .data
        .as_ref()
        .is_some_and(|d| d.get("preferences").is_some());
    let prefs = if nested {
        outcome.decode_field::<UserPreferences>("preferences")
    } else {
        outcome.decode::<UserPreferences>()
    };
    match prefs {
        Some(prefs) => Ok(Json(prefs)),
        None => {
            warn!(%user_id, "preference extraction returned no data");
            Err(ApiError::Internal(anyhow::anyhow!(
                "preference extraction failed"
            )))
        }
    }
}
