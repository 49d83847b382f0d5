use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{ChatRequest, ChatResponse, DialogflowRequest, DialogflowResponse, SessionInfo},
    resolve::{IntentSource, Utterance},
    router::RouteContext,
};
use crate::{
    auth::services::AuthUser,
    error::{ApiError, ApiJson, ApiResult},
    preferences,
    state::AppState,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/dialogflow", post(dialogflow_webhook))
}

async fn route_context(state: &AppState, user_id: Option<Uuid>) -> anyhow::Result<RouteContext> {
    let preferences = match user_id {
        Some(id) => preferences::repo::load(&state.db, id)
            .await?
            .unwrap_or_default(),
        None => Default::default(),
    };
    Ok(RouteContext {
        user_id,
        preferences,
    })
}

/// POST /chat: plain-text chat backed by the server-side session store.
#[instrument(skip(state, user, body))]
pub async fn chat(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiJson(body): ApiJson<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if body.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    let session_id = body
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let session = state.sessions.load(&session_id).await?;
    let resolved = Utterance(&body.message).resolve(&session);
    let intent = resolved.intent;
    info!(%session_id, intent = intent.as_str(), "chat message classified");

    let ctx = route_context(&state, user.map(|u| u.0)).await?;
    let reply = state.intents.route(resolved, session, &ctx).await;
    state.sessions.save(&session_id, &reply.session).await?;

    Ok(Json(ChatResponse {
        message: reply.message,
        session_id,
        intent: intent.as_str(),
        data: reply.data,
    }))
}

/// POST /dialogflow: CX webhook; session state travels in the payload.
#[instrument(skip(state, req))]
pub async fn dialogflow_webhook(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DialogflowRequest>,
) -> Json<DialogflowResponse> {
    let session_info = req.session_info.clone().unwrap_or_default();
    let resolved = req.resolve(&session_info.parameters);
    info!(
        intent = resolved.intent.as_str(),
        language = req.language_code.as_deref().unwrap_or("unknown"),
        "dialogflow webhook"
    );

    let reply = state
        .intents
        .route(resolved, session_info.parameters, &RouteContext::default())
        .await;

    Json(DialogflowResponse::new(
        reply.message,
        Some(SessionInfo {
            session: session_info.session,
            parameters: reply.session,
        }),
    ))
}
