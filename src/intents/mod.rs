pub mod dto;
pub mod handlers;
pub mod resolve;
pub mod router;
pub mod session;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::chat_routes()
}
