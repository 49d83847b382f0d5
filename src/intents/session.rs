use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{types::Json, PgPool};
use tokio::sync::RwLock;

/// Conversation state carried between turns.
pub type SessionParams = Map<String, Value>;

pub const LAST_RECIPES: &str = "lastRecipes";
pub const CURRENT_RECIPE: &str = "currentRecipe";
pub const CURRENT_MEAL_PLAN: &str = "currentMealPlan";
pub const COOKING_MODE: &str = "cookingMode";
pub const CURRENT_STEP: &str = "currentStep";

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> anyhow::Result<SessionParams>;
    async fn save(&self, session_id: &str, params: &SessionParams) -> anyhow::Result<()>;
}

/// Process-local store. State is lost on restart and not shared between instances.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, SessionParams>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> anyhow::Result<SessionParams> {
        Ok(self
            .inner
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, session_id: &str, params: &SessionParams) -> anyhow::Result<()> {
        self.inner
            .write()
            .await
            .insert(session_id.to_string(), params.clone());
        Ok(())
    }
}

/// Stores sessions in `chat_sessions` so any instance can continue a conversation.
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, session_id: &str) -> anyhow::Result<SessionParams> {
        let row = sqlx::query_as::<_, (Json<SessionParams>,)>(
            r#"SELECT parameters FROM chat_sessions WHERE id = $1"#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await
        .context("load chat session")?;
        Ok(row.map(|(Json(p),)| p).unwrap_or_default())
    }

    async fn save(&self, session_id: &str, params: &SessionParams) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_sessions (id, parameters, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id) DO UPDATE
               SET parameters = EXCLUDED.parameters,
                   updated_at = now()
            "#,
        )
        .bind(session_id)
        .bind(Json(params))
        .execute(&self.db)
        .await
        .context("save chat session")?;
        Ok(())
    }
}
