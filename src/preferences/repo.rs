use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::claude::types::UserPreferences;

pub async fn load(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserPreferences>> {
    let row: Option<(Json<UserPreferences>,)> =
        sqlx::query_as(r#"SELECT data FROM user_preferences WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_optional(db)
            .await
            .context("load preferences")?;
    Ok(row.map(|(Json(prefs),)| prefs))
}

pub async fn save(db: &PgPool, user_id: Uuid, prefs: &UserPreferences) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, data, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (user_id) DO UPDATE
            SET data = EXCLUDED.data, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(Json(prefs))
    .execute(db)
    .await
    .context("save preferences")?;
    Ok(())
}
