use anyhow::Context;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::claude::types::ShoppingItem;

#[derive(Debug, Clone, FromRow)]
pub struct ShoppingListRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_plan_id: Option<Uuid>,
    pub name: String,
    pub items: Json<Vec<ShoppingItem>>,
    pub estimated_cost: Option<String>,
    pub is_stale: bool,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    meal_plan_id: Uuid,
    name: &str,
    items: &[ShoppingItem],
    estimated_cost: Option<&str>,
) -> anyhow::Result<ShoppingListRow> {
    sqlx::query_as::<_, ShoppingListRow>(
        r#"
        INSERT INTO shopping_lists (user_id, meal_plan_id, name, items, estimated_cost, is_stale)
        VALUES ($1, $2, $3, $4, $5, false)
        RETURNING id, user_id, meal_plan_id, name, items, estimated_cost, is_stale, created_at
        "#,
    )
    .bind(user_id)
    .bind(meal_plan_id)
    .bind(name)
    .bind(Json(items))
    .bind(estimated_cost)
    .fetch_one(db)
    .await
    .context("insert shopping list")
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ShoppingListRow>> {
    sqlx::query_as::<_, ShoppingListRow>(
        r#"
        SELECT id, user_id, meal_plan_id, name, items, estimated_cost, is_stale, created_at
        FROM shopping_lists
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list shopping lists")
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<ShoppingListRow>> {
    sqlx::query_as::<_, ShoppingListRow>(
        r#"
        SELECT id, user_id, meal_plan_id, name, items, estimated_cost, is_stale, created_at
        FROM shopping_lists
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find shopping list")
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM shopping_lists WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete shopping list")?;
    Ok(res.rows_affected() > 0)
}

/// Writes only `items[index].purchased`. Returns None when the list or the index does not exist.
pub async fn set_purchased(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    index: i32,
    purchased: bool,
) -> anyhow::Result<Option<ShoppingListRow>> {
    sqlx::query_as::<_, ShoppingListRow>(
        r#"
        UPDATE shopping_lists
        SET items = jsonb_set(items, ARRAY[$3::text, 'purchased'], to_jsonb($4::boolean))
        WHERE id = $1 AND user_id = $2 AND $3 >= 0 AND $3 < jsonb_array_length(items)
        RETURNING id, user_id, meal_plan_id, name, items, estimated_cost, is_stale, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(index)
    .bind(purchased)
    .fetch_optional(db)
    .await
    .context("set shopping item purchased")
}
