use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::ShoppingListRow;
use crate::claude::types::ShoppingItem;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShoppingListRequest {
    #[serde(alias = "meal_plan_id")]
    pub meal_plan_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PurchasedRequest {
    pub purchased: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListResponse {
    pub id: Uuid,
    pub meal_plan_id: Option<Uuid>,
    pub name: String,
    pub items: Vec<ShoppingItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    pub is_stale: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ShoppingListRow> for ShoppingListResponse {
    fn from(row: ShoppingListRow) -> Self {
        Self {
            id: row.id,
            meal_plan_id: row.meal_plan_id,
            name: row.name,
            items: row.items.0,
            estimated_cost: row.estimated_cost,
            is_stale: row.is_stale,
            created_at: row.created_at,
        }
    }
}
