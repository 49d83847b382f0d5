use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateShoppingListRequest, PurchasedRequest, ShoppingListResponse},
    repo,
    services::{list_name, set_item_purchased},
};
use crate::{
    auth::services::AuthUser,
    claude::{types::GeneratedShoppingList, TaskContext},
    error::{ApiError, ApiJson, ApiResult},
    meal_plans, preferences,
    state::AppState,
};

pub fn shopping_list_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shopping-lists",
            get(list_shopping_lists).post(create_shopping_list),
        )
        .route(
            "/shopping-lists/:id",
            get(get_shopping_list).delete(delete_shopping_list),
        )
        .route("/shopping-lists/:id/items/:index", patch(set_purchased))
}

#[instrument(skip(state, body))]
pub async fn create_shopping_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateShoppingListRequest>,
) -> ApiResult<(StatusCode, Json<ShoppingListResponse>)> {
    let plan = meal_plans::repo::find(&state.db, user_id, body.meal_plan_id)
        .await?
        .ok_or(ApiError::NotFound("Meal plan"))?;
    let household_size = preferences::repo::load(&state.db, user_id)
        .await?
        .and_then(|p| p.household_size);

    let outcome = state
        .dispatcher
        .invoke(TaskContext::ShoppingList {
            plan: plan.meals.0,
            household_size,
        })
        .await;
    let generated = outcome
        .decode::<GeneratedShoppingList>()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("shopping list generation failed")))?;

    let estimated_cost = generated.estimated_cost.clone();
    let items = generated.flatten();
    let row = repo::insert(
        &state.db,
        user_id,
        plan.id,
        &list_name(&plan.name),
        &items,
        estimated_cost.as_deref(),
    )
    .await?;
    info!(%user_id, list_id = %row.id, plan_id = %plan.id, items = items.len(), "shopping list created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state))]
pub async fn list_shopping_lists(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<ShoppingListResponse>>> {
    let rows = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(rows.into_iter().map(ShoppingListResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_shopping_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShoppingListResponse>> {
    let row = repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Shopping list"))?;
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
pub async fn delete_shopping_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Shopping list"));
    }
    info!(%user_id, list_id = %id, "shopping list deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Sets one item's `purchased` flag; every other field and item is left as stored.
#[instrument(skip(state, body))]
pub async fn set_purchased(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, index)): Path<(Uuid, usize)>,
    ApiJson(body): ApiJson<PurchasedRequest>,
) -> ApiResult<Json<ShoppingListResponse>> {
    let row = repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Shopping list"))?;
    let mut items = row.items.0;
    if !set_item_purchased(&mut items, index, body.purchased) {
        return Err(ApiError::NotFound("Shopping list item"));
    }

    let db_index = i32::try_from(index).map_err(anyhow::Error::from)?;
    let row = repo::set_purchased(&state.db, user_id, id, db_index, body.purchased)
        .await?
        .ok_or(ApiError::NotFound("Shopping list item"))?;
    info!(%user_id, list_id = %id, index, purchased = body.purchased, "item updated");
    Ok(Json(row.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRef,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{app::build_app, auth::services::JwtKeys, state::AppState};

    #[tokio::test]
    async fn patch_rejects_non_numeric_index() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state)
            .issue_pair(Uuid::new_v4())
            .unwrap()
            .access_token;
        let res = build_app(state)
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/shopping-lists/{}/items/first", Uuid::new_v4()))
                    .header("authorization", format!("Bearer {token}"))
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"purchased": true}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn shopping_lists_require_auth() {
        let res = build_app(AppState::fake())
            .oneshot(
                Request::builder()
                    .uri("/api/shopping-lists")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
