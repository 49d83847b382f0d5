use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{DetailsRequest, DiscoverRequest, DiscoverResponse, ModifyRequest, SavedRecipe},
    repo,
    services::{generate_and_save, save_generated, usable_suggestions},
};
use crate::{
    auth::services::AuthUser,
    claude::{types::FullRecipe, TaskContext},
    error::{ApiError, ApiJson, ApiResult},
    preferences,
    state::AppState,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/discover", post(discover))
        .route("/recipes/details", post(details))
        .route("/recipes/:id", get(get_recipe).delete(delete_recipe))
        .route("/recipes/:id/modify", post(modify_recipe))
        .route(
            "/recipes/:id/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/favorites", get(list_favorites))
}

#[instrument(skip(state, body))]
pub async fn discover(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<DiscoverRequest>,
) -> ApiResult<Json<DiscoverResponse>> {
    let ingredients: Vec<String> = body
        .ingredients
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    if ingredients.is_empty() {
        return Err(ApiError::bad_request("At least one ingredient is required"));
    }
    let preferences = match body.preferences {
        Some(p) => p,
        None => preferences::repo::load(&state.db, user_id)
            .await?
            .unwrap_or_default(),
    };

    let outcome = state
        .dispatcher
        .invoke(TaskContext::FindRecipes {
            ingredients: ingredients.clone(),
            preferences,
        })
        .await;
    if outcome.data.is_none() {
        return Err(ApiError::Internal(anyhow::anyhow!("recipe discovery failed")));
    }
    let recipes = usable_suggestions(outcome.data.as_ref(), &ingredients);
    info!(%user_id, count = recipes.len(), "recipes discovered");
    Ok(Json(DiscoverResponse {
        message: outcome.message,
        recipes,
    }))
}

#[instrument(skip(state, body))]
pub async fn details(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<DetailsRequest>,
) -> ApiResult<(StatusCode, Json<SavedRecipe>)> {
    let name = body.recipe_name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("recipeName is required"));
    }
    let preferences = preferences::repo::load(&state.db, user_id)
        .await?
        .unwrap_or_default();
    let saved = generate_and_save(&state, user_id, name, body.ingredients, preferences).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<SavedRecipe>>> {
    let rows = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(rows.into_iter().map(SavedRecipe::from).collect()))
}

async fn load_recipe(state: &AppState, user_id: Uuid, id: Uuid) -> ApiResult<repo::RecipeRow> {
    repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SavedRecipe>> {
    Ok(Json(load_recipe(&state, user_id, id).await?.into()))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Recipe"));
    }
    info!(%user_id, recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Applies a free-text change. The original stays; the variant is a new recipe.
#[instrument(skip(state, body))]
pub async fn modify_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<ModifyRequest>,
) -> ApiResult<(StatusCode, Json<SavedRecipe>)> {
    if body.instruction.trim().is_empty() {
        return Err(ApiError::bad_request("instruction is required"));
    }
    let original = load_recipe(&state, user_id, id).await?.to_recipe();

    let outcome = state
        .dispatcher
        .invoke(TaskContext::ModifyRecipe {
            recipe: original,
            instruction: body.instruction,
        })
        .await;
    let Some(modified) = outcome.decode::<FullRecipe>() else {
        warn!(%user_id, recipe_id = %id, "modify returned no recipe");
        return Err(ApiError::Internal(anyhow::anyhow!("recipe modification failed")));
    };
    let saved = save_generated(&state, user_id, &modified.recipe_name, &modified).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_recipe(&state, user_id, id).await?;
    repo::add_favorite(&state.db, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::remove_favorite(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Favorite"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<SavedRecipe>>> {
    let rows = repo::list_favorites(&state.db, user_id).await?;
    Ok(Json(rows.into_iter().map(SavedRecipe::from).collect()))
}
