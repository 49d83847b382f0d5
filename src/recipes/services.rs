use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{dto::SavedRecipe, repo};
use crate::{
    claude::{
        types::{FullRecipe, RecipeSuggestion, UserPreferences},
        TaskContext,
    },
    error::{ApiError, ApiResult},
    images::image_or_none,
    intents::router::RecipeSaver,
    state::AppState,
};

/// Decodes `data.recipes` one entry at a time, skipping malformed entries and
/// any suggestion that uses none of the `available` ingredients.
pub fn usable_suggestions(data: Option<&Value>, available: &[String]) -> Vec<RecipeSuggestion> {
    let Some(items) = data.and_then(|d| d.get("recipes")).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<RecipeSuggestion>(item.clone()) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "skipping malformed recipe suggestion");
                None
            }
        })
        .filter(|s| {
            let keep = s.overlaps(available);
            if !keep {
                warn!(recipe = %s.name, "suggestion does not use any given ingredient");
            }
            keep
        })
        .collect()
}

/// Generates the full recipe for `name`, attaches an image and stores it for the user.
pub async fn generate_and_save(
    state: &AppState,
    user_id: Uuid,
    name: &str,
    available: Vec<String>,
    preferences: UserPreferences,
) -> ApiResult<SavedRecipe> {
    let outcome = state
        .dispatcher
        .invoke(TaskContext::RecipeDetails {
            recipe_name: name.to_string(),
            available,
            preferences,
        })
        .await;
    let recipe = outcome
        .decode::<FullRecipe>()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("recipe generation failed")))?;
    save_generated(state, user_id, name, &recipe).await
}

pub async fn save_generated(
    state: &AppState,
    user_id: Uuid,
    name: &str,
    recipe: &FullRecipe,
) -> ApiResult<SavedRecipe> {
    let image_url = image_or_none(state.images.as_ref(), &recipe.recipe_name).await;
    let id = repo::insert(&state.db, user_id, name, recipe, image_url.as_deref()).await?;
    info!(%user_id, recipe_id = %id, "recipe saved");

    let row = repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;
    Ok(row.into())
}

/// Favorites a recipe that so far only lived in a chat session.
pub struct PgRecipeSaver {
    db: PgPool,
}

impl PgRecipeSaver {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeSaver for PgRecipeSaver {
    async fn save_favorite(&self, user_id: Uuid, recipe: &FullRecipe) -> anyhow::Result<Uuid> {
        let mut tx = self.db.begin().await.context("begin save favorite")?;
        let id = repo::insert(&mut *tx, user_id, &recipe.recipe_name, recipe, None).await?;
        repo::add_favorite(&mut *tx, user_id, id).await?;
        tx.commit().await.context("commit save favorite")?;
        info!(%user_id, recipe_id = %id, "favorite saved from chat");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn suggestion(name: &str, uses: &[&str]) -> Value {
        json!({
            "name": name,
            "description": "",
            "cookTime": "20 minutes",
            "difficulty": "Easy",
            "usesIngredients": uses,
            "additionalIngredients": [],
            "cuisineType": "Any"
        })
    }

    #[test]
    fn keeps_only_overlapping_suggestions() {
        let data = json!({"recipes": [
            suggestion("Chicken Fried Rice", &["chicken breast", "rice"]),
            suggestion("Beef Stew", &["beef", "carrots"]),
        ]});
        let have = vec!["Chicken".to_string(), "rice".to_string()];
        let out = usable_suggestions(Some(&data), &have);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Chicken Fried Rice");
    }

    #[test]
    fn skips_malformed_entries_individually() {
        let data = json!({"recipes": [
            {"name": "No difficulty", "usesIngredients": ["eggs"]},
            suggestion("Omelette", &["eggs"]),
        ]});
        let out = usable_suggestions(Some(&data), &["eggs".to_string()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Omelette");
    }

    #[test]
    fn missing_data_yields_nothing() {
        assert!(usable_suggestions(None, &["eggs".to_string()]).is_empty());
        assert!(usable_suggestions(Some(&json!({"other": 1})), &[]).is_empty());
    }
}
