use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::RecipeRow;
use crate::claude::types::{FullRecipe, RecipeSuggestion, UserPreferences};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Overrides the stored preferences for this call.
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub message: String,
    pub recipes: Vec<RecipeSuggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsRequest {
    #[serde(alias = "name")]
    pub recipe_name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModifyRequest {
    pub instruction: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: Uuid,
    pub recipe: FullRecipe,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<RecipeRow> for SavedRecipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            recipe: row.to_recipe(),
            id: row.id,
            image_url: row.image_url,
            is_favorite: row.is_favorite,
            created_at: row.created_at,
        }
    }
}
