use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{DayRecipeLink, MealPlanRow};
use crate::{claude::types::WeeklyMealPlan, recipes::dto::SavedRecipe};

#[derive(Debug, Default, Deserialize)]
pub struct CreateMealPlanRequest {
    pub name: Option<String>,
    pub days: Option<u8>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMealPlanRequest {
    pub name: Option<String>,
    pub meals: Option<WeeklyMealPlan>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RerollRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanResponse {
    pub id: Uuid,
    pub name: String,
    pub meals: WeeklyMealPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipes: Option<Vec<DayRecipeLink>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<MealPlanRow> for MealPlanResponse {
    fn from(row: MealPlanRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            meals: row.meals.0,
            recipes: None,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl MealPlanResponse {
    pub fn with_links(mut self, links: Vec<DayRecipeLink>) -> Self {
        self.recipes = Some(links);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecipeResponse {
    pub day_index: usize,
    pub recipe: SavedRecipe,
}
