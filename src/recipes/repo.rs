use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::claude::types::{FullRecipe, Nutrition, RecipeIngredient, Substitution};

/// Fields of a recipe without their own column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMetadata {
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    #[serde(default)]
    pub nutrition: Nutrition,
    /// Name the model gave the recipe, which may differ from the requested one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub servings: i32,
    pub prep_time: String,
    pub cook_time: String,
    pub total_time: String,
    pub difficulty: String,
    pub cuisine_type: Option<String>,
    pub ingredients: Json<Vec<RecipeIngredient>>,
    pub instructions: Json<Vec<String>>,
    pub metadata: Json<RecipeMetadata>,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    pub created_at: OffsetDateTime,
}

impl RecipeRow {
    pub fn to_recipe(&self) -> FullRecipe {
        let meta = &self.metadata.0;
        FullRecipe {
            recipe_name: meta
                .generated_name
                .clone()
                .unwrap_or_else(|| self.name.clone()),
            description: self.description.clone(),
            servings: u32::try_from(self.servings).unwrap_or_default(),
            prep_time: self.prep_time.clone(),
            cook_time: self.cook_time.clone(),
            total_time: self.total_time.clone(),
            difficulty: self.difficulty.clone(),
            cuisine_type: self.cuisine_type.clone(),
            ingredients: self.ingredients.0.clone(),
            instructions: self.instructions.0.clone(),
            tips: meta.tips.clone(),
            substitutions: meta.substitutions.clone(),
            nutrition: meta.nutrition.clone(),
        }
    }
}

const COLUMNS: &str = r#"
    r.id, r.user_id, r.name, r.description, r.servings, r.prep_time, r.cook_time,
    r.total_time, r.difficulty, r.cuisine_type, r.ingredients, r.instructions,
    r.metadata, r.image_url, r.created_at,
    EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = r.user_id)
        AS is_favorite
"#;

/// Stores a generated recipe. `name` is what the caller asked for.
pub async fn insert<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    name: &str,
    recipe: &FullRecipe,
    image_url: Option<&str>,
) -> anyhow::Result<Uuid> {
    let generated_name = (recipe.recipe_name != name).then(|| recipe.recipe_name.clone());
    let metadata = RecipeMetadata {
        tips: recipe.tips.clone(),
        substitutions: recipe.substitutions.clone(),
        nutrition: recipe.nutrition.clone(),
        generated_name,
    };
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO recipes (user_id, name, description, servings, prep_time, cook_time,
                             total_time, difficulty, cuisine_type, ingredients, instructions,
                             metadata, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(&recipe.description)
    .bind(i32::try_from(recipe.servings).unwrap_or(i32::MAX))
    .bind(&recipe.prep_time)
    .bind(&recipe.cook_time)
    .bind(&recipe.total_time)
    .bind(&recipe.difficulty)
    .bind(&recipe.cuisine_type)
    .bind(Json(&recipe.ingredients))
    .bind(Json(&recipe.instructions))
    .bind(Json(&metadata))
    .bind(image_url)
    .fetch_one(db)
    .await
    .context("insert recipe")?;
    Ok(id)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<RecipeRow>> {
    sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {COLUMNS} FROM recipes r WHERE r.user_id = $1 ORDER BY r.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list recipes")
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<RecipeRow>> {
    sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {COLUMNS} FROM recipes r WHERE r.id = $1 AND r.user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find recipe")
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM recipes WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete recipe")?;
    Ok(res.rows_affected() > 0)
}

/// Idempotent. Returns false when the recipe does not belong to the user.
pub async fn add_favorite<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    recipe_id: Uuid,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        INSERT INTO favorites (user_id, recipe_id)
        SELECT $1, id FROM recipes WHERE id = $2 AND user_id = $1
        ON CONFLICT (user_id, recipe_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(db)
    .await
    .context("add favorite")?;
    Ok(res.rows_affected() > 0)
}

pub async fn remove_favorite(db: &PgPool, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2"#)
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await
        .context("remove favorite")?;
    Ok(res.rows_affected() > 0)
}

pub async fn list_favorites(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<RecipeRow>> {
    sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM recipes r
        JOIN favorites fav ON fav.recipe_id = r.id AND fav.user_id = r.user_id
        WHERE r.user_id = $1
        ORDER BY fav.created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list favorites")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, metadata: RecipeMetadata) -> RecipeRow {
        RecipeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            servings: 4,
            prep_time: "10 minutes".into(),
            cook_time: "20 minutes".into(),
            total_time: "30 minutes".into(),
            difficulty: "Easy".into(),
            cuisine_type: Some("Italian".into()),
            ingredients: Json(vec![]),
            instructions: Json(vec!["Boil water".into()]),
            metadata: Json(metadata),
            image_url: None,
            is_favorite: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn to_recipe_prefers_generated_name() {
        let meta = RecipeMetadata {
            tips: vec!["Salt the water".into()],
            generated_name: Some("Classic Spaghetti Carbonara".into()),
            ..Default::default()
        };
        let recipe = row("carbonara", meta).to_recipe();
        assert_eq!(recipe.recipe_name, "Classic Spaghetti Carbonara");
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.tips, vec!["Salt the water".to_string()]);
    }

    #[test]
    fn to_recipe_falls_back_to_stored_name() {
        let recipe = row("Pad Thai", RecipeMetadata::default()).to_recipe();
        assert_eq!(recipe.recipe_name, "Pad Thai");
        assert_eq!(recipe.instructions, vec!["Boil water".to_string()]);
    }

    #[test]
    fn metadata_uses_camel_case_keys() {
        let meta = RecipeMetadata {
            generated_name: Some("X".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["generatedName"], "X");
        assert!(json.get("tips").is_some());
    }
}
