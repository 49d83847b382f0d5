use anyhow::Context;
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::claude::types::WeeklyMealPlan;

#[derive(Debug, Clone, FromRow)]
pub struct MealPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub meals: Json<WeeklyMealPlan>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One row of `meal_plan_recipes`; at most one recipe per plan day.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DayRecipeLink {
    pub day_index: i32,
    pub recipe_id: Uuid,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    plan: &WeeklyMealPlan,
) -> anyhow::Result<MealPlanRow> {
    sqlx::query_as::<_, MealPlanRow>(
        r#"
        INSERT INTO meal_plans (user_id, name, meals)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, meals, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(Json(plan))
    .fetch_one(db)
    .await
    .context("insert meal plan")
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<MealPlanRow>> {
    sqlx::query_as::<_, MealPlanRow>(
        r#"
        SELECT id, user_id, name, meals, created_at, updated_at
        FROM meal_plans
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list meal plans")
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<MealPlanRow>> {
    sqlx::query_as::<_, MealPlanRow>(
        r#"
        SELECT id, user_id, name, meals, created_at, updated_at
        FROM meal_plans
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find meal plan")
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM meal_plans WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete meal plan")?;
    Ok(res.rows_affected() > 0)
}

async fn mark_lists_stale<'e>(db: impl PgExecutor<'e>, plan_id: Uuid) -> anyhow::Result<u64> {
    let res = sqlx::query(r#"UPDATE shopping_lists SET is_stale = true WHERE meal_plan_id = $1"#)
        .bind(plan_id)
        .execute(db)
        .await
        .context("mark shopping lists stale")?;
    Ok(res.rows_affected())
}

/// Replaces name and/or meals. New meals mark the plan's shopping lists stale.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    name: Option<&str>,
    meals: Option<&WeeklyMealPlan>,
) -> anyhow::Result<Option<MealPlanRow>> {
    let mut tx = db.begin().await.context("begin update meal plan")?;
    let row = sqlx::query_as::<_, MealPlanRow>(
        r#"
        UPDATE meal_plans
        SET name = COALESCE($3, name),
            meals = COALESCE($4, meals),
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, meals, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(meals.map(Json))
    .fetch_optional(&mut *tx)
    .await
    .context("update meal plan")?;

    if row.is_some() && meals.is_some() {
        mark_lists_stale(&mut *tx, id).await?;
    }
    tx.commit().await.context("commit update meal plan")?;
    Ok(row)
}

/// Stores a plan whose `day_index` meal was re-rolled: the plan blob is replaced,
/// its shopping lists go stale and the day's recipe link no longer applies.
pub async fn save_rerolled_day(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    day_index: i32,
    plan: &WeeklyMealPlan,
) -> anyhow::Result<Option<MealPlanRow>> {
    let mut tx = db.begin().await.context("begin reroll")?;
    let row = sqlx::query_as::<_, MealPlanRow>(
        r#"
        UPDATE meal_plans
        SET meals = $3, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, meals, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(Json(plan))
    .fetch_optional(&mut *tx)
    .await
    .context("save rerolled plan")?;

    if row.is_some() {
        let stale = mark_lists_stale(&mut *tx, id).await?;
        sqlx::query(r#"DELETE FROM meal_plan_recipes WHERE meal_plan_id = $1 AND day_index = $2"#)
            .bind(id)
            .bind(day_index)
            .execute(&mut *tx)
            .await
            .context("drop rerolled day link")?;
        tracing::debug!(plan_id = %id, day_index, stale, "reroll persisted");
    }
    tx.commit().await.context("commit reroll")?;
    Ok(row)
}

pub async fn links(db: &PgPool, plan_id: Uuid) -> anyhow::Result<Vec<DayRecipeLink>> {
    sqlx::query_as::<_, DayRecipeLink>(
        r#"
        SELECT day_index, recipe_id
        FROM meal_plan_recipes
        WHERE meal_plan_id = $1
        ORDER BY day_index
        "#,
    )
    .bind(plan_id)
    .fetch_all(db)
    .await
    .context("list meal plan recipes")
}

pub async fn upsert_link(
    db: &PgPool,
    plan_id: Uuid,
    day_index: i32,
    recipe_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meal_plan_recipes (meal_plan_id, day_index, recipe_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (meal_plan_id, day_index) DO UPDATE SET recipe_id = EXCLUDED.recipe_id
        "#,
    )
    .bind(plan_id)
    .bind(day_index)
    .bind(recipe_id)
    .execute(db)
    .await
    .context("upsert meal plan recipe")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::repo::User;

    fn plan(meals: &[&str]) -> WeeklyMealPlan {
        let days: Vec<_> = meals
            .iter()
            .enumerate()
            .map(|(i, meal)| json!({"day": format!("Day {}", i + 1), "meal": meal}))
            .collect();
        serde_json::from_value(json!({ "weekPlan": days })).unwrap()
    }

    async fn user(db: &PgPool) -> Uuid {
        User::create(db, &format!("{}@example.com", Uuid::new_v4()), "hash")
            .await
            .unwrap()
            .id
    }

    async fn recipe(db: &PgPool, user_id: Uuid, name: &str) -> Uuid {
        let (id,): (Uuid,) =
            sqlx::query_as(r#"INSERT INTO recipes (user_id, name) VALUES ($1, $2) RETURNING id"#)
                .bind(user_id)
                .bind(name)
                .fetch_one(db)
                .await
                .unwrap();
        id
    }

    async fn shopping_list(db: &PgPool, user_id: Uuid, plan_id: Uuid) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"INSERT INTO shopping_lists (user_id, meal_plan_id, name) VALUES ($1, $2, 'list') RETURNING id"#,
        )
        .bind(user_id)
        .bind(plan_id)
        .fetch_one(db)
        .await
        .unwrap();
        id
    }

    async fn is_stale(db: &PgPool, list_id: Uuid) -> bool {
        let (stale,): (bool,) = sqlx::query_as(r#"SELECT is_stale FROM shopping_lists WHERE id = $1"#)
            .bind(list_id)
            .fetch_one(db)
            .await
            .unwrap();
        stale
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reroll_stales_own_lists_and_drops_only_that_day_link(db: PgPool) {
        let user_id = user(&db).await;
        let original = plan(&["Pasta", "Tacos", "Curry"]);
        let target = insert(&db, user_id, "Week", &original).await.unwrap();
        let other = insert(&db, user_id, "Other week", &original).await.unwrap();

        let target_list = shopping_list(&db, user_id, target.id).await;
        let other_list = shopping_list(&db, user_id, other.id).await;

        let pasta = recipe(&db, user_id, "Pasta").await;
        let tacos = recipe(&db, user_id, "Tacos").await;
        upsert_link(&db, target.id, 0, pasta).await.unwrap();
        upsert_link(&db, target.id, 1, tacos).await.unwrap();
        upsert_link(&db, other.id, 1, tacos).await.unwrap();

        let rerolled = plan(&["Pasta", "Ramen", "Curry"]);
        let row = save_rerolled_day(&db, user_id, target.id, 1, &rerolled)
            .await
            .unwrap()
            .expect("plan exists");
        assert_eq!(row.meals.0.week_plan[1].meal, "Ramen");

        assert!(is_stale(&db, target_list).await);
        assert!(!is_stale(&db, other_list).await);

        let kept: Vec<_> = links(&db, target.id)
            .await
            .unwrap()
            .into_iter()
            .map(|link| link.day_index)
            .collect();
        assert_eq!(kept, vec![0]);
        assert_eq!(links(&db, other.id).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reroll_of_someone_elses_plan_changes_nothing(db: PgPool) {
        let owner = user(&db).await;
        let stranger = user(&db).await;
        let target = insert(&db, owner, "Week", &plan(&["Pasta"])).await.unwrap();
        let list = shopping_list(&db, owner, target.id).await;

        let row = save_rerolled_day(&db, stranger, target.id, 0, &plan(&["Soup"]))
            .await
            .unwrap();
        assert!(row.is_none());
        assert!(!is_stale(&db, list).await);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rename_keeps_lists_fresh_but_new_meals_stale_them(db: PgPool) {
        let user_id = user(&db).await;
        let target = insert(&db, user_id, "Week", &plan(&["Pasta"])).await.unwrap();
        let list = shopping_list(&db, user_id, target.id).await;

        let renamed = update(&db, user_id, target.id, Some("Busy week"), None)
            .await
            .unwrap()
            .expect("plan exists");
        assert_eq!(renamed.name, "Busy week");
        assert_eq!(renamed.meals.0.week_plan[0].meal, "Pasta");
        assert!(!is_stale(&db, list).await);

        let changed = update(&db, user_id, target.id, None, Some(&plan(&["Soup"])))
            .await
            .unwrap()
            .expect("plan exists");
        assert_eq!(changed.name, "Busy week");
        assert_eq!(changed.meals.0.week_plan[0].meal, "Soup");
        assert!(is_stale(&db, list).await);
    }
}
