use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        CreateMealPlanRequest, DayRecipeResponse, MealPlanResponse, RerollRequest,
        UpdateMealPlanRequest,
    },
    repo,
    services::{apply_reroll, default_plan_name, MAX_PLAN_DAYS},
};
use crate::{
    auth::services::AuthUser,
    claude::{
        types::{MealPlanDay, UserPreferences, WeeklyMealPlan},
        TaskContext,
    },
    error::{ApiError, ApiJson, ApiResult},
    preferences,
    recipes::services::generate_and_save,
    state::AppState,
};

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", get(list_meal_plans).post(create_meal_plan))
        .route(
            "/meal-plans/:id",
            get(get_meal_plan)
                .put(update_meal_plan)
                .delete(delete_meal_plan),
        )
        .route("/meal-plans/:id/days/:day/reroll", post(reroll_day))
        .route("/meal-plans/:id/days/:day/recipe", post(recipe_for_day))
}

async fn stored_preferences(state: &AppState, user_id: Uuid) -> ApiResult<UserPreferences> {
    Ok(preferences::repo::load(&state.db, user_id)
        .await?
        .unwrap_or_default())
}

async fn load_plan(state: &AppState, user_id: Uuid, id: Uuid) -> ApiResult<repo::MealPlanRow> {
    repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Meal plan"))
}

fn check_day(plan: &WeeklyMealPlan, day: usize) -> ApiResult<()> {
    if day >= plan.week_plan.len() {
        return Err(ApiError::bad_request(format!(
            "day {day} is out of range for a {}-day plan",
            plan.week_plan.len()
        )));
    }
    Ok(())
}

#[instrument(skip(state, body))]
pub async fn create_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateMealPlanRequest>,
) -> ApiResult<(StatusCode, Json<MealPlanResponse>)> {
    let days = body.days.unwrap_or(MAX_PLAN_DAYS);
    if !(1..=MAX_PLAN_DAYS).contains(&days) {
        return Err(ApiError::bad_request(format!(
            "days must be between 1 and {MAX_PLAN_DAYS}"
        )));
    }
    let preferences = stored_preferences(&state, user_id).await?;

    let outcome = state
        .dispatcher
        .invoke(TaskContext::CreateMealPlan {
            preferences,
            days,
            notes: body.notes,
        })
        .await;
    let plan = outcome
        .decode::<WeeklyMealPlan>()
        .filter(|p| !p.week_plan.is_empty())
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("meal plan generation failed")))?;

    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| default_plan_name(OffsetDateTime::now_utc()));
    let row = repo::insert(&state.db, user_id, &name, &plan).await?;
    info!(%user_id, plan_id = %row.id, days = plan.week_plan.len(), "meal plan created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state))]
pub async fn list_meal_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<MealPlanResponse>>> {
    let rows = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(rows.into_iter().map(MealPlanResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MealPlanResponse>> {
    let row = load_plan(&state, user_id, id).await?;
    let links = repo::links(&state.db, id).await?;
    Ok(Json(MealPlanResponse::from(row).with_links(links)))
}

#[instrument(skip(state, body))]
pub async fn update_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateMealPlanRequest>,
) -> ApiResult<Json<MealPlanResponse>> {
    if body.meals.as_ref().is_some_and(|m| m.week_plan.is_empty()) {
        return Err(ApiError::bad_request("meals.weekPlan must not be empty"));
    }
    let name = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let row = repo::update(&state.db, user_id, id, name, body.meals.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Meal plan"))?;
    info!(%user_id, plan_id = %id, meals_changed = body.meals.is_some(), "meal plan updated");
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
pub async fn delete_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Meal plan"));
    }
    info!(%user_id, plan_id = %id, "meal plan deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces only `weekPlan[day]`; the rest of the stored plan is written back untouched.
#[instrument(skip(state, body))]
pub async fn reroll_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, day)): Path<(Uuid, usize)>,
    body: Option<Json<RerollRequest>>,
) -> ApiResult<Json<MealPlanResponse>> {
    let mut plan = load_plan(&state, user_id, id).await?.meals.0;
    check_day(&plan, day)?;
    let preferences = stored_preferences(&state, user_id).await?;
    let notes = body.and_then(|Json(b)| b.notes);

    let outcome = state
        .dispatcher
        .invoke(TaskContext::RerollMeal {
            plan: plan.clone(),
            day_index: day,
            preferences,
            notes,
        })
        .await;
    let Some(replacement) = outcome.decode::<MealPlanDay>() else {
        warn!(%user_id, plan_id = %id, day, "reroll returned no meal");
        return Err(ApiError::Internal(anyhow::anyhow!("meal reroll failed")));
    };
    apply_reroll(&mut plan, day, replacement)?;

    let day_index = i32::try_from(day).map_err(anyhow::Error::from)?;
    let row = repo::save_rerolled_day(&state.db, user_id, id, day_index, &plan)
        .await?
        .ok_or(ApiError::NotFound("Meal plan"))?;
    info!(%user_id, plan_id = %id, day, "meal rerolled");
    let links = repo::links(&state.db, id).await?;
    Ok(Json(MealPlanResponse::from(row).with_links(links)))
}

/// Generates the full recipe for one day's meal and links it to that day.
#[instrument(skip(state))]
pub async fn recipe_for_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, day)): Path<(Uuid, usize)>,
) -> ApiResult<(StatusCode, Json<DayRecipeResponse>)> {
    let plan = load_plan(&state, user_id, id).await?.meals.0;
    check_day(&plan, day)?;
    let meal = &plan.week_plan[day];
    let preferences = stored_preferences(&state, user_id).await?;

    let saved = generate_and_save(
        &state,
        user_id,
        &meal.meal,
        meal.main_ingredients.clone(),
        preferences,
    )
    .await?;
    let day_index = i32::try_from(day).map_err(anyhow::Error::from)?;
    repo::upsert_link(&state.db, id, day_index, saved.id).await?;
    info!(%user_id, plan_id = %id, day, recipe_id = %saved.id, "day recipe linked");

    Ok((
        StatusCode::CREATED,
        Json(DayRecipeResponse {
            day_index: day,
            recipe: saved,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn check_day_bounds() {
        let plan: WeeklyMealPlan = serde_json::from_value(json!({
            "weekPlan": [{"day": "Monday", "meal": "Soup"}, {"day": "Tuesday", "meal": "Salad"}]
        }))
        .unwrap();
        assert!(check_day(&plan, 0).is_ok());
        assert!(check_day(&plan, 1).is_ok());
        let err = check_day(&plan, 2).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("2-day plan"));
    }

    #[test]
    fn update_request_accepts_partial_body() {
        let req: UpdateMealPlanRequest = serde_json::from_value(json!({"name": "Busy week"})).unwrap();
        assert_eq!(req.name.as_deref(), Some("Busy week"));
        assert!(req.meals.is_none());
    }

    #[test]
    fn response_includes_links_only_when_loaded() {
        let row = repo::MealPlanRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Week".into(),
            meals: sqlx::types::Json(
                serde_json::from_value(json!({"weekPlan": [{"day": "Monday", "meal": "Soup"}]}))
                    .unwrap(),
            ),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let plain = serde_json::to_value(MealPlanResponse::from(row.clone())).unwrap();
        assert!(plain.get("recipes").is_none());
        assert_eq!(plain["meals"]["weekPlan"][0]["meal"], "Soup");

        let linked = MealPlanResponse::from(row).with_links(vec![repo::DayRecipeLink {
            day_index: 0,
            recipe_id: Uuid::nil(),
        }]);
        let linked = serde_json::to_value(linked).unwrap();
        assert_eq!(linked["recipes"][0]["dayIndex"], 0);
    }
}
