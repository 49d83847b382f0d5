use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    resolve::{Intent, ResolvedIntent},
    session::{
        SessionParams, COOKING_MODE, CURRENT_MEAL_PLAN, CURRENT_RECIPE, CURRENT_STEP,
        LAST_RECIPES,
    },
};
use crate::{
    claude::{
        types::{FullRecipe, GeneratedShoppingList, UserPreferences, WeeklyMealPlan},
        Dispatcher, TaskContext, TaskOutcome,
    },
    voice::parser::VoiceCommand,
};

/// Persists a recipe as a favorite for a user.
#[async_trait]
pub trait RecipeSaver: Send + Sync {
    async fn save_favorite(&self, user_id: Uuid, recipe: &FullRecipe) -> anyhow::Result<Uuid>;
}

/// Caller-specific data a route may need.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    pub user_id: Option<Uuid>,
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteReply {
    pub message: String,
    pub session: SessionParams,
    pub data: Option<Value>,
}

impl RouteReply {
    fn text(message: impl Into<String>, session: SessionParams) -> Self {
        Self {
            message: message.into(),
            session,
            data: None,
        }
    }
}

pub struct IntentRouter {
    dispatcher: Dispatcher,
    saver: Arc<dyn RecipeSaver>,
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => super::resolve::split_ingredients(s),
        _ => Vec::new(),
    }
}

fn number(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn session_recipe(session: &SessionParams) -> Option<FullRecipe> {
    serde_json::from_value(session.get(CURRENT_RECIPE)?.clone()).ok()
}

fn outcome_message(outcome: &TaskOutcome, default: impl FnOnce() -> String) -> String {
    if outcome.message.trim().is_empty() {
        default()
    } else {
        outcome.message.clone()
    }
}

/// "Step 2 of 5: ..." for the given zero-based step.
pub fn step_message(recipe: &FullRecipe, step: usize) -> String {
    match recipe.instructions.get(step) {
        Some(text) => format!(
            "Step {} of {}: {}",
            step + 1,
            recipe.instructions.len(),
            text
        ),
        None => "That was the last step. Enjoy your meal!".to_string(),
    }
}

impl IntentRouter {
    pub fn new(dispatcher: Dispatcher, saver: Arc<dyn RecipeSaver>) -> Self {
        Self { dispatcher, saver }
    }

    #[instrument(skip_all, fields(intent = resolved.intent.as_str()))]
    pub async fn route(
        &self,
        resolved: ResolvedIntent,
        session: SessionParams,
        ctx: &RouteContext,
    ) -> RouteReply {
        info!("routing intent");
        let params = resolved.parameters;
        match resolved.intent {
            Intent::FindByIngredients => self.find_by_ingredients(&params, session, ctx).await,
            Intent::GetDetails => self.get_details(&params, session, ctx).await,
            Intent::CreatePlan => self.create_plan(&params, session, ctx).await,
            Intent::GetShoppingList => self.shopping_list(session, ctx).await,
            Intent::SaveFavorite => self.save_favorite(session, ctx).await,
            Intent::StartCookingMode => start_cooking(session),
            Intent::CookingNavigation => navigate(&params, session),
            Intent::General => self.general(&params, session).await,
        }
    }

    async fn find_by_ingredients(
        &self,
        params: &SessionParams,
        mut session: SessionParams,
        ctx: &RouteContext,
    ) -> RouteReply {
        let ingredients = string_list(params.get("ingredients"));
        if ingredients.is_empty() {
            return RouteReply::text("What ingredients do you have on hand?", session);
        }
        let outcome = self
            .dispatcher
            .invoke(TaskContext::FindRecipes {
                ingredients,
                preferences: ctx.preferences.clone(),
            })
            .await;
        let recipes = outcome.data.as_ref().and_then(|d| d.get("recipes")).cloned();
        let message = match recipes.as_ref().and_then(Value::as_array) {
            Some(list) if !list.is_empty() => {
                let names = list
                    .iter()
                    .enumerate()
                    .filter_map(|(i, r)| Some(format!("{}. {}", i + 1, r.get("name")?.as_str()?)))
                    .collect::<Vec<_>>()
                    .join(", ");
                outcome_message(&outcome, || format!("Here are some ideas: {names}"))
            }
            Some(_) => "I couldn't find recipes for those ingredients. Try adding a few more.".into(),
            None => outcome.message.clone(),
        };
        if let Some(recipes) = recipes {
            session.insert(LAST_RECIPES.into(), recipes);
        }
        RouteReply {
            message,
            session,
            data: outcome.data,
        }
    }

    async fn get_details(
        &self,
        params: &SessionParams,
        mut session: SessionParams,
        ctx: &RouteContext,
    ) -> RouteReply {
        let picked = number(params.get("recipeNumber")).and_then(|n| {
            let idx = usize::try_from(n).ok()?.checked_sub(1)?;
            session.get(LAST_RECIPES)?.as_array()?.get(idx).cloned()
        });
        let name = params
            .get("recipe")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| picked.as_ref()?.get("name")?.as_str().map(str::to_string));
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return RouteReply::text("Which recipe would you like the details for?", session);
        };
        let mut available = string_list(params.get("ingredients"));
        if available.is_empty() {
            available = string_list(picked.as_ref().and_then(|p| p.get("usesIngredients")));
        }

        let outcome = self
            .dispatcher
            .invoke(TaskContext::RecipeDetails {
                recipe_name: name.clone(),
                available,
                preferences: ctx.preferences.clone(),
            })
            .await;
        let message = match outcome.decode::<FullRecipe>() {
            Some(recipe) => {
                session.insert(CURRENT_RECIPE.into(), json!(recipe));
                session.insert(COOKING_MODE.into(), json!(false));
                session.insert(CURRENT_STEP.into(), json!(0));
                outcome_message(&outcome, || {
                    format!(
                        "Here's how to make {}. It serves {} and takes {}. Say \"start cooking\" when you're ready.",
                        recipe.recipe_name, recipe.servings, recipe.total_time
                    )
                })
            }
            None => outcome.message.clone(),
        };
        RouteReply {
            message,
            session,
            data: outcome.data,
        }
    }

    async fn create_plan(
        &self,
        params: &SessionParams,
        mut session: SessionParams,
        ctx: &RouteContext,
    ) -> RouteReply {
        let days = number(params.get("days")).unwrap_or(7).clamp(1, 7) as u8;
        let mut preferences = ctx.preferences.clone();
        preferences.dietary.extend(string_list(params.get("dietary")));
        let notes = params
            .get("notes")
            .and_then(Value::as_str)
            .map(str::to_string);

        let outcome = self
            .dispatcher
            .invoke(TaskContext::CreateMealPlan {
                preferences,
                days,
                notes,
            })
            .await;
        let message = match outcome.decode::<WeeklyMealPlan>() {
            Some(plan) => {
                session.insert(CURRENT_MEAL_PLAN.into(), json!(plan));
                outcome_message(&outcome, || {
                    let meals = plan
                        .week_plan
                        .iter()
                        .map(|d| format!("{}: {}", d.day, d.meal))
                        .collect::<Vec<_>>()
                        .join("; ");
                    format!("Here's your plan. {meals}")
                })
            }
            None => outcome.message.clone(),
        };
        RouteReply {
            message,
            session,
            data: outcome.data,
        }
    }

    async fn shopping_list(&self, session: SessionParams, ctx: &RouteContext) -> RouteReply {
        let plan = session
            .get(CURRENT_MEAL_PLAN)
            .and_then(|p| serde_json::from_value::<WeeklyMealPlan>(p.clone()).ok());
        let Some(plan) = plan else {
            return RouteReply::text(
                "Create a meal plan first and I'll build the shopping list for it.",
                session,
            );
        };
        let outcome = self
            .dispatcher
            .invoke(TaskContext::ShoppingList {
                plan,
                household_size: ctx.preferences.household_size,
            })
            .await;
        let message = match outcome.decode::<GeneratedShoppingList>() {
            Some(list) => outcome_message(&outcome, || {
                let count: usize = list.categories.iter().map(|c| c.items.len()).sum();
                format!(
                    "Your shopping list has {count} items across {} categories.",
                    list.categories.len()
                )
            }),
            None => outcome.message.clone(),
        };
        RouteReply {
            message,
            session,
            data: outcome.data,
        }
    }

    async fn save_favorite(&self, session: SessionParams, ctx: &RouteContext) -> RouteReply {
        let Some(recipe) = session_recipe(&session) else {
            return RouteReply::text("Pick a recipe first, then I can save it.", session);
        };
        let Some(user_id) = ctx.user_id else {
            return RouteReply::text("Sign in to save recipes to your favorites.", session);
        };
        match self.saver.save_favorite(user_id, &recipe).await {
            Ok(recipe_id) => RouteReply {
                message: format!("Saved {} to your favorites.", recipe.recipe_name),
                session,
                data: Some(json!({ "recipeId": recipe_id })),
            },
            Err(e) => {
                error!(error = %e, %user_id, "save favorite failed");
                RouteReply::text("I couldn't save that recipe right now.", session)
            }
        }
    }

    async fn general(&self, params: &SessionParams, session: SessionParams) -> RouteReply {
        let query = params
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if query.trim().is_empty() {
            return RouteReply::text(
                "Tell me what ingredients you have, or ask me to plan your week.",
                session,
            );
        }
        let outcome = self
            .dispatcher
            .invoke(TaskContext::GeneralQuery {
                query,
                context: describe_session(&session),
            })
            .await;
        RouteReply {
            message: outcome.message,
            session,
            data: outcome.data,
        }
    }
}

fn describe_session(session: &SessionParams) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(recipe) = session_recipe(session) {
        parts.push(format!("currently viewing the recipe {}", recipe.recipe_name));
    }
    if session.contains_key(CURRENT_MEAL_PLAN) {
        parts.push("has a meal plan for this week".to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("The user is {}.", parts.join(" and ")))
    }
}

fn start_cooking(mut session: SessionParams) -> RouteReply {
    let Some(recipe) = session_recipe(&session) else {
        return RouteReply::text(
            "Choose a recipe first, then say \"start cooking\".",
            session,
        );
    };
    if recipe.instructions.is_empty() {
        return RouteReply::text(
            format!("{} has no steps to walk through.", recipe.recipe_name),
            session,
        );
    }
    session.insert(COOKING_MODE.into(), json!(true));
    session.insert(CURRENT_STEP.into(), json!(0));
    let message = format!("Let's cook {}! {}", recipe.recipe_name, step_message(&recipe, 0));
    RouteReply::text(message, session)
}

fn navigate(params: &SessionParams, mut session: SessionParams) -> RouteReply {
    let command = params
        .get("command")
        .and_then(|c| serde_json::from_value::<VoiceCommand>(c.clone()).ok());
    let cooking = session
        .get(COOKING_MODE)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let (Some(command), true, Some(recipe)) = (command, cooking, session_recipe(&session)) else {
        return RouteReply::text("Say \"start cooking\" to begin a recipe.", session);
    };
    let step = number(session.get(CURRENT_STEP)).unwrap_or(0) as usize;
    let last = recipe.instructions.len().saturating_sub(1);

    let message = match command {
        VoiceCommand::Next => {
            if step >= last {
                session.insert(CURRENT_STEP.into(), json!(last));
                step_message(&recipe, recipe.instructions.len())
            } else {
                session.insert(CURRENT_STEP.into(), json!(step + 1));
                step_message(&recipe, step + 1)
            }
        }
        VoiceCommand::Previous => {
            let prev = step.saturating_sub(1).min(last);
            session.insert(CURRENT_STEP.into(), json!(prev));
            step_message(&recipe, prev)
        }
        VoiceCommand::Ingredients => {
            let list = recipe
                .ingredients
                .iter()
                .map(|i| {
                    let amount = [i.amount.as_str(), i.unit.as_deref().unwrap_or_default()]
                        .iter()
                        .filter(|s| !s.is_empty())
                        .copied()
                        .collect::<Vec<_>>()
                        .join(" ");
                    if amount.is_empty() {
                        i.item.clone()
                    } else {
                        format!("{amount} {}", i.item)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("You'll need: {list}")
        }
        VoiceCommand::Exit => {
            session.insert(COOKING_MODE.into(), json!(false));
            format!("Stopped cooking {}. Come back any time.", recipe.recipe_name)
        }
    };
    RouteReply::text(message, session)
}
