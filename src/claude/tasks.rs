use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use super::{
    client::{CompletionRequest, LlmClient},
    prompts,
    types::{FullRecipe, UserPreferences, WeeklyMealPlan},
};
use crate::config::ClaudeConfig;

pub const FALLBACK_MESSAGE: &str =
    "I'm having trouble processing that right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    FindRecipes,
    RecipeDetails,
    CreateMealPlan,
    ShoppingList,
    ExtractPreferences,
    ModifyRecipe,
    RerollMeal,
    GeneralQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Fast,
    Smart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskSettings {
    pub tier: ModelTier,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::FindRecipes => "find_recipes",
            Task::RecipeDetails => "recipe_details",
            Task::CreateMealPlan => "create_meal_plan",
            Task::ShoppingList => "shopping_list",
            Task::ExtractPreferences => "extract_preferences",
            Task::ModifyRecipe => "modify_recipe",
            Task::RerollMeal => "reroll_meal",
            Task::GeneralQuery => "general_query",
        }
    }

    /// Creative and open-ended tasks go to the smart tier and run hotter;
    /// extraction runs coldest.
    pub fn settings(self) -> TaskSettings {
        use ModelTier::{Fast, Smart};
        let (tier, max_tokens, temperature) = match self {
            Task::FindRecipes => (Fast, 2000, 0.7),
            Task::RecipeDetails => (Fast, 3000, 0.5),
            Task::CreateMealPlan => (Smart, 4000, 0.9),
            Task::ShoppingList => (Fast, 3000, 0.3),
            Task::ExtractPreferences => (Fast, 1000, 0.1),
            Task::ModifyRecipe => (Smart, 3000, 0.6),
            Task::RerollMeal => (Smart, 1200, 0.9),
            Task::GeneralQuery => (Smart, 1500, 0.7),
        };
        TaskSettings {
            tier,
            max_tokens,
            temperature,
        }
    }
}

/// Typed input for each task.
#[derive(Debug, Clone)]
pub enum TaskContext {
    FindRecipes {
        ingredients: Vec<String>,
        preferences: UserPreferences,
    },
    RecipeDetails {
        recipe_name: String,
        available: Vec<String>,
        preferences: UserPreferences,
    },
    CreateMealPlan {
        preferences: UserPreferences,
        days: u8,
        notes: Option<String>,
    },
    ShoppingList {
        plan: WeeklyMealPlan,
        household_size: Option<u32>,
    },
    ExtractPreferences {
        text: String,
    },
    ModifyRecipe {
        recipe: FullRecipe,
        instruction: String,
    },
    RerollMeal {
        plan: WeeklyMealPlan,
        day_index: usize,
        preferences: UserPreferences,
        notes: Option<String>,
    },
    GeneralQuery {
        query: String,
        context: Option<String>,
    },
}

impl TaskContext {
    pub fn task(&self) -> Task {
        match self {
            TaskContext::FindRecipes { .. } => Task::FindRecipes,
            TaskContext::RecipeDetails { .. } => Task::RecipeDetails,
            TaskContext::CreateMealPlan { .. } => Task::CreateMealPlan,
            TaskContext::ShoppingList { .. } => Task::ShoppingList,
            TaskContext::ExtractPreferences { .. } => Task::ExtractPreferences,
            TaskContext::ModifyRecipe { .. } => Task::ModifyRecipe,
            TaskContext::RerollMeal { .. } => Task::RerollMeal,
            TaskContext::GeneralQuery { .. } => Task::GeneralQuery,
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            TaskContext::FindRecipes {
                ingredients,
                preferences,
            } => prompts::find_recipes(ingredients, preferences),
            TaskContext::RecipeDetails {
                recipe_name,
                available,
                preferences,
            } => prompts::recipe_details(recipe_name, available, preferences),
            TaskContext::CreateMealPlan {
                preferences,
                days,
                notes,
            } => prompts::weekly_plan(preferences, *days, notes.as_deref()),
            TaskContext::ShoppingList {
                plan,
                household_size,
            } => prompts::shopping_list(plan, *household_size),
            TaskContext::ExtractPreferences { text } => prompts::extract_preferences(text),
            TaskContext::ModifyRecipe {
                recipe,
                instruction,
            } => prompts::modify_recipe(recipe, instruction),
            TaskContext::RerollMeal {
                plan,
                day_index,
                preferences,
                notes,
            } => prompts::reroll_meal(plan, *day_index, preferences, notes.as_deref()),
            TaskContext::GeneralQuery { query, context } => {
                prompts::general_query(query, context.as_deref())
            }
        }
    }
}

/// Result of a task. `data == None` is the only failure signal callers get.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl TaskOutcome {
    pub fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            data: None,
        }
    }

    /// Typed view of `data`. A shape mismatch is logged and treated like missing data.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        let data = self.data.clone()?;
        match serde_json::from_value(data) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "task data did not match expected shape");
                None
            }
        }
    }

    /// Like [`decode`](Self::decode) but for a field nested under `data`.
    pub fn decode_field<T: DeserializeOwned>(&self, field: &str) -> Option<T> {
        let inner = self.data.as_ref()?.get(field)?.clone();
        match serde_json::from_value(inner) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, field, "task data field did not match expected shape");
                None
            }
        }
    }
}

/// Removes an optional ```/```json fence around the reply.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag, which ends at the first newline or, on one line, the first space
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => match rest.split_once(char::is_whitespace) {
            Some((tag, after)) if is_fence_tag(tag) => after,
            _ => rest,
        },
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn is_fence_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '+')
}

/// Parses a reply into `{message, data}`. JSON that is not an envelope becomes `data`.
pub fn parse_reply(raw: &str) -> anyhow::Result<TaskOutcome> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))?;
    let is_envelope = value
        .as_object()
        .is_some_and(|o| o.contains_key("message") || o.contains_key("data"));
    if !is_envelope {
        return Ok(TaskOutcome {
            message: String::new(),
            data: Some(value),
        });
    }
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let data = value.get("data").filter(|d| !d.is_null()).cloned();
    Ok(TaskOutcome { message, data })
}

#[derive(Clone)]
pub struct Dispatcher {
    llm: Arc<dyn LlmClient>,
    fast_model: String,
    smart_model: String,
}

impl Dispatcher {
    pub fn new(llm: Arc<dyn LlmClient>, cfg: &ClaudeConfig) -> Self {
        Self {
            llm,
            fast_model: cfg.fast_model.clone(),
            smart_model: cfg.smart_model.clone(),
        }
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Smart => &self.smart_model,
        }
    }

    /// Runs one task. Never fails: API and parse errors become [`TaskOutcome::fallback`].
    #[instrument(skip(self, ctx), fields(task = ctx.task().as_str()))]
    pub async fn invoke(&self, ctx: TaskContext) -> TaskOutcome {
        let task = ctx.task();
        let settings = task.settings();
        let req = CompletionRequest {
            model: self.model_for(settings.tier).to_string(),
            system: prompts::SYSTEM_PROMPT.to_string(),
            prompt: ctx.prompt(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        };
        debug!(model = %req.model, "dispatching task");

        let raw = match self.llm.complete(req).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, task = task.as_str(), "llm call failed");
                return TaskOutcome::fallback();
            }
        };

        match parse_reply(&raw) {
            Ok(outcome) => {
                debug!(has_data = outcome.data.is_some(), "task completed");
                outcome
            }
            Err(e) => {
                error!(error = %e, task = task.as_str(), "llm reply was not valid json");
                TaskOutcome::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claude::fake::ScriptedLlm;
    use serde_json::json;

    fn cfg() -> ClaudeConfig {
        ClaudeConfig {
            api_key: "test".into(),
            base_url: "http://localhost".into(),
            fast_model: "fast-model".into(),
            smart_model: "smart-model".into(),
            timeout_secs: 1,
        }
    }

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"message\":\"hi\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"message\":\"hi\"}");
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        let raw = "  ```\n{\"a\":1}\n```  \n";
        assert_eq!(strip_code_fences(raw), "{\"a\":1}");
        assert_eq!(strip_code_fences(" {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn strips_single_line_fence_with_tag() {
        assert_eq!(strip_code_fences("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        let out = parse_reply(r#"```json {"message":"ok","data":{"n":2}}```"#).unwrap();
        assert_eq!(out.message, "ok");
        assert_eq!(out.data, Some(serde_json::json!({"n": 2})));
    }

    #[test]
    fn parse_reply_reads_envelope() {
        let out = parse_reply(r#"{"message":"Here you go","data":{"recipes":[]}}"#).unwrap();
        assert_eq!(out.message, "Here you go");
        assert_eq!(out.data, Some(json!({"recipes": []})));
    }

    #[test]
    fn parse_reply_null_data_is_none() {
        let out = parse_reply(r#"{"message":"Just chatting","data":null}"#).unwrap();
        assert_eq!(out.data, None);
    }

    #[test]
    fn parse_reply_wraps_bare_payload() {
        let out = parse_reply(r#"{"recipes":[{"name":"x"}]}"#).unwrap();
        assert_eq!(out.message, "");
        assert_eq!(out.data, Some(json!({"recipes": [{"name": "x"}]})));
    }

    #[test]
    fn parse_reply_rejects_prose() {
        assert!(parse_reply("Sure! Here are some recipes").is_err());
    }

    #[test]
    fn creative_tasks_use_smart_tier() {
        for t in [
            Task::CreateMealPlan,
            Task::RerollMeal,
            Task::ModifyRecipe,
            Task::GeneralQuery,
        ] {
            assert_eq!(t.settings().tier, ModelTier::Smart, "{t:?}");
        }
        for t in [
            Task::FindRecipes,
            Task::RecipeDetails,
            Task::ShoppingList,
            Task::ExtractPreferences,
        ] {
            assert_eq!(t.settings().tier, ModelTier::Fast, "{t:?}");
        }
    }

    #[test]
    fn temperature_ordering() {
        let extract = Task::ExtractPreferences.settings().temperature;
        let plan = Task::CreateMealPlan.settings().temperature;
        let reroll = Task::RerollMeal.settings().temperature;
        let all = [
            Task::FindRecipes,
            Task::RecipeDetails,
            Task::CreateMealPlan,
            Task::ShoppingList,
            Task::ExtractPreferences,
            Task::ModifyRecipe,
            Task::RerollMeal,
            Task::GeneralQuery,
        ];
        for t in all {
            let temp = t.settings().temperature;
            assert!(extract <= temp, "{t:?}");
            assert!(plan >= temp && reroll >= temp, "{t:?}");
        }
    }

    #[tokio::test]
    async fn invoke_sends_prompt_with_task_settings() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_ok(r#"```json
{"message":"Try these","data":{"recipes":[]}}
```"#);
        let dispatcher = Dispatcher::new(llm.clone(), &cfg());

        let out = dispatcher
            .invoke(TaskContext::FindRecipes {
                ingredients: vec!["chicken".into(), "rice".into()],
                preferences: UserPreferences::default(),
            })
            .await;

        assert_eq!(out.message, "Try these");
        assert!(out.data.is_some());
        let sent = llm.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].model, "fast-model");
        assert_eq!(sent[0].max_tokens, 2000);
        assert_eq!(sent[0].system, prompts::SYSTEM_PROMPT);
        assert!(sent[0].prompt.contains("chicken, rice"));
    }

    #[tokio::test]
    async fn invoke_uses_smart_model_for_plans() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_ok(r#"{"message":"ok","data":{"weekPlan":[]}}"#);
        let dispatcher = Dispatcher::new(llm.clone(), &cfg());
        dispatcher
            .invoke(TaskContext::CreateMealPlan {
                preferences: UserPreferences::default(),
                days: 7,
                notes: None,
            })
            .await;
        assert_eq!(llm.requests()[0].model, "smart-model");
    }

    #[tokio::test]
    async fn invoke_falls_back_on_api_error() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_err("connection reset");
        let dispatcher = Dispatcher::new(llm, &cfg());
        let out = dispatcher
            .invoke(TaskContext::ExtractPreferences { text: "vegan".into() })
            .await;
        assert_eq!(out, TaskOutcome::fallback());
    }

    #[tokio::test]
    async fn invoke_falls_back_on_invalid_json() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_ok("I think you should make soup.");
        let dispatcher = Dispatcher::new(llm, &cfg());
        let out = dispatcher
            .invoke(TaskContext::GeneralQuery {
                query: "dinner?".into(),
                context: None,
            })
            .await;
        assert_eq!(out.message, FALLBACK_MESSAGE);
        assert!(out.data.is_none());
    }

    #[test]
    fn decode_mismatch_is_none() {
        let out = TaskOutcome {
            message: String::new(),
            data: Some(json!({"weekPlan": "not a list"})),
        };
        assert!(out.decode::<WeeklyMealPlan>().is_none());
        assert!(out.decode_field::<Vec<String>>("missing").is_none());
    }
}
