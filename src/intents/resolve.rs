//! Turns raw text or a Dialogflow payload into an [`Intent`] plus parameters.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{
    dto::DialogflowRequest,
    session::{SessionParams, COOKING_MODE},
};
use crate::voice::parser::parse_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FindByIngredients,
    GetDetails,
    CreatePlan,
    GetShoppingList,
    SaveFavorite,
    StartCookingMode,
    CookingNavigation,
    General,
}

impl Intent {
    /// Maps an external intent name. Case and `-`, `.`, ` ` separators are ignored.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if matches!(c, '-' | '.' | ' ') { '_' } else { c })
            .collect();
        match key.as_str() {
            "find_recipes_by_ingredients" | "find_by_ingredients" | "find_recipes" => {
                Intent::FindByIngredients
            }
            "get_recipe_details" | "get_details" | "recipe_details" => Intent::GetDetails,
            "create_meal_plan" | "create_plan" | "meal_plan" => Intent::CreatePlan,
            "get_shopping_list" | "shopping_list" => Intent::GetShoppingList,
            "save_favorite" | "save_favourite" | "save_recipe" => Intent::SaveFavorite,
            "start_cooking_mode" | "start_cooking" | "cooking_mode" => Intent::StartCookingMode,
            "cooking_navigation" | "cooking_step" => Intent::CookingNavigation,
            _ => Intent::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::FindByIngredients => "find_recipes_by_ingredients",
            Intent::GetDetails => "get_recipe_details",
            Intent::CreatePlan => "create_meal_plan",
            Intent::GetShoppingList => "get_shopping_list",
            Intent::SaveFavorite => "save_favorite",
            Intent::StartCookingMode => "start_cooking_mode",
            Intent::CookingNavigation => "cooking_navigation",
            Intent::General => "general_query",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIntent {
    pub intent: Intent,
    pub parameters: Map<String, Value>,
}

impl ResolvedIntent {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            parameters: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }
}

/// Anything that can be classified into an intent. The session bag is available
/// so that cooking-mode transcripts can be read as navigation.
pub trait IntentSource {
    fn resolve(&self, session: &SessionParams) -> ResolvedIntent;
}

/// Free text typed or spoken by the user.
pub struct Utterance<'a>(pub &'a str);

lazy_static! {
    static ref START_COOKING_RE: Regex =
        Regex::new(r"\b(start|begin|let'?s)\s+cook(ing)?\b|\bcooking mode\b").unwrap();
    static ref SHOPPING_RE: Regex =
        Regex::new(r"\b(shopping|grocery) list\b|\bwhat (do|should) i (need to )?buy\b").unwrap();
    static ref MEAL_PLAN_RE: Regex =
        Regex::new(r"\bmeal plan\b|\bweekly plan\b|\bplan (my|the|a|this) (week|meals)\b").unwrap();
    static ref DAYS_RE: Regex = Regex::new(r"\b(\d{1,2})[- ]?days?\b").unwrap();
    static ref SAVE_RE: Regex = Regex::new(
        r"^(?:please\s+)?(?:save|favou?rite|bookmark)\b|\b(?:save|bookmark|favou?rite)\s+(?:this|it|that)\b|\badd (?:this|it|that) to (?:my )?favou?rites\b"
    )
    .unwrap();
    static ref INGREDIENTS_RE: Regex = Regex::new(
        r"(?:\bi have|\bi've got|\bi got|\brecipes? (?:with|using)|\bwhat can i (?:make|cook) with|\bcook with)\s+(.+)"
    )
    .unwrap();
    static ref PICK_NUMBER_RE: Regex =
        Regex::new(r"\b(?:recipe|number|option)\s*#?\s*(\d+)\b").unwrap();
    static ref PICK_ORDINAL_RE: Regex =
        Regex::new(r"\b(first|second|third|fourth|fifth)\b(?:\s+(?:one|recipe|option))?").unwrap();
    static ref DETAILS_RE: Regex = Regex::new(
        r"(?:how (?:do|to) (?:i )?make|recipe for|details (?:for|on|about)|tell me (?:more )?about)\s+(.+)"
    )
    .unwrap();
    static ref LIST_SPLIT_RE: Regex = Regex::new(r"\s*(?:,|\band\b|&|\+)\s*").unwrap();
    static ref NOT_INGREDIENT_RE: Regex = Regex::new(
        r"^(?:what|what's|how|which|why|who|can|could|would|should|do|does|is|are|any|please|your|you|i|i'm|it|that|this)\b"
    )
    .unwrap();
}

/// Splits "chicken, rice and broccoli." into separate ingredients.
pub fn split_ingredients(text: &str) -> Vec<String> {
    LIST_SPLIT_RE
        .split(text)
        .map(|s| {
            s.trim()
                .trim_end_matches(['.', '?', '!'])
                .trim_start_matches("some ")
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty() && !NOT_INGREDIENT_RE.is_match(s))
        .collect()
}

fn ordinal(word: &str) -> Option<u64> {
    Some(match word {
        "first" => 1,
        "second" => 2,
        "third" => 3,
        "fourth" => 4,
        "fifth" => 5,
        _ => return None,
    })
}

impl IntentSource for Utterance<'_> {
    fn resolve(&self, session: &SessionParams) -> ResolvedIntent {
        let raw = self.0.trim();
        let text = raw.to_lowercase();

        let cooking = session
            .get(COOKING_MODE)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if cooking {
            if let Some(cmd) = parse_command(&text) {
                return ResolvedIntent::new(Intent::CookingNavigation).with("command", json!(cmd));
            }
        }

        if SHOPPING_RE.is_match(&text) {
            return ResolvedIntent::new(Intent::GetShoppingList);
        }
        if MEAL_PLAN_RE.is_match(&text) {
            let mut resolved = ResolvedIntent::new(Intent::CreatePlan);
            if let Some(days) = DAYS_RE
                .captures(&text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
            {
                resolved = resolved.with("days", json!(days));
            }
            return resolved;
        }
        if let Some(list) = INGREDIENTS_RE.captures(&text).and_then(|c| c.get(1)) {
            let ingredients = split_ingredients(list.as_str());
            if !ingredients.is_empty() {
                return ResolvedIntent::new(Intent::FindByIngredients)
                    .with("ingredients", json!(ingredients));
            }
        }
        if START_COOKING_RE.is_match(&text) {
            return ResolvedIntent::new(Intent::StartCookingMode);
        }
        if SAVE_RE.is_match(&text) {
            return ResolvedIntent::new(Intent::SaveFavorite);
        }
        let picked = PICK_NUMBER_RE
            .captures(&text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .or_else(|| {
                PICK_ORDINAL_RE
                    .captures(&text)
                    .and_then(|c| c.get(1))
                    .and_then(|m| ordinal(m.as_str()))
            });
        if let Some(n) = picked.filter(|n| *n > 0) {
            return ResolvedIntent::new(Intent::GetDetails).with("recipeNumber", json!(n));
        }
        if let Some(name) = DETAILS_RE.captures(&text).and_then(|c| c.get(1)) {
            let name = name.as_str().trim().trim_end_matches(['.', '?', '!']).trim();
            if !name.is_empty() {
                return ResolvedIntent::new(Intent::GetDetails).with("recipe", json!(name));
            }
        }

        ResolvedIntent::new(Intent::General).with("query", json!(raw))
    }
}

/// Dialogflow CX parameters arrive either bare or as `{originalValue, resolvedValue}`.
fn unwrap_parameter(value: &Value) -> Value {
    match value.get("resolvedValue") {
        Some(resolved) => resolved.clone(),
        None => value.clone(),
    }
}

impl IntentSource for DialogflowRequest {
    fn resolve(&self, session: &SessionParams) -> ResolvedIntent {
        let Some(info) = self
            .intent_info
            .as_ref()
            .filter(|i| !i.display_name.trim().is_empty())
        else {
            return Utterance(self.text.as_deref().unwrap_or_default()).resolve(session);
        };

        let parameters = info
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), unwrap_parameter(v)))
            .collect::<Map<_, _>>();
        let mut resolved = ResolvedIntent {
            intent: Intent::from_name(&info.display_name),
            parameters,
        };
        if resolved.intent == Intent::General && !resolved.parameters.contains_key("query") {
            if let Some(text) = self.text.as_deref() {
                resolved.parameters.insert("query".into(), json!(text));
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::dto::IntentInfo;

    fn classify(text: &str) -> ResolvedIntent {
        Utterance(text).resolve(&SessionParams::new())
    }

    #[test]
    fn intent_names_are_normalised() {
        assert_eq!(Intent::from_name("Find-Recipes-By-Ingredients"), Intent::FindByIngredients);
        assert_eq!(Intent::from_name("create.meal.plan"), Intent::CreatePlan);
        assert_eq!(Intent::from_name("start cooking mode"), Intent::StartCookingMode);
        assert_eq!(Intent::from_name("Default Welcome Intent"), Intent::General);
    }

    #[test]
    fn i_have_extracts_ingredients() {
        let r = classify("I have chicken, rice and broccoli.");
        assert_eq!(r.intent, Intent::FindByIngredients);
        assert_eq!(r.parameters["ingredients"], json!(["chicken", "rice", "broccoli"]));
    }

    #[test]
    fn recipes_with_extracts_ingredients() {
        let r = classify("Any recipes with eggs & spinach?");
        assert_eq!(r.intent, Intent::FindByIngredients);
        assert_eq!(r.parameters["ingredients"], json!(["eggs", "spinach"]));
    }

    #[test]
    fn meal_plan_with_day_count() {
        let r = classify("Make me a 5-day meal plan");
        assert_eq!(r.intent, Intent::CreatePlan);
        assert_eq!(r.parameters["days"], json!(5));
        assert!(!classify("plan my week").parameters.contains_key("days"));
        assert_eq!(classify("plan my week").intent, Intent::CreatePlan);
    }

    #[test]
    fn shopping_and_cooking_and_save() {
        assert_eq!(classify("show my shopping list").intent, Intent::GetShoppingList);
        assert_eq!(classify("let's start cooking").intent, Intent::StartCookingMode);
        assert_eq!(classify("save this one").intent, Intent::SaveFavorite);
    }

    #[test]
    fn picks_recipe_by_number_or_ordinal() {
        let r = classify("show me recipe 2");
        assert_eq!(r.intent, Intent::GetDetails);
        assert_eq!(r.parameters["recipeNumber"], json!(2));
        let r = classify("the third one please");
        assert_eq!(r.parameters["recipeNumber"], json!(3));
    }

    #[test]
    fn details_by_name() {
        let r = classify("How do I make chicken fried rice?");
        assert_eq!(r.intent, Intent::GetDetails);
        assert_eq!(r.parameters["recipe"], json!("chicken fried rice"));
    }

    #[test]
    fn falls_through_to_general() {
        let r = classify("What's a good wine for pasta?");
        assert_eq!(r.intent, Intent::General);
        assert_eq!(r.parameters["query"], json!("What's a good wine for pasta?"));
    }

    #[test]
    fn voice_commands_only_while_cooking() {
        assert_eq!(classify("next").intent, Intent::General);

        let mut session = SessionParams::new();
        session.insert(COOKING_MODE.into(), json!(true));
        let r = Utterance("next step").resolve(&session);
        assert_eq!(r.intent, Intent::CookingNavigation);
        assert_eq!(r.parameters["command"], json!("next"));
    }

    #[test]
    fn ingredient_list_wins_over_save_and_start_words() {
        let r = classify("I have chicken and rice, what's your favorite dish?");
        assert_eq!(r.intent, Intent::FindByIngredients);
        assert_eq!(r.parameters["ingredients"], json!(["chicken", "rice"]));

        let r = classify("let's cook with salmon and leeks");
        assert_eq!(r.intent, Intent::FindByIngredients);
        assert_eq!(r.parameters["ingredients"], json!(["salmon", "leeks"]));
    }

    #[test]
    fn save_needs_a_command() {
        assert_eq!(classify("Save it").intent, Intent::SaveFavorite);
        assert_eq!(classify("please bookmark this recipe").intent, Intent::SaveFavorite);
        assert_eq!(classify("add this to my favorites").intent, Intent::SaveFavorite);
        assert_eq!(classify("what's your favorite dessert?").intent, Intent::General);
        assert_eq!(classify("how do I save money on groceries").intent, Intent::General);
    }

    #[test]
    fn split_ingredients_drops_filler() {
        assert_eq!(
            split_ingredients("some tomatoes + basil, and garlic!"),
            vec!["tomatoes", "basil", "garlic"]
        );
    }

    #[test]
    fn dialogflow_uses_display_name_and_resolved_values() {
        let mut params = Map::new();
        params.insert(
            "ingredients".into(),
            json!({"originalValue": "eggs and ham", "resolvedValue": ["eggs", "ham"]}),
        );
        params.insert("days".into(), json!(3));
        let req = DialogflowRequest {
            intent_info: Some(IntentInfo {
                display_name: "find_recipes_by_ingredients".into(),
                parameters: params,
            }),
            session_info: None,
            text: Some("eggs and ham".into()),
            language_code: Some("en".into()),
        };
        let r = req.resolve(&SessionParams::new());
        assert_eq!(r.intent, Intent::FindByIngredients);
        assert_eq!(r.parameters["ingredients"], json!(["eggs", "ham"]));
        assert_eq!(r.parameters["days"], json!(3));
    }

    #[test]
    fn dialogflow_without_intent_falls_back_to_text() {
        let req = DialogflowRequest {
            intent_info: None,
            session_info: None,
            text: Some("I have tofu".into()),
            language_code: None,
        };
        let r = req.resolve(&SessionParams::new());
        assert_eq!(r.intent, Intent::FindByIngredients);
        assert_eq!(r.parameters["ingredients"], json!(["tofu"]));
    }

    #[test]
    fn dialogflow_general_intent_carries_text_as_query() {
        let req = DialogflowRequest {
            intent_info: Some(IntentInfo {
                display_name: "Default Fallback Intent".into(),
                parameters: Map::new(),
            }),
            session_info: None,
            text: Some("is quinoa gluten free?".into()),
            language_code: None,
        };
        let r = req.resolve(&SessionParams::new());
        assert_eq!(r.intent, Intent::General);
        assert_eq!(r.parameters["query"], json!("is quinoa gluten free?"));
    }
}
