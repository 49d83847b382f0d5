//! Prompt templates, one per task. Every builder is pure and embeds the JSON shape
//! the model must put under `data`.

use super::types::{FullRecipe, UserPreferences, WeeklyMealPlan};

/// Sent as the `system` parameter on every call.
pub const SYSTEM_PROMPT: &str = r#"You are a friendly, practical cooking assistant for a meal planning app.
Always answer with a single JSON object and nothing else:
{"message": "<short conversational reply for the user>", "data": <structured result described in the request>}
Never wrap the JSON in prose. Use double quotes for every key and string."#;

fn join_or(items: &[String], fallback: &str) -> String {
    let joined = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        fallback.to_string()
    } else {
        joined
    }
}

fn or_any(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("any")
}

/// Renders the preference block shared by most prompts.
pub fn render_preferences(prefs: &UserPreferences) -> String {
    let max_cook = prefs
        .max_cook_time
        .map(|m| format!("{m} minutes"))
        .unwrap_or_else(|| "any".into());
    let household = prefs
        .household_size
        .map(|n| n.to_string())
        .unwrap_or_else(|| "any".into());
    format!(
        "- Dietary restrictions: {}\n- Allergies: {}\n- Dislikes: {}\n- Favorite cuisines: {}\n- Skill level: {}\n- Max cook time: {}\n- Budget: {}\n- Household size: {}",
        join_or(&prefs.dietary, "none"),
        join_or(&prefs.allergies, "none"),
        join_or(&prefs.dislikes, "none"),
        join_or(&prefs.favorite_cuisines, "any"),
        or_any(prefs.skill_level.as_deref()),
        max_cook,
        or_any(prefs.budget.as_deref()),
        household,
    )
}

pub fn find_recipes(ingredients: &[String], prefs: &UserPreferences) -> String {
    format!(
        r#"The user has these ingredients: {ingredients}.

User preferences:
{prefs}

Suggest 3 to 5 recipes that make good use of the available ingredients. Prefer recipes that need few additional ingredients. Never include anything the user is allergic to.

Put this under "data":
{{
  "recipes": [
    {{
      "name": "string",
      "description": "one or two sentences",
      "cookTime": "e.g. 30 minutes",
      "difficulty": "Easy | Medium | Hard",
      "usesIngredients": ["ingredients from the user's list"],
      "additionalIngredients": ["anything else needed"],
      "cuisineType": "string"
    }}
  ]
}}"#,
        ingredients = join_or(ingredients, "none"),
        prefs = render_preferences(prefs),
    )
}

pub fn recipe_details(recipe_name: &str, available: &[String], prefs: &UserPreferences) -> String {
    format!(
        r#"Write the complete recipe for "{recipe_name}".
Ingredients the user already has: {available}.

User preferences:
{prefs}

Scale servings to the household size when it is given. Include practical tips and substitutions for common allergens.

Put this under "data":
{{
  "recipeName": "string",
  "description": "string",
  "servings": 4,
  "prepTime": "e.g. 15 minutes",
  "cookTime": "e.g. 30 minutes",
  "totalTime": "e.g. 45 minutes",
  "difficulty": "Easy | Medium | Hard",
  "cuisineType": "string",
  "ingredients": [{{"item": "string", "amount": "string", "unit": "string", "notes": "string"}}],
  "instructions": ["one step per entry"],
  "tips": ["string"],
  "substitutions": [{{"original": "string", "substitute": "string", "notes": "string"}}],
  "nutrition": {{"calories": "string", "protein": "string", "carbs": "string", "fat": "string"}}
}}"#,
        recipe_name = recipe_name,
        available = join_or(available, "none"),
        prefs = render_preferences(prefs),
    )
}

pub fn weekly_plan(prefs: &UserPreferences, days: u8, notes: Option<&str>) -> String {
    format!(
        r#"Create a dinner plan for {days} days.

User preferences:
{prefs}

Additional requests: {notes}

Vary cuisines and main proteins across the week, reuse perishable ingredients between days, and keep weeknight meals quick.

Put this under "data":
{{
  "weekPlan": [
    {{
      "day": "Monday",
      "meal": "string",
      "cookTime": "e.g. 30 minutes",
      "difficulty": "Easy | Medium | Hard",
      "description": "string",
      "mainIngredients": ["string"],
      "cuisineType": "string",
      "tags": ["e.g. quick, vegetarian"]
    }}
  ],
  "shoppingCategories": {{"Produce": ["string"], "Protein": ["string"], "Pantry": ["string"]}},
  "prepTips": ["string"],
  "budgetEstimate": "string"
}}
"weekPlan" must contain exactly {days} entries."#,
        days = days,
        prefs = render_preferences(prefs),
        notes = notes.filter(|n| !n.trim().is_empty()).unwrap_or("none"),
    )
}

pub fn shopping_list(plan: &WeeklyMealPlan, household_size: Option<u32>) -> String {
    let meals = plan
        .week_plan
        .iter()
        .map(|d| {
            format!(
                "- {}: {} (main ingredients: {})",
                d.day,
                d.meal,
                join_or(&d.main_ingredients, "not listed")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Build a consolidated shopping list for this meal plan:
{meals}

Household size: {household}

Merge duplicate ingredients, give realistic quantities, and group items by store section.

Put this under "data":
{{
  "categories": [
    {{
      "name": "Produce",
      "items": [{{"item": "string", "quantity": "string", "usedIn": ["day or meal"], "priority": "essential | optional"}}]
    }}
  ],
  "estimatedCost": "string",
  "tips": ["string"]
}}"#,
        meals = meals,
        household = household_size
            .map(|n| n.to_string())
            .unwrap_or_else(|| "any".into()),
    )
}

pub fn extract_preferences(text: &str) -> String {
    format!(
        r#"Extract cooking preferences from what the user wrote:
"{text}"

Only include what the user actually said. Use empty arrays for lists and null for values that were not mentioned.

Put this under "data":
{{
  "dietary": ["e.g. vegetarian"],
  "allergies": ["string"],
  "dislikes": ["string"],
  "favoriteCuisines": ["string"],
  "skillLevel": "beginner | intermediate | advanced | null",
  "maxCookTime": 30,
  "budget": "low | medium | high | null",
  "householdSize": 2
}}"#,
        text = text,
    )
}

pub fn modify_recipe(recipe: &FullRecipe, instruction: &str) -> String {
    let recipe_json = serde_json::to_string_pretty(recipe).unwrap_or_else(|_| recipe.recipe_name.clone());
    format!(
        r#"Here is a recipe:
{recipe_json}

Apply this change: {instruction}

Return the complete modified recipe, not only the changed parts, keeping every field that the change does not affect.

Put the recipe under "data" using exactly the same fields as the input recipe."#,
        recipe_json = recipe_json,
        instruction = instruction,
    )
}

pub fn reroll_meal(
    plan: &WeeklyMealPlan,
    day_index: usize,
    prefs: &UserPreferences,
    notes: Option<&str>,
) -> String {
    let current = plan.week_plan.get(day_index);
    let others = plan
        .week_plan
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != day_index)
        .map(|(_, d)| format!("- {}: {}", d.day, d.meal))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Replace the meal for {day} in a weekly plan. The current meal is "{meal}"; suggest something different.

The rest of the week (avoid repeating these):
{others}

User preferences:
{prefs}

Additional requests: {notes}

Put this under "data":
{{
  "day": "{day}",
  "meal": "string",
  "cookTime": "string",
  "difficulty": "Easy | Medium | Hard",
  "description": "string",
  "mainIngredients": ["string"],
  "cuisineType": "string",
  "tags": ["string"]
}}"#,
        day = current.map(|d| d.day.as_str()).unwrap_or("this day"),
        meal = current.map(|d| d.meal.as_str()).unwrap_or("unknown"),
        others = if others.is_empty() { "none".into() } else { others },
        prefs = render_preferences(prefs),
        notes = notes.filter(|n| !n.trim().is_empty()).unwrap_or("none"),
    )
}

pub fn general_query(query: &str, context: Option<&str>) -> String {
    format!(
        r#"The user asked: "{query}"

Conversation context: {context}

Answer helpfully and briefly. If the question is not about food, cooking or meal planning, steer back politely.

Put null under "data" unless you are returning recipes, in which case use {{"recipes": [...]}} with the same fields as recipe suggestions."#,
        query = query,
        context = context.filter(|c| !c.trim().is_empty()).unwrap_or("none"),
    )
}
