//! JSON contracts exchanged with the model. Field names are the persisted format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub favorite_cuisines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<String>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cook_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSuggestion {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cook_time: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub uses_ingredients: Vec<String>,
    #[serde(default)]
    pub additional_ingredients: Vec<String>,
    #[serde(default)]
    pub cuisine_type: String,
}

impl RecipeSuggestion {
    /// True when at least one used ingredient matches one of `available`,
    /// ignoring case and allowing either side to contain the other ("chicken" / "chicken breast").
    pub fn overlaps(&self, available: &[String]) -> bool {
        self.uses_ingredients.iter().any(|used| {
            let used = used.trim().to_lowercase();
            available.iter().any(|have| {
                let have = have.trim().to_lowercase();
                !have.is_empty() && (used.contains(&have) || have.contains(&used))
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub item: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub original: String,
    pub substitute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRecipe {
    pub recipe_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: u32,
    #[serde(default)]
    pub prep_time: String,
    #[serde(default)]
    pub cook_time: String,
    #[serde(default)]
    pub total_time: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    #[serde(default)]
    pub nutrition: Nutrition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanDay {
    pub day: String,
    pub meal: String,
    #[serde(default)]
    pub cook_time: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub main_ingredients: Vec<String>,
    #[serde(default)]
    pub cuisine_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMealPlan {
    pub week_plan: Vec<MealPlanDay>,
    #[serde(default)]
    pub shopping_categories: Value,
    #[serde(default)]
    pub prep_tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_estimate: Option<String>,
    /// Anything else the model returned; kept so a stored plan round-trips unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeeklyMealPlan {
    /// Replaces one day wholesale. Every other day and top-level field is left untouched.
    pub fn replace_day(&mut self, index: usize, day: MealPlanDay) -> anyhow::Result<()> {
        let len = self.week_plan.len();
        let slot = self
            .week_plan
            .get_mut(index)
            .ok_or_else(|| anyhow::anyhow!("day index {index} out of range for {len}-day plan"))?;
        *slot = day;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListEntry {
    pub item: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub used_in: Vec<String>,
    #[serde(default)]
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCategory {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ShoppingListEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedShoppingList {
    pub categories: Vec<ShoppingCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Flattened, persisted form of a shopping list line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub item: String,
    pub quantity: String,
    pub category: String,
    #[serde(default)]
    pub purchased: bool,
}

impl GeneratedShoppingList {
    pub fn flatten(self) -> Vec<ShoppingItem> {
        self.categories
            .into_iter()
            .flat_map(|cat| {
                let category = cat.name;
                cat.items.into_iter().map(move |e| ShoppingItem {
                    item: e.item,
                    quantity: e.quantity,
                    category: category.clone(),
                    purchased: false,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(name: &str, meal: &str) -> MealPlanDay {
        MealPlanDay {
            day: name.into(),
            meal: meal.into(),
            cook_time: "30 minutes".into(),
            difficulty: "Easy".into(),
            description: String::new(),
            main_ingredients: vec![],
            cuisine_type: "Italian".into(),
            tags: vec![],
        }
    }

    fn seven_day_plan() -> WeeklyMealPlan {
        let days = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];
        serde_json::from_value(json!({
            "weekPlan": days.iter().map(|d| serde_json::to_value(day(d, &format!("{d} pasta"))).unwrap()).collect::<Vec<_>>(),
            "shoppingCategories": {"Produce": ["basil"]},
            "prepTips": ["Cook rice on Sunday"],
            "budgetEstimate": "$80",
            "weekTheme": "Comfort"
        }))
        .unwrap()
    }

    #[test]
    fn replace_day_touches_only_that_index() {
        let original = seven_day_plan();
        let mut plan = original.clone();
        plan.replace_day(2, day("Wednesday", "Shakshuka")).unwrap();

        assert_eq!(plan.week_plan[2].meal, "Shakshuka");
        for i in (0..7).filter(|i| *i != 2) {
            assert_eq!(plan.week_plan[i], original.week_plan[i]);
        }
        assert_eq!(plan.shopping_categories, original.shopping_categories);
        assert_eq!(plan.prep_tips, original.prep_tips);
        assert_eq!(plan.budget_estimate, original.budget_estimate);
        assert_eq!(plan.extra.get("weekTheme"), Some(&json!("Comfort")));
    }

    #[test]
    fn replace_day_rejects_out_of_range() {
        let mut plan = seven_day_plan();
        assert!(plan.replace_day(7, day("Extra", "Soup")).is_err());
        assert_eq!(plan, seven_day_plan());
    }

    #[test]
    fn difficulty_accepts_lowercase() {
        let s: RecipeSuggestion = serde_json::from_value(json!({
            "name": "Fried rice",
            "difficulty": "easy",
            "usesIngredients": ["rice"]
        }))
        .unwrap();
        assert_eq!(s.difficulty, Difficulty::Easy);
    }

    #[test]
    fn suggestion_overlap_is_case_insensitive() {
        let s: RecipeSuggestion = serde_json::from_value(json!({
            "name": "Chicken and rice",
            "difficulty": "Medium",
            "usesIngredients": ["Chicken breast", "Rice"]
        }))
        .unwrap();
        assert!(s.overlaps(&["chicken".into()]));
        assert!(!s.overlaps(&["tofu".into()]));
        assert!(!s.overlaps(&[" ".into()]));
    }

    #[test]
    fn flatten_keeps_category_and_resets_purchased() {
        let list: GeneratedShoppingList = serde_json::from_value(json!({
            "categories": [
                {"name": "Produce", "items": [
                    {"item": "Onion", "quantity": "2", "usedIn": ["Monday"], "priority": "high"},
                    {"item": "Garlic", "quantity": "1 head"}
                ]},
                {"name": "Dairy", "items": [{"item": "Milk", "quantity": "1 L"}]}
            ]
        }))
        .unwrap();
        let items = list.flatten();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].category, "Produce");
        assert_eq!(items[2].category, "Dairy");
        assert!(items.iter().all(|i| !i.purchased));
        let json = serde_json::to_value(&items[1]).unwrap();
        assert_eq!(
            json,
            json!({"item": "Garlic", "quantity": "1 head", "category": "Produce", "purchased": false})
        );
    }
}
