use time::OffsetDateTime;

use crate::claude::types::{MealPlanDay, WeeklyMealPlan};

pub const MAX_PLAN_DAYS: u8 = 7;

pub fn default_plan_name(today: OffsetDateTime) -> String {
    format!("Week of {}", today.date())
}

/// Swaps in a re-rolled meal, keeping the day label of the slot it replaces.
pub fn apply_reroll(
    plan: &mut WeeklyMealPlan,
    day_index: usize,
    mut replacement: MealPlanDay,
) -> anyhow::Result<()> {
    if let Some(current) = plan.week_plan.get(day_index) {
        replacement.day = current.day.clone();
    }
    plan.replace_day(day_index, replacement)
}
