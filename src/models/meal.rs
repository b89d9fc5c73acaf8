// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Meal records as persisted by the repository (UI-agnostic).

use std::collections::HashSet;
use std::fmt;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::ingredient::IngredientId;

/// Stable identifier of a saved meal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealId(pub Uuid);

impl MealId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning a meal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted meal-ingredient row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealIngredient {
    pub ingredient_id: IngredientId,
    /// Name snapshot so a meal can be reopened without a catalog lookup.
    pub name: String,
    pub quantity: String,
}

/// A saved meal together with its ordered ingredient rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: MealId,
    pub owner: UserId,
    pub name: String,
    pub servings: u32,
    pub timing_minutes: u32,
    /// Preparation steps as Markdown.
    #[serde(default)]
    pub instructions: String,
    pub ingredients: Vec<MealIngredient>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Meal {
    /// Human-friendly rendering of the preparation time.
    pub fn readable_timing(&self) -> String {
        readable_timing(self.timing_minutes)
    }

    /// Check the fields the form cannot enforce on its own.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("Please enter a meal name."));
        }
        if self.servings == 0 {
            return Err(anyhow!("Servings must be at least 1."));
        }
        if self.ingredients.is_empty() {
            return Err(anyhow!("Add at least one ingredient."));
        }
        assert_unique_ingredients(&self.ingredients)
    }
}

/// Row of the meal index: what the listing shows and who may change it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MealSummary {
    pub id: MealId,
    pub owner: UserId,
    pub name: String,
    pub servings: u32,
    pub timing_minutes: u32,
}

impl MealSummary {
    pub fn readable_timing(&self) -> String {
        readable_timing(self.timing_minutes)
    }
}

impl From<&Meal> for MealSummary {
    fn from(meal: &Meal) -> Self {
        Self {
            id: meal.id,
            owner: meal.owner,
            name: meal.name.clone(),
            servings: meal.servings,
            timing_minutes: meal.timing_minutes,
        }
    }
}

/// Order index rows by name (case-insensitive), ties broken by id.
pub fn sort_by_name(meals: &mut [MealSummary]) {
    meals.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.0.cmp(&b.id.0))
    });
}

/// Render a duration in minutes as `"1 h 15 min"`, `"2 h"` or `"45 min"`.
pub fn readable_timing(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

/// Ensure no ingredient appears twice in a meal.
pub fn assert_unique_ingredients(rows: &[MealIngredient]) -> Result<()> {
    let mut seen = HashSet::new();
    for row in rows {
        if !seen.insert(row.ingredient_id) {
            return Err(anyhow!(
                "Ingredient listed twice in meal: {} (id {})",
                row.name,
                row.ingredient_id
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal_with(ingredients: Vec<MealIngredient>) -> Meal {
        Meal {
            id: MealId::new_v4(),
            owner: UserId(1),
            name: "Pancakes".into(),
            servings: 2,
            timing_minutes: 20,
            instructions: String::new(),
            ingredients,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn row(id: u64, name: &str) -> MealIngredient {
        MealIngredient {
            ingredient_id: IngredientId(id),
            name: name.into(),
            quantity: "1".into(),
        }
    }

    #[test]
    fn readable_timing_formats_hours_and_minutes() {
        assert_eq!(readable_timing(45), "45 min");
        assert_eq!(readable_timing(120), "2 h");
        assert_eq!(readable_timing(75), "1 h 15 min");
        assert_eq!(readable_timing(0), "0 min");
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut meal = meal_with(vec![row(1, "Flour")]);
        meal.name = "   ".into();

        let err = meal.validate().unwrap_err();
        assert!(err.to_string().contains("meal name"));
    }

    #[test]
    fn validate_rejects_zero_servings_and_empty_ingredients() {
        let mut meal = meal_with(vec![row(1, "Flour")]);
        meal.servings = 0;
        assert!(meal.validate().is_err());

        let empty = meal_with(Vec::new());
        assert!(
            empty
                .validate()
                .unwrap_err()
                .to_string()
                .contains("at least one ingredient")
        );
    }

    #[test]
    fn validate_rejects_duplicate_ingredients() {
        let meal = meal_with(vec![row(7, "Flour"), row(7, "Flour")]);

        assert!(meal.validate().is_err());
    }

    #[test]
    fn summary_carries_listing_columns() {
        let mut meal = meal_with(vec![row(7, "Flour")]);
        meal.timing_minutes = 90;

        let summary = MealSummary::from(&meal);

        assert_eq!(summary.id, meal.id);
        assert_eq!(summary.owner, UserId(1));
        assert_eq!(summary.servings, 2);
        assert_eq!(summary.readable_timing(), "1 h 30 min");
    }

    #[test]
    fn meal_serializes_ids_transparently() {
        let meal = meal_with(vec![row(7, "Flour")]);

        let json = serde_json::to_value(&meal).unwrap();

        assert_eq!(json["owner"], 1);
        assert_eq!(json["ingredients"][0]["ingredient_id"], 7);
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
    }
}
