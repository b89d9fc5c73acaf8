// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Ingredient catalog records and the pending entries of an in-progress meal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog ingredient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientId(pub u64);

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable catalog ingredient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
}

impl Ingredient {
    #[cfg(test)]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: IngredientId(id),
            name: name.into(),
        }
    }
}

/// One committed (ingredient, quantity) pair in the builder.
///
/// `position` is the insertion slot handed out by the builder; it is never
/// reused within a session, so removed slots leave gaps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingIngredientEntry {
    pub position: usize,
    pub ingredient_id: IngredientId,
    /// Display name captured when the ingredient was picked.
    pub ingredient_name: String,
    /// Free-text quantity, e.g. "2 cups" or "a pinch".
    pub quantity: String,
}
