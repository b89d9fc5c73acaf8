// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Ingredient catalog lookups backing the live search of the meal form.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use thiserror::Error;

use crate::models::ingredient::{Ingredient, IngredientId};

/// Failure of a catalog lookup. The form treats it as "no results".
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("ingredient catalog is unavailable: {0}")]
    Unavailable(String),
}

/// Persisted source of selectable ingredients.
pub trait IngredientCatalog: Send + Sync {
    /// Case-insensitive substring match on `name`, never returning an id in `exclude`.
    fn search(
        &self,
        query: &str,
        exclude: &BTreeSet<IngredientId>,
    ) -> Result<Vec<Ingredient>, CatalogError>;
}

/// Catalog held entirely in memory, loaded from a JSON array of `{ "id", "name" }`.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    ingredients: Vec<Ingredient>,
    result_limit: Option<usize>,
}

impl InMemoryCatalog {
    /// Build a catalog, rejecting duplicate ids and blank names.
    pub fn new(ingredients: Vec<Ingredient>) -> Result<Self> {
        let mut seen = HashSet::new();
        for ingredient in &ingredients {
            if ingredient.name.trim().is_empty() {
                return Err(anyhow!("Ingredient {} has an empty name", ingredient.id));
            }
            if !seen.insert(ingredient.id) {
                return Err(anyhow!(
                    "Duplicate ingredient id in catalog: {}",
                    ingredient.id
                ));
            }
        }
        Ok(Self {
            ingredients,
            result_limit: None,
        })
    }

    /// Parse a catalog from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let ingredients: Vec<Ingredient> =
            serde_json::from_str(raw).context("Catalog is not a JSON array of ingredients")?;
        Self::new(ingredients)
    }

    /// Read and parse a catalog file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ingredient catalog {:?}", path))?;
        let catalog = Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse ingredient catalog {:?}", path))?;
        if catalog.is_empty() {
            log::warn!("ingredient catalog {} is empty", path.display());
        } else {
            log::info!(
                "loaded {} ingredient(s) from {}",
                catalog.len(),
                path.display()
            );
        }
        Ok(catalog)
    }

    /// Cap the number of matches returned per search.
    pub fn with_result_limit(mut self, limit: Option<usize>) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

impl IngredientCatalog for InMemoryCatalog {
    fn search(
        &self,
        query: &str,
        exclude: &BTreeSet<IngredientId>,
    ) -> Result<Vec<Ingredient>, CatalogError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let limit = self.result_limit.unwrap_or(usize::MAX);
        Ok(self
            .ingredients
            .iter()
            .filter(|i| !exclude.contains(&i.id))
            .filter(|i| i.name.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Stand-in used when the catalog could not be loaded; every search fails.
#[derive(Clone, Debug)]
pub struct UnavailableCatalog {
    reason: String,
}

impl UnavailableCatalog {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl IngredientCatalog for UnavailableCatalog {
    fn search(
        &self,
        _query: &str,
        _exclude: &BTreeSet<IngredientId>,
    ) -> Result<Vec<Ingredient>, CatalogError> {
        Err(CatalogError::Unavailable(self.reason.clone()))
    }
}
