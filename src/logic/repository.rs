// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Meal persistence: one pretty-printed JSON document per meal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::models::meal::{Meal, MealId, MealSummary, sort_by_name};

/// Storage for finalized meals.
pub trait MealRepository: Send + Sync {
    /// Create or overwrite the meal, returning where it was written.
    fn save(&self, meal: &Meal) -> Result<PathBuf>;
    fn load(&self, id: MealId) -> Result<Meal>;
    /// Load a meal document picked by the user.
    fn load_path(&self, path: &Path) -> Result<Meal>;
    fn delete(&self, id: MealId) -> Result<()>;
    /// Every stored meal, sorted by name.
    fn list(&self) -> Result<Vec<MealSummary>>;
}

/// File-backed repository rooted at a directory.
#[derive(Clone, Debug)]
pub struct JsonMealRepository {
    dir: PathBuf,
}

impl JsonMealRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: MealId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl MealRepository for JsonMealRepository {
    fn save(&self, meal: &Meal) -> Result<PathBuf> {
        meal.validate()?;

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create meals directory {:?}", self.dir))?;
        }

        let path = self.path_for(meal.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(meal).context("Failed to serialize meal")?;
        fs::write(&tmp, json).with_context(|| format!("Failed to write meal file {:?}", tmp))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move meal file into place {:?}", path))?;

        log::info!(
            "saved meal {} ({} ingredient(s)) to {}",
            meal.id,
            meal.ingredients.len(),
            path.display()
        );
        Ok(path)
    }

    fn load(&self, id: MealId) -> Result<Meal> {
        self.load_path(&self.path_for(id))
    }

    fn load_path(&self, path: &Path) -> Result<Meal> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read meal file {:?}", path))?;
        let meal: Meal = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse meal file {:?}", path))?;
        log::debug!("loaded meal {} from {}", meal.id, path.display());
        Ok(meal)
    }

    fn delete(&self, id: MealId) -> Result<()> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(anyhow!("Meal {id} has not been saved yet"));
        }
        fs::remove_file(&path).with_context(|| format!("Failed to delete meal file {:?}", path))?;
        log::info!("deleted meal {id}");
        Ok(())
    }

    fn list(&self) -> Result<Vec<MealSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read meals directory {:?}", self.dir))?;
        let mut meals = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read meals directory {:?}", self.dir))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.load_path(&path) {
                Ok(meal) => meals.push(MealSummary::from(&meal)),
                Err(err) => log::warn!("skipping unreadable meal file: {err:#}"),
            }
        }

        sort_by_name(&mut meals);
        log::debug!("listed {} meal(s) in {}", meals.len(), self.dir.display());
        Ok(meals)
    }
}
