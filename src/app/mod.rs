// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Application entry point wiring egui/eframe to launch the meal form.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use eframe::egui;
use egui_phosphor::Variant;

use crate::config::AppConfig;
use crate::logic::catalog::{InMemoryCatalog, IngredientCatalog, UnavailableCatalog};
use crate::logic::repository::JsonMealRepository;
use crate::models::access::RoleGate;
use crate::mvu::{AppModel, Services};
use crate::ui::MealFormApp;

/// Build the collaborators from configuration and run the main egui event loop.
pub fn run(config: AppConfig) -> Result<()> {
    let (catalog, catalog_problem) = match InMemoryCatalog::from_json_file(&config.catalog_path) {
        Ok(loaded) => {
            let catalog: Arc<dyn IngredientCatalog> =
                Arc::new(loaded.with_result_limit(config.result_limit));
            (catalog, None)
        }
        Err(err) => {
            let reason = format!("{err:#}");
            log::error!("ingredient search disabled: {reason}");
            let catalog: Arc<dyn IngredientCatalog> =
                Arc::new(UnavailableCatalog::new(reason.clone()));
            (catalog, Some(reason))
        }
    };
    let services = Services {
        catalog,
        repository: Arc::new(JsonMealRepository::new(&config.meals_dir)),
    };
    log::info!(
        "acting as {} (user {}), meals stored in {}",
        config.actor.name,
        config.actor.id,
        config.meals_dir.display()
    );
    let mut model = AppModel::new(config.actor, Arc::new(RoleGate), config.search_timeout);
    if let Some(reason) = catalog_problem {
        model.status = Some(format!("Ingredient catalog unavailable: {reason}"));
    }

    // Register Phosphor icon font.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Mealform",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(MealFormApp::new(model, services)))
        }),
    )
    .map_err(|e| anyhow!("UI terminated with an error: {e}"))
}
