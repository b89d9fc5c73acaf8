// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Standalone HTML recipe cards for saved meals.
//!
//! Responsibilities:
//! - Suggest a filesystem-safe file name from the meal name.
//! - Render the ingredient list and sanitized Markdown instructions into one page.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pulldown_cmark::{Options, Parser, html};

use crate::models::meal::Meal;
use crate::utils::sanitize_component;

/// Suggest a recipe-card filename from a meal name.
///
/// Uses [`crate::utils::sanitize_component()`] for the base name and lowercases it,
/// then appends `.html`.
pub fn suggested_card_name(meal_name: &str) -> String {
    let base = sanitize_component(meal_name).to_ascii_lowercase();
    format!("{base}.html")
}

/// Force a specific extension onto a path when it is missing or different.
///
/// Keeps existing matching extension (case-insensitive); otherwise replaces it.
pub fn ensure_extension(mut path: PathBuf, extension: &str) -> PathBuf {
    let replace = !matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case(extension)
    );

    if replace {
        path.set_extension(extension);
    }
    path
}

/// Render a meal as a self-contained HTML document.
pub fn render_recipe_card(meal: &Meal) -> String {
    let title = ammonia::clean_text(meal.name.trim());
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n\
         <article class=\"recipe\">\n<h1>{title}</h1>\n"
    );
    let _ = writeln!(
        out,
        "<p class=\"meta\">Serves {} &middot; {}</p>",
        meal.servings,
        ammonia::clean_text(&meal.readable_timing())
    );

    out.push_str("<h2>Ingredients</h2>\n<ul class=\"ingredients\">\n");
    for row in &meal.ingredients {
        let _ = writeln!(
            out,
            "<li><span class=\"quantity\">{}</span> {}</li>",
            ammonia::clean_text(&row.quantity),
            ammonia::clean_text(&row.name)
        );
    }
    out.push_str("</ul>\n");

    if !meal.instructions.trim().is_empty() {
        out.push_str("<h2>Instructions</h2>\n<section class=\"instructions\">\n");
        out.push_str(&markdown_to_html(&meal.instructions));
        out.push_str("</section>\n");
    }

    out.push_str("</article>\n</body>\n</html>\n");
    out
}

/// Write the recipe card for `meal` to `output`, creating parent directories.
pub fn write_recipe_card(output: &Path, meal: &Meal) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    fs::write(output, render_recipe_card(meal))
        .with_context(|| format!("Failed to write recipe card {:?}", output))?;
    log::info!("exported recipe card for meal {} to {}", meal.id, output.display());
    Ok(())
}

/// Convert Markdown to sanitized HTML.
fn markdown_to_html(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(body, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    ammonia::clean(&html_output)
}
