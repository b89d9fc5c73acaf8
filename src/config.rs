// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Application configuration loaded from TOML, with command-line overrides.
//!
//! ```toml
//! catalog_path = "data/ingredients.json"
//! meals_dir = "data/meals"
//!
//! [search]
//! timeout_ms = 2000
//! result_limit = 20
//!
//! [user]
//! id = 1
//! name = "chef"
//! roles = ["admin"]
//!
//! [[roles]]
//! title = "admin"
//! permissions = ["meal_create", "meal_edit", "meal_delete"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::models::access::{Actor, Permission, Role, default_roles};
use crate::models::meal::UserId;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "mealform.toml";

/// Fully resolved settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON array of `{ "id", "name" }` ingredient records.
    pub catalog_path: PathBuf,
    /// Directory holding one JSON document per saved meal.
    pub meals_dir: PathBuf,
    pub search_timeout: Duration,
    pub result_limit: Option<usize>,
    /// The user the form acts as.
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    catalog_path: Option<PathBuf>,
    meals_dir: Option<PathBuf>,
    #[serde(default)]
    search: RawSearch,
    #[serde(default)]
    user: RawUser,
    #[serde(default)]
    roles: Vec<RawRole>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearch {
    timeout_ms: Option<u64>,
    result_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUser {
    id: Option<u64>,
    name: Option<String>,
    roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRole {
    title: String,
    permissions: Vec<String>,
}

const DEFAULT_TIMEOUT_MS: u64 = 2000;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("ingredients.json"),
            meals_dir: PathBuf::from("meals"),
            search_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            result_limit: None,
            actor: Actor {
                id: UserId(1),
                name: "chef".to_string(),
                roles: default_roles()
                    .into_iter()
                    .filter(|r| r.title == "admin")
                    .collect(),
            },
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let parsed: RawConfig = toml::from_str(raw).context("Invalid configuration")?;
        resolve(parsed)
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            log::debug!("no {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration {:?}", path))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to load configuration {:?}", path))?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, catalog: Option<PathBuf>, meals_dir: Option<PathBuf>) -> Self {
        if let Some(catalog) = catalog {
            self.catalog_path = catalog;
        }
        if let Some(dir) = meals_dir {
            self.meals_dir = dir;
        }
        self
    }
}

/// Turn raw file values into settings, filling defaults and checking role references.
fn resolve(raw: RawConfig) -> Result<AppConfig> {
    let roles = if raw.roles.is_empty() {
        default_roles()
    } else {
        raw.roles
            .into_iter()
            .map(|r| {
                let permissions = r
                    .permissions
                    .iter()
                    .map(|p| p.parse::<Permission>())
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("Invalid permissions for role `{}`", r.title))?;
                Ok(Role::new(r.title, permissions))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let role_titles = raw.user.roles.unwrap_or_else(|| vec!["admin".to_string()]);
    let mut actor_roles = Vec::with_capacity(role_titles.len());
    for title in &role_titles {
        let role = roles
            .iter()
            .find(|r| &r.title == title)
            .ok_or_else(|| anyhow!("User refers to unknown role `{title}`"))?;
        actor_roles.push(role.clone());
    }

    let timeout_ms = raw.search.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(anyhow!("search.timeout_ms must be greater than zero"));
    }

    Ok(AppConfig {
        catalog_path: raw
            .catalog_path
            .unwrap_or_else(|| PathBuf::from("ingredients.json")),
        meals_dir: raw.meals_dir.unwrap_or_else(|| PathBuf::from("meals")),
        search_timeout: Duration::from_millis(timeout_ms),
        result_limit: raw.search.result_limit,
        actor: Actor {
            id: UserId(raw.user.id.unwrap_or(1)),
            name: raw.user.name.unwrap_or_else(|| "chef".to_string()),
            roles: actor_roles,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_act_as_admin() {
        let config = AppConfig::default();

        assert_eq!(config.catalog_path, PathBuf::from("ingredients.json"));
        assert_eq!(config.meals_dir, PathBuf::from("meals"));
        assert_eq!(config.search_timeout, Duration::from_secs(2));
        assert_eq!(config.result_limit, None);
        assert_eq!(config.actor.id, UserId(1));
        assert_eq!(config.actor.roles[0].title, "admin");
    }

    #[test]
    fn parses_full_configuration() {
        let config = AppConfig::from_toml_str(
            r#"
            catalog_path = "data/ingredients.json"
            meals_dir = "data/meals"

            [search]
            timeout_ms = 750
            result_limit = 10

            [user]
            id = 42
            name = "sam"
            roles = ["cook"]

            [[roles]]
            title = "cook"
            permissions = ["meal_create", "meal_edit"]
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog_path, PathBuf::from("data/ingredients.json"));
        assert_eq!(config.search_timeout, Duration::from_millis(750));
        assert_eq!(config.result_limit, Some(10));
        assert_eq!(config.actor.id, UserId(42));
        assert_eq!(config.actor.name, "sam");
        assert!(config.actor.roles[0].grants(Permission::MealEdit));
        assert!(!config.actor.roles[0].grants(Permission::MealDelete));
    }

    #[test]
    fn unknown_permission_is_an_error() {
        let err = AppConfig::from_toml_str(
            r#"
            [[roles]]
            title = "admin"
            permissions = ["meal_cook"]
            "#,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("unknown permission `meal_cook`"));
    }

    #[test]
    fn unknown_user_role_is_an_error() {
        let err = AppConfig::from_toml_str(
            r#"
            [user]
            roles = ["ghost"]
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("unknown role `ghost`"));
    }

    #[test]
    fn empty_file_matches_defaults() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml_str("catalog = \"x.json\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();

        assert!(AppConfig::load(Some(&tmp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn overrides_replace_paths() {
        let config =
            AppConfig::default().with_overrides(Some(PathBuf::from("cat.json")), None);

        assert_eq!(config.catalog_path, PathBuf::from("cat.json"));
        assert_eq!(config.meals_dir, PathBuf::from("meals"));
    }
}
