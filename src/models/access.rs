// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Role-based permission gates for meal and role management.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::meal::UserId;

/// Named gates checked before an action is carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    MealAccess,
    MealCreate,
    MealShow,
    MealEdit,
    MealDelete,
    RoleAccess,
    RoleCreate,
    RoleShow,
    RoleEdit,
    RoleDelete,
    IngredientAccess,
}

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::MealAccess,
        Permission::MealCreate,
        Permission::MealShow,
        Permission::MealEdit,
        Permission::MealDelete,
        Permission::RoleAccess,
        Permission::RoleCreate,
        Permission::RoleShow,
        Permission::RoleEdit,
        Permission::RoleDelete,
        Permission::IngredientAccess,
    ];

    /// Gate name as written in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::MealAccess => "meal_access",
            Permission::MealCreate => "meal_create",
            Permission::MealShow => "meal_show",
            Permission::MealEdit => "meal_edit",
            Permission::MealDelete => "meal_delete",
            Permission::RoleAccess => "role_access",
            Permission::RoleCreate => "role_create",
            Permission::RoleShow => "role_show",
            Permission::RoleEdit => "role_edit",
            Permission::RoleDelete => "role_delete",
            Permission::IngredientAccess => "ingredient_access",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a gate name does not match any known permission.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown permission `{0}`")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == raw.trim())
            .ok_or_else(|| UnknownPermission(raw.to_string()))
    }
}

/// A named bundle of permissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub title: String,
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(
        title: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            title: title.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// The user driving the current session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub roles: Vec<Role>,
}

/// Denial returned by [`authorize`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("{actor} is not allowed to {permission}")]
    Missing { actor: String, permission: Permission },
    #[error("{actor} does not own this meal")]
    NotOwner { actor: String },
}

/// Allow/deny decision for an action name and actor.
pub trait AccessControl: Send + Sync {
    fn allows(&self, actor: &Actor, permission: Permission) -> bool;
}

/// Grants a permission when any of the actor's roles carries it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoleGate;

impl AccessControl for RoleGate {
    fn allows(&self, actor: &Actor, permission: Permission) -> bool {
        actor.roles.iter().any(|role| role.grants(permission))
    }
}

/// Check a gate, turning a deny into a typed error.
pub fn authorize(
    gate: &dyn AccessControl,
    actor: &Actor,
    permission: Permission,
) -> Result<(), AccessDenied> {
    if gate.allows(actor, permission) {
        Ok(())
    } else {
        log::warn!("denied {} for user {}", permission, actor.id);
        Err(AccessDenied::Missing {
            actor: actor.name.clone(),
            permission,
        })
    }
}

/// Check a gate for an action on an owned record (edit/delete).
pub fn authorize_owned(
    gate: &dyn AccessControl,
    actor: &Actor,
    permission: Permission,
    owner: UserId,
) -> Result<(), AccessDenied> {
    authorize(gate, actor, permission)?;
    if actor.id != owner {
        log::warn!("denied {} for user {}: owner is {}", permission, actor.id, owner);
        return Err(AccessDenied::NotOwner {
            actor: actor.name.clone(),
        });
    }
    Ok(())
}

/// Built-in roles used when configuration does not define any.
pub fn default_roles() -> Vec<Role> {
    vec![
        Role::new("admin", Permission::ALL),
        Role::new(
            "user",
            [
                Permission::MealAccess,
                Permission::MealCreate,
                Permission::MealShow,
                Permission::MealEdit,
                Permission::MealDelete,
                Permission::IngredientAccess,
            ],
        ),
    ]
}
