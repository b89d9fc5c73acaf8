// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Collaborators behind the meal form: catalog search, meal storage, and recipe-card export.

pub mod catalog;
pub mod export;
pub mod repository;
