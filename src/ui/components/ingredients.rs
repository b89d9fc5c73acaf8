// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Ingredient list builder: live catalog search, pending selection, and the
//! ordered (ingredient, quantity) entries of the meal being authored.
//!
//! Searches run as commands off the UI thread. Every issued search carries a
//! sequence number and only the response for the latest one is applied, so a
//! slow answer for an old query never overwrites a newer one.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use eframe::egui;

use crate::models::ingredient::{Ingredient, IngredientId, PendingIngredientEntry};
use crate::models::meal::MealIngredient;

/// How long a search may stay unanswered before the form stops waiting.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Progress of the most recently issued search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchStatus {
    /// No search issued since the last reset.
    #[default]
    Idle,
    Pending,
    Ready,
    /// The catalog reported an error; shown as "no results".
    Failed,
    /// No answer within the search timeout; shown as "no results yet".
    TimedOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InFlightSearch {
    seq: u64,
    issued_at: Instant,
}

/// Builder state for one form session.
#[derive(Clone, Debug)]
pub struct IngredientListModel {
    /// Committed entries keyed by position; removed positions leave gaps.
    entries: BTreeMap<usize, PendingIngredientEntry>,
    /// Ingredient ids present in `entries`, excluded from further searches.
    selected_ids: BTreeSet<IngredientId>,
    next_position: usize,
    query: String,
    quantity: String,
    results: Vec<Ingredient>,
    pending_selection: Option<Ingredient>,
    /// True once a search result was picked; hides the dropdown.
    resolved: bool,
    search_seq: u64,
    in_flight: Option<InFlightSearch>,
    status: SearchStatus,
    search_timeout: Duration,
}

impl Default for IngredientListModel {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_TIMEOUT)
    }
}

/// Messages emitted by the ingredients view or by finished searches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngredientsMsg {
    QueryChanged(String),
    /// A result was picked from the dropdown.
    Select(Ingredient),
    QuantityChanged(String),
    Add,
    Remove(usize),
    SearchCompleted {
        seq: u64,
        outcome: Result<Vec<Ingredient>, String>,
    },
    /// Periodic clock signal used to expire unanswered searches.
    Tick(Instant),
}

/// Side effects requested by the builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngredientsCommand {
    Search {
        seq: u64,
        query: String,
        exclude: BTreeSet<IngredientId>,
    },
}

/// User-facing feedback surfaced to the status bar or error modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngredientsEvent {
    pub message: String,
    pub is_error: bool,
}

impl IngredientsEvent {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }
}

impl IngredientListModel {
    /// Fresh, empty builder.
    pub fn new(search_timeout: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            selected_ids: BTreeSet::new(),
            next_position: 0,
            query: String::new(),
            quantity: String::new(),
            results: Vec::new(),
            pending_selection: None,
            resolved: false,
            search_seq: 0,
            in_flight: None,
            status: SearchStatus::Idle,
            search_timeout,
        }
    }

    /// Builder pre-filled with the rows of a saved meal, in row order.
    ///
    /// Rows repeating an ingredient id already present are skipped.
    pub fn from_rows(rows: &[MealIngredient], search_timeout: Duration) -> Self {
        let mut model = Self::new(search_timeout);
        for row in rows {
            if model.selected_ids.contains(&row.ingredient_id) {
                log::warn!(
                    "skipping repeated ingredient {} while loading meal",
                    row.ingredient_id
                );
                continue;
            }
            model.insert_entry(row.ingredient_id, row.name.clone(), row.quantity.clone());
        }
        model
    }

    /// Committed entries in ascending position order.
    pub fn entries(&self) -> impl Iterator<Item = &PendingIngredientEntry> {
        self.entries.values()
    }

    #[cfg(test)]
    pub fn entry(&self, position: usize) -> Option<&PendingIngredientEntry> {
        self.entries.get(&position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn selected_ids(&self) -> &BTreeSet<IngredientId> {
        &self.selected_ids
    }

    #[cfg(test)]
    pub fn next_position(&self) -> usize {
        self.next_position
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn results(&self) -> &[Ingredient] {
        &self.results
    }

    #[cfg(test)]
    pub fn pending_selection(&self) -> Option<&Ingredient> {
        self.pending_selection.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Sequence number of the most recently issued (or invalidated) search.
    #[cfg(test)]
    pub fn search_seq(&self) -> u64 {
        self.search_seq
    }

    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the result dropdown should be shown.
    pub fn shows_dropdown(&self) -> bool {
        !self.resolved && !self.query.trim().is_empty() && !self.results.is_empty()
    }

    /// Whether an `Add` would currently commit an entry.
    pub fn can_add(&self) -> bool {
        !self.quantity.trim().is_empty()
            && !self.query.trim().is_empty()
            && self
                .pending_selection
                .as_ref()
                .is_some_and(|p| !self.selected_ids.contains(&p.id))
    }

    /// `(ingredient id, quantity)` pairs ordered by position, for persistence.
    pub fn persisted_pairs(&self) -> Vec<(IngredientId, String)> {
        self.entries
            .values()
            .map(|e| (e.ingredient_id, e.quantity.clone()))
            .collect()
    }

    /// [`Self::persisted_pairs`] joined with the captured names, for the saved meal rows.
    pub fn to_meal_rows(&self) -> Vec<MealIngredient> {
        let names: HashMap<IngredientId, &str> = self
            .entries
            .values()
            .map(|e| (e.ingredient_id, e.ingredient_name.as_str()))
            .collect();
        self.persisted_pairs()
            .into_iter()
            .map(|(ingredient_id, quantity)| MealIngredient {
                ingredient_id,
                name: names
                    .get(&ingredient_id)
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                quantity,
            })
            .collect()
    }

    fn insert_entry(&mut self, ingredient_id: IngredientId, name: String, quantity: String) {
        let position = self.next_position;
        self.entries.insert(
            position,
            PendingIngredientEntry {
                position,
                ingredient_id,
                ingredient_name: name,
                quantity,
            },
        );
        self.selected_ids.insert(ingredient_id);
        self.next_position += 1;
    }
}

/// Apply a message to the model. Returns a feedback event when relevant.
pub fn update(
    model: &mut IngredientListModel,
    msg: IngredientsMsg,
    cmds: &mut Vec<IngredientsCommand>,
) -> Option<IngredientsEvent> {
    match msg {
        IngredientsMsg::QueryChanged(text) => {
            update_search_query(model, text, cmds);
            None
        }
        IngredientsMsg::Select(ingredient) => {
            model.query = ingredient.name.clone();
            model.pending_selection = Some(ingredient);
            model.resolved = true;
            None
        }
        IngredientsMsg::QuantityChanged(text) => {
            model.quantity = text;
            None
        }
        IngredientsMsg::Add => add_entry(model),
        IngredientsMsg::Remove(position) => remove_entry(model, position),
        IngredientsMsg::SearchCompleted { seq, outcome } => {
            apply_search_outcome(model, seq, outcome);
            None
        }
        IngredientsMsg::Tick(now) => {
            expire_search(model, now);
            None
        }
    }
}

/// Record the new query and issue a catalog search for it.
fn update_search_query(
    model: &mut IngredientListModel,
    text: String,
    cmds: &mut Vec<IngredientsCommand>,
) {
    model.query = text;
    model.resolved = false;
    // Any in-flight answer now belongs to an outdated query.
    model.search_seq += 1;

    if model.query.trim().is_empty() {
        model.results.clear();
        model.in_flight = None;
        model.status = SearchStatus::Idle;
        return;
    }

    model.pending_selection = None;
    model.in_flight = Some(InFlightSearch {
        seq: model.search_seq,
        issued_at: Instant::now(),
    });
    model.status = SearchStatus::Pending;
    log::debug!(
        "issuing ingredient search #{} for {:?}",
        model.search_seq,
        model.query
    );
    cmds.push(IngredientsCommand::Search {
        seq: model.search_seq,
        query: model.query.clone(),
        exclude: model.selected_ids.clone(),
    });
}

/// Apply a search response if it answers the latest query.
fn apply_search_outcome(
    model: &mut IngredientListModel,
    seq: u64,
    outcome: Result<Vec<Ingredient>, String>,
) {
    if seq != model.search_seq {
        log::debug!(
            "discarding stale ingredient search #{seq} (latest is #{})",
            model.search_seq
        );
        return;
    }

    model.in_flight = None;
    match outcome {
        Ok(found) => {
            // Entries may have been added since the search was issued.
            model.results = found
                .into_iter()
                .filter(|i| !model.selected_ids.contains(&i.id))
                .collect();
            model.status = SearchStatus::Ready;
        }
        Err(err) => {
            log::warn!("ingredient search #{seq} failed: {err}");
            model.results.clear();
            model.status = SearchStatus::Failed;
        }
    }
}

/// Stop waiting for a search that has been pending longer than the timeout.
fn expire_search(model: &mut IngredientListModel, now: Instant) {
    let Some(in_flight) = model.in_flight else {
        return;
    };
    if now.saturating_duration_since(in_flight.issued_at) < model.search_timeout {
        return;
    }

    log::warn!(
        "ingredient search #{} unanswered after {:?}",
        in_flight.seq,
        model.search_timeout
    );
    model.in_flight = None;
    model.results.clear();
    model.status = SearchStatus::TimedOut;
}

/// Commit the pending selection with its quantity when all inputs are present.
fn add_entry(model: &mut IngredientListModel) -> Option<IngredientsEvent> {
    let pending = model.pending_selection.as_ref()?;
    let name = model.query.trim();
    let quantity = model.quantity.trim();
    if name.is_empty() || quantity.is_empty() {
        return None;
    }

    if model.selected_ids.contains(&pending.id) {
        return Some(IngredientsEvent::info(format!(
            "{name} is already in the list."
        )));
    }

    let (id, name, quantity) = (pending.id, name.to_string(), quantity.to_string());
    let message = format!("Added {quantity} {name}.");
    model.insert_entry(id, name, quantity);
    reset_query(model);

    Some(IngredientsEvent::info(message))
}

/// Drop the entry at `position`; unknown positions are ignored.
fn remove_entry(model: &mut IngredientListModel, position: usize) -> Option<IngredientsEvent> {
    let removed = model.entries.remove(&position)?;

    let still_used = model
        .entries
        .values()
        .any(|e| e.ingredient_id == removed.ingredient_id);
    if !still_used {
        model.selected_ids.remove(&removed.ingredient_id);
    }

    Some(IngredientsEvent::info(format!(
        "Removed {}.",
        removed.ingredient_name
    )))
}

/// Clear the transient search inputs after a successful add.
fn reset_query(model: &mut IngredientListModel) {
    model.query.clear();
    model.quantity.clear();
    model.results.clear();
    model.pending_selection = None;
    model.resolved = false;
    model.search_seq += 1;
    model.in_flight = None;
    model.status = SearchStatus::Idle;
}

/// Render the builder and return any messages triggered by user interaction.
pub fn view(ui: &mut egui::Ui, model: &IngredientListModel) -> Vec<IngredientsMsg> {
    let mut msgs = Vec::new();

    let title = if model.is_empty() {
        "Ingredients".to_string()
    } else {
        format!("Ingredients ({})", model.len())
    };

    egui::CollapsingHeader::new(title)
        .id_salt("ingredients")
        .default_open(true)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                let mut query = model.query().to_string();
                let query_resp = ui.add(
                    egui::TextEdit::singleline(&mut query)
                        .hint_text(format!(
                            "{} Search ingredients, e.g. flour",
                            egui_phosphor::regular::MAGNIFYING_GLASS
                        ))
                        .desired_width(240.0),
                );
                if query_resp.changed() {
                    msgs.push(IngredientsMsg::QueryChanged(query));
                }

                let mut quantity = model.quantity().to_string();
                let quantity_resp = ui.add(
                    egui::TextEdit::singleline(&mut quantity)
                        .hint_text("Quantity, e.g. 2 cups")
                        .desired_width(140.0),
                );
                if quantity_resp.changed() {
                    msgs.push(IngredientsMsg::QuantityChanged(quantity));
                }

                let enter = quantity_resp.lost_focus()
                    && ui.input(|inp| inp.key_pressed(egui::Key::Enter));
                let add = ui
                    .add_enabled(
                        model.can_add(),
                        egui::Button::new(format!("{} Add", egui_phosphor::regular::PLUS)),
                    )
                    .on_disabled_hover_text(
                        "Pick an ingredient from the search results and enter a quantity",
                    )
                    .clicked();
                if add || enter {
                    msgs.push(IngredientsMsg::Add);
                }

                if model.is_searching() {
                    ui.add(egui::Spinner::new().size(14.0))
                        .on_hover_text("Searching ingredients");
                }
            });

            render_search_feedback(ui, model, &mut msgs);

            ui.add_space(8.0);
            render_entries_grid(ui, model, &mut msgs);
        });

    msgs
}

/// Dropdown of matches or a hint about the state of the search.
fn render_search_feedback(
    ui: &mut egui::Ui,
    model: &IngredientListModel,
    msgs: &mut Vec<IngredientsMsg>,
) {
    if model.shows_dropdown() {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_max_width(240.0);
            for ingredient in model.results() {
                if ui.selectable_label(false, &ingredient.name).clicked() {
                    msgs.push(IngredientsMsg::Select(ingredient.clone()));
                }
            }
        });
        return;
    }

    if model.is_resolved() || model.query().trim().is_empty() {
        return;
    }

    let hint = match model.status() {
        SearchStatus::Ready => "No matching ingredients.",
        SearchStatus::Failed => "Ingredient search is unavailable right now.",
        SearchStatus::TimedOut => "Search is taking longer than expected; keep typing to retry.",
        SearchStatus::Idle | SearchStatus::Pending => return,
    };
    ui.label(
        egui::RichText::new(hint)
            .small()
            .color(egui::Color32::from_gray(110)),
    );
}

/// Committed entries with remove buttons, in position order.
fn render_entries_grid(
    ui: &mut egui::Ui,
    model: &IngredientListModel,
    msgs: &mut Vec<IngredientsMsg>,
) {
    if model.is_empty() {
        ui.label(
            egui::RichText::new("No ingredients added yet.")
                .italics()
                .color(egui::Color32::from_gray(110)),
        );
        return;
    }

    egui::Grid::new("ingredients_grid")
        .num_columns(3)
        .striped(true)
        .spacing(egui::vec2(12.0, 6.0))
        .show(ui, |ui| {
            ui.strong("Quantity");
            ui.strong("Ingredient");
            ui.label("");
            ui.end_row();

            for entry in model.entries() {
                ui.label(&entry.quantity);
                ui.label(&entry.ingredient_name);
                if ui
                    .button(
                        egui::RichText::new(egui_phosphor::regular::TRASH_SIMPLE)
                            .color(egui::Color32::from_gray(140)),
                    )
                    .on_hover_text("Remove ingredient")
                    .clicked()
                {
                    msgs.push(IngredientsMsg::Remove(entry.position));
                }
                ui.end_row();
            }
        });
}
