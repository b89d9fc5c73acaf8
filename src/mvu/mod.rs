// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel wiring component state, messages, and commands.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::logic::catalog::IngredientCatalog;
use crate::logic::export::write_recipe_card;
use crate::logic::repository::MealRepository;
use crate::models::access::{AccessControl, Actor, Permission, authorize, authorize_owned};
use crate::models::ingredient::IngredientId;
use crate::models::meal::{Meal, MealId, MealSummary, UserId, sort_by_name};
use crate::ui::components::ingredients::{
    self, IngredientListModel, IngredientsCommand, IngredientsMsg,
};
use crate::ui::components::instructions::{self, InstructionsModel, InstructionsMsg};

/// Collaborators used by background commands.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn IngredientCatalog>,
    pub repository: Arc<dyn MealRepository>,
}

/// Which saved meals the index shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MealFilter {
    /// Meals owned by the current actor.
    #[default]
    Mine,
    All,
}

impl MealFilter {
    pub fn label(&self) -> &'static str {
        match self {
            MealFilter::Mine => "My meals",
            MealFilter::All => "All meals",
        }
    }
}

/// Top-level application state.
pub struct AppModel {
    /// Id of the saved meal being edited; `None` while authoring a new one.
    pub meal_id: Option<MealId>,
    /// Owner of the saved meal being edited.
    pub owner: Option<UserId>,
    pub created_at: Option<OffsetDateTime>,
    pub meal_name: String,
    pub servings: u32,
    pub timing_minutes: u32,
    /// Preparation steps editor state.
    pub instructions: InstructionsModel,
    /// Ingredient list builder state.
    pub ingredients: IngredientListModel,
    /// Saved meals as last listed by the repository.
    pub meals: Vec<MealSummary>,
    pub meal_filter: MealFilter,
    /// User the form acts as.
    pub actor: Actor,
    pub gate: Arc<dyn AccessControl>,
    pub search_timeout: Duration,
    /// Meal awaiting delete confirmation.
    pub pending_delete: Option<MealSummary>,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
    /// Count of queued background commands.
    pub pending_commands: usize,
}

impl AppModel {
    pub fn new(actor: Actor, gate: Arc<dyn AccessControl>, search_timeout: Duration) -> Self {
        Self {
            meal_id: None,
            owner: None,
            created_at: None,
            meal_name: String::new(),
            servings: 1,
            timing_minutes: 30,
            instructions: InstructionsModel::default(),
            ingredients: IngredientListModel::new(search_timeout),
            meals: Vec::new(),
            meal_filter: MealFilter::default(),
            actor,
            gate,
            search_timeout,
            pending_delete: None,
            status: None,
            error: None,
            pending_commands: 0,
        }
    }

    /// Whether the form edits an already saved meal.
    pub fn is_editing(&self) -> bool {
        self.meal_id.is_some()
    }

    /// Whether the actor may browse the meal index.
    pub fn can_list_meals(&self) -> bool {
        self.gate.allows(&self.actor, Permission::MealAccess)
    }

    /// Whether the actor may change a meal owned by `owner` with `permission`.
    pub fn owns_with(&self, permission: Permission, owner: UserId) -> bool {
        owner == self.actor.id && self.gate.allows(&self.actor, permission)
    }

    /// Whether Save is permitted for the open form. Denials are not logged.
    pub fn can_save(&self) -> bool {
        match self.owner {
            Some(owner) if self.is_editing() => self.owns_with(Permission::MealEdit, owner),
            _ => self.gate.allows(&self.actor, Permission::MealCreate),
        }
    }

    /// Whether the current actor may delete the open meal.
    pub fn can_delete(&self) -> bool {
        self.owner
            .is_some_and(|owner| self.owns_with(Permission::MealDelete, owner))
    }

    /// Index rows matching the current filter.
    pub fn visible_meals(&self) -> impl Iterator<Item = &MealSummary> {
        let mine_only = self.meal_filter == MealFilter::Mine;
        let me = self.actor.id;
        self.meals
            .iter()
            .filter(move |m| !mine_only || m.owner == me)
    }

    /// Start over with an empty form, keeping the session settings.
    fn reset_form(&mut self) {
        self.meal_id = None;
        self.owner = None;
        self.created_at = None;
        self.meal_name.clear();
        self.servings = 1;
        self.timing_minutes = 30;
        self.instructions = InstructionsModel::default();
        self.ingredients = IngredientListModel::new(self.search_timeout);
    }

    /// Replace the form with a saved meal.
    fn load_meal(&mut self, meal: Meal) {
        self.meal_id = Some(meal.id);
        self.owner = Some(meal.owner);
        self.created_at = Some(meal.created_at);
        self.meal_name = meal.name;
        self.servings = meal.servings;
        self.timing_minutes = meal.timing_minutes;
        self.instructions = InstructionsModel {
            text: meal.instructions,
        };
        self.ingredients = IngredientListModel::from_rows(&meal.ingredients, self.search_timeout);
    }

    /// Insert or refresh the index row of a just-saved meal.
    fn upsert_summary(&mut self, meal: &Meal) {
        let summary = MealSummary::from(meal);
        match self.meals.iter().position(|m| m.id == meal.id) {
            Some(index) => self.meals[index] = summary,
            None => self.meals.push(summary),
        }
        sort_by_name(&mut self.meals);
    }
}

/// Application messages routed through the update function.
pub enum Msg {
    MealNameChanged(String),
    ServingsChanged(u32),
    TimingChanged(u32),
    NewMeal,
    SaveRequested,
    SaveCompleted(Result<Meal, String>),
    /// Open a meal document picked from disk.
    OpenRequested(PathBuf),
    OpenCancelled,
    /// Open a meal from the index.
    OpenMeal(MealId),
    MealLoaded(Result<Meal, String>),
    RefreshMeals,
    MealsListed(Result<Vec<MealSummary>, String>),
    SetMealFilter(MealFilter),
    ExportRequested(PathBuf),
    ExportCancelled,
    ExportCompleted(Result<PathBuf, String>),
    /// Delete the meal open in the form.
    DeleteRequested,
    /// Delete a meal picked from the index.
    DeleteListedRequested(MealId),
    DeleteConfirmed,
    DeleteCancelled,
    DeleteCompleted(Result<MealId, String>),
    DismissError,
    Instructions(InstructionsMsg),
    Ingredients(IngredientsMsg),
}

/// Commands represent side-effects executed between frames.
pub enum Command {
    SearchCatalog {
        seq: u64,
        query: String,
        exclude: BTreeSet<IngredientId>,
    },
    SaveMeal(Meal),
    LoadMeal(MealId),
    LoadMealFile(PathBuf),
    ListMeals,
    ExportCard { output: PathBuf, meal: Meal },
    DeleteMeal(MealId),
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::MealNameChanged(text) => model.meal_name = text,
        Msg::ServingsChanged(n) => model.servings = n.max(1),
        Msg::TimingChanged(minutes) => model.timing_minutes = minutes,
        Msg::DismissError => model.error = None,
        Msg::NewMeal => {
            model.reset_form();
            surface_event(model, "Started a new meal.".to_string(), false);
        }
        Msg::Instructions(m) => instructions::update(&mut model.instructions, m),
        Msg::Ingredients(m) => {
            let mut ing_cmds = Vec::new();
            if let Some(event) = ingredients::update(&mut model.ingredients, m, &mut ing_cmds) {
                surface_event(model, event.message, event.is_error);
            }
            for c in ing_cmds {
                match c {
                    IngredientsCommand::Search {
                        seq,
                        query,
                        exclude,
                    } => cmds.push(Command::SearchCatalog {
                        seq,
                        query,
                        exclude,
                    }),
                }
            }
        }
        Msg::SaveRequested => match authorize_save(model).and_then(|_| build_meal(model)) {
            Ok(meal) => cmds.push(Command::SaveMeal(meal)),
            Err(err) => surface_event(model, err, true),
        },
        Msg::SaveCompleted(result) => match result {
            Ok(meal) => {
                let message = format!("Meal saved: {}", meal.name);
                model.meal_id = Some(meal.id);
                model.owner = Some(meal.owner);
                model.created_at = Some(meal.created_at);
                model.upsert_summary(&meal);
                surface_event(model, message, false);
            }
            Err(err) => surface_event(model, format!("Failed to save meal:\n\n{err}"), true),
        },
        Msg::OpenRequested(path) => match show_allowed(model) {
            Ok(()) => cmds.push(Command::LoadMealFile(path)),
            Err(err) => surface_event(model, err, true),
        },
        Msg::OpenMeal(id) => match show_allowed(model) {
            Ok(()) => cmds.push(Command::LoadMeal(id)),
            Err(err) => surface_event(model, err, true),
        },
        Msg::OpenCancelled => surface_event(model, "Open cancelled.".to_string(), false),
        Msg::MealLoaded(result) => match result {
            Ok(meal) => {
                let message = format!("Opened meal: {}", meal.name);
                model.load_meal(meal);
                surface_event(model, message, false);
            }
            Err(err) => surface_event(model, format!("Failed to open meal:\n\n{err}"), true),
        },
        Msg::RefreshMeals => {
            match authorize(model.gate.as_ref(), &model.actor, Permission::MealAccess) {
                Ok(()) => cmds.push(Command::ListMeals),
                Err(denied) => surface_event(model, denied.to_string(), true),
            }
        }
        Msg::MealsListed(result) => match result {
            Ok(meals) => model.meals = meals,
            Err(err) => surface_event(model, format!("Failed to list meals:\n\n{err}"), true),
        },
        Msg::SetMealFilter(filter) => model.meal_filter = filter,
        Msg::ExportRequested(output) => {
            match show_allowed(model).and_then(|_| build_meal(model)) {
                Ok(meal) => cmds.push(Command::ExportCard { output, meal }),
                Err(err) => surface_event(model, err, true),
            }
        }
        Msg::ExportCancelled => surface_event(model, "Export cancelled.".to_string(), false),
        Msg::ExportCompleted(result) => match result {
            Ok(path) => {
                let message = format!("Recipe card exported: {}", path.display());
                surface_event(model, message, false);
            }
            Err(err) => {
                let message = format!("Failed to export recipe card:\n\n{err}");
                surface_event(model, message, true);
            }
        },
        Msg::DeleteRequested => match open_meal_summary(model) {
            Some(summary) => request_delete(model, summary),
            None => surface_event(model, "This meal has not been saved yet.".to_string(), true),
        },
        Msg::DeleteListedRequested(id) => {
            let listed = model.meals.iter().find(|m| m.id == id).cloned();
            match listed {
                Some(summary) => request_delete(model, summary),
                None => surface_event(model, format!("Meal {id} is not in the list."), true),
            }
        }
        Msg::DeleteCancelled => model.pending_delete = None,
        Msg::DeleteConfirmed => {
            if let Some(target) = model.pending_delete.take() {
                match authorize_delete(model, &target) {
                    Ok(()) => cmds.push(Command::DeleteMeal(target.id)),
                    Err(err) => surface_event(model, err, true),
                }
            }
        }
        Msg::DeleteCompleted(result) => match result {
            Ok(id) => {
                if model.meal_id == Some(id) {
                    model.reset_form();
                }
                model.meals.retain(|m| m.id != id);
                surface_event(model, "Meal deleted.".to_string(), false);
            }
            Err(err) => surface_event(model, format!("Failed to delete meal:\n\n{err}"), true),
        },
    }
}

/// Execute a command synchronously and return a resulting message.
pub fn run_command(cmd: Command, services: &Services) -> Msg {
    match cmd {
        Command::SearchCatalog {
            seq,
            query,
            exclude,
        } => {
            let outcome = services
                .catalog
                .search(&query, &exclude)
                .map_err(|err| err.to_string());
            Msg::Ingredients(IngredientsMsg::SearchCompleted { seq, outcome })
        }
        Command::SaveMeal(meal) => {
            let res = services.repository.save(&meal).map(|_| meal);
            Msg::SaveCompleted(res.map_err(|e| format!("{e:#}")))
        }
        Command::LoadMeal(id) => {
            let res = services.repository.load(id);
            Msg::MealLoaded(res.map_err(|e| format!("{e:#}")))
        }
        Command::LoadMealFile(path) => {
            let res = services.repository.load_path(&path);
            Msg::MealLoaded(res.map_err(|e| format!("{e:#}")))
        }
        Command::ListMeals => {
            let res = services.repository.list();
            Msg::MealsListed(res.map_err(|e| format!("{e:#}")))
        }
        Command::ExportCard { output, meal } => {
            let res = write_recipe_card(&output, &meal).map(|_| output);
            Msg::ExportCompleted(res.map_err(|e| format!("{e:#}")))
        }
        Command::DeleteMeal(id) => {
            let res = services.repository.delete(id).map(|_| id);
            Msg::DeleteCompleted(res.map_err(|e| format!("{e:#}")))
        }
    }
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut AppModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}

fn show_allowed(model: &AppModel) -> Result<(), String> {
    authorize(model.gate.as_ref(), &model.actor, Permission::MealShow)
        .map_err(|denied| denied.to_string())
}

/// Creating needs `meal_create`; editing needs `meal_edit` and ownership.
fn authorize_save(model: &AppModel) -> Result<(), String> {
    let gate = model.gate.as_ref();
    let res = match model.owner {
        Some(owner) if model.is_editing() => {
            authorize_owned(gate, &model.actor, Permission::MealEdit, owner)
        }
        _ => authorize(gate, &model.actor, Permission::MealCreate),
    };
    res.map_err(|denied| denied.to_string())
}

/// Deleting needs `meal_delete` and ownership.
fn authorize_delete(model: &AppModel, target: &MealSummary) -> Result<(), String> {
    authorize_owned(
        model.gate.as_ref(),
        &model.actor,
        Permission::MealDelete,
        target.owner,
    )
    .map_err(|denied| denied.to_string())
}

fn request_delete(model: &mut AppModel, target: MealSummary) {
    match authorize_delete(model, &target) {
        Ok(()) => model.pending_delete = Some(target),
        Err(err) => surface_event(model, err, true),
    }
}

/// Index row for the meal open in the form, when it has been saved.
fn open_meal_summary(model: &AppModel) -> Option<MealSummary> {
    Some(MealSummary {
        id: model.meal_id?,
        owner: model.owner?,
        name: model.meal_name.trim().to_string(),
        servings: model.servings,
        timing_minutes: model.timing_minutes,
    })
}

/// Validate model state and build the meal record to persist or export.
fn build_meal(model: &AppModel) -> Result<Meal, String> {
    let now = OffsetDateTime::now_utc();
    let meal = Meal {
        id: model.meal_id.unwrap_or_else(MealId::new_v4),
        owner: model.owner.unwrap_or(model.actor.id),
        name: model.meal_name.trim().to_string(),
        servings: model.servings,
        timing_minutes: model.timing_minutes,
        instructions: model.instructions.text.trim_end().to_string(),
        ingredients: model.ingredients.to_meal_rows(),
        created_at: model.created_at.unwrap_or(now),
        updated_at: now,
    };
    meal.validate().map_err(|e| e.to_string())?;
    Ok(meal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::catalog::{InMemoryCatalog, UnavailableCatalog};
    use crate::logic::repository::JsonMealRepository;
    use crate::models::access::{Role, RoleGate, default_roles};
    use crate::models::ingredient::Ingredient;
    use crate::ui::components::ingredients::SearchStatus;
    use tempfile::TempDir;

    fn services(tmp: &TempDir) -> Services {
        let catalog = InMemoryCatalog::new(vec![
            Ingredient::new(7, "Flour"),
            Ingredient::new(9, "Milk"),
            Ingredient::new(10, "Egg"),
        ])
        .unwrap();
        Services {
            catalog: Arc::new(catalog),
            repository: Arc::new(JsonMealRepository::new(tmp.path().join("meals"))),
        }
    }

    fn actor(id: u64, roles: Vec<Role>) -> Actor {
        Actor {
            id: UserId(id),
            name: format!("user{id}"),
            roles,
        }
    }

    fn model_for(actor: Actor) -> AppModel {
        AppModel::new(actor, Arc::new(RoleGate), Duration::from_secs(2))
    }

    /// Apply a message and run every resulting command until the queue drains.
    fn dispatch(model: &mut AppModel, services: &Services, msg: Msg) {
        let mut queue = vec![msg];
        while let Some(msg) = queue.pop() {
            let mut cmds = Vec::new();
            update(model, msg, &mut cmds);
            queue.extend(cmds.into_iter().map(|c| run_command(c, services)));
        }
    }

    fn add_ingredient(model: &mut AppModel, services: &Services, query: &str, qty: &str) {
        dispatch(
            model,
            services,
            Msg::Ingredients(IngredientsMsg::QueryChanged(query.into())),
        );
        let chosen = model.ingredients.results()[0].clone();
        dispatch(model, services, Msg::Ingredients(IngredientsMsg::Select(chosen)));
        dispatch(
            model,
            services,
            Msg::Ingredients(IngredientsMsg::QuantityChanged(qty.into())),
        );
        dispatch(model, services, Msg::Ingredients(IngredientsMsg::Add));
    }

    fn filled_model(services: &Services) -> AppModel {
        let mut model = model_for(actor(1, default_roles()));
        model.meal_name = "Pancakes".into();
        model.servings = 2;
        add_ingredient(&mut model, services, "flo", "2 cups");
        add_ingredient(&mut model, services, "mil", "500 ml");
        model
    }

    /// Save a meal named `name` owned by user `owner` and return its id.
    fn saved_meal(services: &Services, owner: u64, name: &str) -> MealId {
        let mut model = model_for(actor(owner, default_roles()));
        model.meal_name = name.into();
        add_ingredient(&mut model, services, "egg", "2");
        dispatch(&mut model, services, Msg::SaveRequested);
        assert!(model.error.is_none(), "{:?}", model.error);
        model.meal_id.unwrap()
    }

    #[test]
    fn search_command_is_routed_through_the_catalog() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = model_for(actor(1, default_roles()));

        let mut cmds = Vec::new();
        update(
            &mut model,
            Msg::Ingredients(IngredientsMsg::QueryChanged("egg".into())),
            &mut cmds,
        );
        assert_eq!(cmds.len(), 1, "query change should enqueue a search");

        let reply = run_command(cmds.pop().unwrap(), &services);
        update(&mut model, reply, &mut cmds);

        assert_eq!(model.ingredients.results(), &[Ingredient::new(10, "Egg")]);
    }

    #[test]
    fn out_of_order_search_replies_keep_latest_query() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = model_for(actor(1, default_roles()));

        let mut cmds = Vec::new();
        update(
            &mut model,
            Msg::Ingredients(IngredientsMsg::QueryChanged("egg".into())),
            &mut cmds,
        );
        update(
            &mut model,
            Msg::Ingredients(IngredientsMsg::QueryChanged("milk".into())),
            &mut cmds,
        );
        let replies: Vec<Msg> = cmds
            .into_iter()
            .map(|c| run_command(c, &services))
            .collect();

        // Deliver the "milk" reply first, then the stale "egg" one.
        let mut rest = Vec::new();
        for reply in replies.into_iter().rev() {
            update(&mut model, reply, &mut rest);
        }

        assert_eq!(model.ingredients.results(), &[Ingredient::new(9, "Milk")]);
        assert!(rest.is_empty());
    }

    #[test]
    fn catalog_failure_shows_no_results_without_error_modal() {
        let tmp = TempDir::new().unwrap();
        let services = Services {
            catalog: Arc::new(UnavailableCatalog::new("connection refused")),
            repository: Arc::new(JsonMealRepository::new(tmp.path())),
        };
        let mut model = model_for(actor(1, default_roles()));

        dispatch(
            &mut model,
            &services,
            Msg::Ingredients(IngredientsMsg::QueryChanged("flo".into())),
        );

        assert!(model.ingredients.results().is_empty());
        assert_eq!(model.ingredients.status(), SearchStatus::Failed);
        assert!(model.error.is_none());
    }

    #[test]
    fn save_request_enqueues_and_completes() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);

        let mut cmds = Vec::new();
        update(&mut model, Msg::SaveRequested, &mut cmds);
        assert_eq!(cmds.len(), 1, "save should enqueue command");

        let msg = run_command(cmds.pop().unwrap(), &services);
        update(&mut model, msg, &mut cmds);

        assert!(model.error.is_none());
        assert_eq!(model.status.as_deref(), Some("Meal saved: Pancakes"));
        let id = model.meal_id.expect("meal id assigned after save");
        assert_eq!(model.owner, Some(UserId(1)));
        assert_eq!(model.meals.len(), 1, "saved meal shows up in the index");
        assert_eq!(model.meals[0].id, id);

        let saved = services.repository.load(id).unwrap();
        let pairs: Vec<_> = saved
            .ingredients
            .iter()
            .map(|r| (r.ingredient_id, r.quantity.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![(IngredientId(7), "2 cups"), (IngredientId(9), "500 ml")]
        );
    }

    #[test]
    fn saved_rows_follow_persisted_pairs_across_position_gaps() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);
        add_ingredient(&mut model, &services, "egg", "3");
        dispatch(&mut model, &services, Msg::Ingredients(IngredientsMsg::Remove(1)));
        let pairs = model.ingredients.persisted_pairs();

        dispatch(&mut model, &services, Msg::SaveRequested);

        let saved = services.repository.load(model.meal_id.unwrap()).unwrap();
        let rows: Vec<_> = saved
            .ingredients
            .iter()
            .map(|r| (r.ingredient_id, r.quantity.clone()))
            .collect();
        assert_eq!(rows, pairs);
        assert_eq!(
            rows,
            vec![
                (IngredientId(7), "2 cups".to_string()),
                (IngredientId(10), "3".to_string()),
            ]
        );
        let names: Vec<_> = saved.ingredients.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Flour", "Egg"]);
    }

    #[test]
    fn save_without_create_permission_sets_error() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);
        model.actor = actor(1, vec![Role::new("viewer", [Permission::MealShow])]);

        let mut cmds = Vec::new();
        update(&mut model, Msg::SaveRequested, &mut cmds);

        assert!(cmds.is_empty());
        assert!(!model.can_save());
        assert_eq!(
            model.error.as_deref(),
            Some("user1 is not allowed to meal_create")
        );
    }

    #[test]
    fn save_with_empty_ingredient_list_sets_error() {
        let mut model = model_for(actor(1, default_roles()));
        model.meal_name = "Air".into();

        let mut cmds = Vec::new();
        update(&mut model, Msg::SaveRequested, &mut cmds);

        assert!(cmds.is_empty());
        assert!(
            model
                .error
                .as_deref()
                .is_some_and(|e| e.contains("at least one ingredient"))
        );
    }

    #[test]
    fn editing_another_users_meal_is_denied() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);
        dispatch(&mut model, &services, Msg::SaveRequested);
        assert!(model.error.is_none());

        model.actor = actor(2, default_roles());
        let mut cmds = Vec::new();
        update(&mut model, Msg::SaveRequested, &mut cmds);

        assert!(cmds.is_empty());
        assert!(!model.can_save());
        assert_eq!(model.error.as_deref(), Some("user2 does not own this meal"));
    }

    #[test]
    fn open_restores_saved_meal_into_form() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut original = filled_model(&services);
        original.instructions.text = "1. Mix\n2. Fry".into();
        dispatch(&mut original, &services, Msg::SaveRequested);
        let id = original.meal_id.unwrap();
        let path = tmp.path().join("meals").join(format!("{id}.json"));

        let mut model = model_for(actor(1, default_roles()));
        dispatch(&mut model, &services, Msg::OpenRequested(path));

        assert_eq!(model.meal_id, Some(id));
        assert_eq!(model.meal_name, "Pancakes");
        assert_eq!(model.instructions.text, "1. Mix\n2. Fry");
        assert_eq!(
            model.ingredients.persisted_pairs(),
            original.ingredients.persisted_pairs()
        );
        assert_eq!(model.ingredients.next_position(), 2);

        // Previously chosen ingredients stay excluded after reopening.
        dispatch(
            &mut model,
            &services,
            Msg::Ingredients(IngredientsMsg::QueryChanged("flo".into())),
        );
        assert!(model.ingredients.results().is_empty());
    }

    #[test]
    fn open_failure_surfaces_error() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = model_for(actor(1, default_roles()));

        dispatch(
            &mut model,
            &services,
            Msg::OpenRequested(tmp.path().join("missing.json")),
        );

        assert!(
            model
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("Failed to open meal"))
        );
        assert!(model.meal_id.is_none());
    }

    #[test]
    fn refresh_lists_meals_and_filters_mine_or_all() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        saved_meal(&services, 1, "Omelette");
        saved_meal(&services, 2, "Custard");
        saved_meal(&services, 1, "Baked eggs");
        let mut model = model_for(actor(1, default_roles()));

        dispatch(&mut model, &services, Msg::RefreshMeals);

        let mine: Vec<_> = model.visible_meals().map(|m| m.name.as_str()).collect();
        assert_eq!(mine, vec!["Baked eggs", "Omelette"]);

        dispatch(&mut model, &services, Msg::SetMealFilter(MealFilter::All));
        let all: Vec<_> = model.visible_meals().map(|m| m.name.as_str()).collect();
        assert_eq!(all, vec!["Baked eggs", "Custard", "Omelette"]);
    }

    #[test]
    fn listing_requires_meal_access() {
        let mut model = model_for(actor(3, vec![Role::new("guest", [Permission::MealShow])]));
        let mut cmds = Vec::new();

        update(&mut model, Msg::RefreshMeals, &mut cmds);

        assert!(cmds.is_empty());
        assert!(!model.can_list_meals());
        assert_eq!(
            model.error.as_deref(),
            Some("user3 is not allowed to meal_access")
        );
    }

    #[test]
    fn other_users_meal_opens_read_only() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let id = saved_meal(&services, 2, "Custard");
        let mut model = model_for(actor(1, default_roles()));
        dispatch(&mut model, &services, Msg::RefreshMeals);
        dispatch(&mut model, &services, Msg::SetMealFilter(MealFilter::All));
        let row = model.visible_meals().next().cloned().unwrap();

        assert!(!model.owns_with(Permission::MealEdit, row.owner));
        assert!(!model.owns_with(Permission::MealDelete, row.owner));

        dispatch(&mut model, &services, Msg::OpenMeal(id));

        assert_eq!(model.meal_name, "Custard");
        assert!(model.error.is_none());
        assert!(!model.can_save());
        assert!(!model.can_delete());
    }

    #[test]
    fn deleting_another_users_listed_meal_is_denied() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let id = saved_meal(&services, 2, "Custard");
        let mut model = model_for(actor(1, default_roles()));
        dispatch(&mut model, &services, Msg::RefreshMeals);

        dispatch(&mut model, &services, Msg::DeleteListedRequested(id));

        assert!(model.pending_delete.is_none());
        assert_eq!(model.error.as_deref(), Some("user1 does not own this meal"));
        assert!(services.repository.load(id).is_ok());
    }

    #[test]
    fn deleting_listed_meal_removes_row() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let keep = saved_meal(&services, 1, "Omelette");
        let gone = saved_meal(&services, 1, "Custard");
        let mut model = model_for(actor(1, default_roles()));
        dispatch(&mut model, &services, Msg::RefreshMeals);

        dispatch(&mut model, &services, Msg::DeleteListedRequested(gone));
        assert_eq!(model.pending_delete.as_ref().map(|m| m.id), Some(gone));
        dispatch(&mut model, &services, Msg::DeleteConfirmed);

        let ids: Vec<_> = model.meals.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![keep]);
        assert!(services.repository.load(gone).is_err());
    }

    #[test]
    fn delete_requires_confirmation_and_resets_form() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);
        dispatch(&mut model, &services, Msg::SaveRequested);
        let id = model.meal_id.unwrap();
        assert!(model.can_delete());

        let mut cmds = Vec::new();
        update(&mut model, Msg::DeleteRequested, &mut cmds);
        assert!(cmds.is_empty());
        assert!(model.pending_delete.is_some());

        dispatch(&mut model, &services, Msg::DeleteConfirmed);

        assert!(model.pending_delete.is_none());
        assert!(model.meal_id.is_none());
        assert!(model.ingredients.is_empty());
        assert!(model.meals.is_empty());
        assert_eq!(model.status.as_deref(), Some("Meal deleted."));
        assert!(services.repository.load(id).is_err());
    }

    #[test]
    fn cancelling_delete_keeps_meal() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);
        dispatch(&mut model, &services, Msg::SaveRequested);
        dispatch(&mut model, &services, Msg::DeleteRequested);

        dispatch(&mut model, &services, Msg::DeleteCancelled);

        assert!(model.pending_delete.is_none());
        assert!(services.repository.load(model.meal_id.unwrap()).is_ok());
    }

    #[test]
    fn deleting_unsaved_meal_sets_error() {
        let mut model = model_for(actor(1, default_roles()));
        let mut cmds = Vec::new();

        update(&mut model, Msg::DeleteRequested, &mut cmds);

        assert!(model.pending_delete.is_none());
        assert_eq!(
            model.error.as_deref(),
            Some("This meal has not been saved yet.")
        );
    }

    #[test]
    fn export_writes_recipe_card() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);
        let output = tmp.path().join("pancakes.html");

        dispatch(&mut model, &services, Msg::ExportRequested(output.clone()));

        assert!(model.error.is_none());
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<h1>Pancakes</h1>"));
        assert!(html.contains(&ammonia::clean_text("500 ml")));
    }

    #[test]
    fn new_meal_clears_form_but_keeps_actor() {
        let tmp = TempDir::new().unwrap();
        let services = services(&tmp);
        let mut model = filled_model(&services);

        dispatch(&mut model, &services, Msg::NewMeal);

        assert!(model.meal_name.is_empty());
        assert!(model.ingredients.is_empty());
        assert_eq!(model.ingredients.next_position(), 0);
        assert_eq!(model.actor.id, UserId(1));
    }

    #[test]
    fn servings_never_drop_below_one() {
        let mut model = model_for(actor(1, default_roles()));
        let mut cmds = Vec::new();

        update(&mut model, Msg::ServingsChanged(0), &mut cmds);

        assert_eq!(model.servings, 1);
    }
}
