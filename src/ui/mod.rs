// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell for composing a meal.
//! Handles layout, form controls, and wiring to background commands.

pub mod components;

use std::time::{Duration, Instant};

use eframe::egui;
use egui_phosphor::regular;

use crate::logic::export::{ensure_extension, suggested_card_name};
use crate::models::access::Permission;
use crate::mvu::{self, AppModel, Command, MealFilter, Msg, Services};
use crate::ui::components::ingredients::{self, IngredientsMsg};
use crate::ui::components::instructions;

/// How often to wake up while a search or command is outstanding.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Stateful egui application for editing meals.
pub struct MealFormApp {
    model: AppModel,
    inbox: Vec<Msg>,
    cmd_tx: crossbeam_channel::Sender<Command>,
    msg_rx: crossbeam_channel::Receiver<Msg>,
}

impl MealFormApp {
    /// Spawn the command workers and wrap the initial model.
    ///
    /// Several workers run at once, so catalog replies may come back out of
    /// order; the ingredient builder drops the ones for outdated queries.
    pub fn new(model: AppModel, services: Services) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().max(2))
            .unwrap_or(2);
        for _ in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let services = services.clone();
            std::thread::spawn(move || {
                for cmd in cmd_rx.iter() {
                    let msg = mvu::run_command(cmd, &services);
                    let _ = msg_tx.send(msg);
                }
            });
        }
        log::debug!("started {threads} command workers");

        let mut inbox = Vec::new();
        if model.can_list_meals() {
            inbox.push(Msg::RefreshMeals);
        }

        Self {
            model,
            inbox,
            cmd_tx,
            msg_rx,
        }
    }
}

impl eframe::App for MealFormApp {
    /// Required by eframe 0.34; all rendering happens in [`Self::update`],
    /// which eframe still invokes every frame before `ui`.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}

    /// Drives a single UI frame: drains worker replies, applies queued messages,
    /// and renders the panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        // Pull messages produced by the command workers.
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push(msg);
        }
        if self.model.ingredients.is_searching() {
            self.inbox
                .push(Msg::Ingredients(IngredientsMsg::Tick(Instant::now())));
        }

        for msg in std::mem::take(&mut self.inbox) {
            let mut commands = Vec::new();
            mvu::update(&mut self.model, msg, &mut commands);
            for cmd in commands {
                if self.cmd_tx.send(cmd).is_ok() {
                    self.model.pending_commands += 1;
                }
            }
        }

        if self.model.pending_commands > 0 || self.model.ingredients.is_searching() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(if !self.model.is_editing() {
                    "New meal"
                } else if self.model.can_save() {
                    "Edit meal"
                } else {
                    "View meal"
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_theme_controls(ui);
                    ui.separator();
                    self.render_file_buttons(ui);
                });
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ctx);
        self.render_delete_confirmation(ctx);

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        if self.model.can_list_meals() {
            egui::SidePanel::left("meal_index")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| {
                    self.render_meal_index(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_name_input(ui);
                ui.add_space(12.0);

                self.render_meta_group(ui);
                ui.add_space(12.0);

                let ing_msgs = ingredients::view(ui, &self.model.ingredients);
                self.inbox.extend(ing_msgs.into_iter().map(Msg::Ingredients));
                ui.add_space(12.0);

                self.render_instructions_input(ui);
                ui.add_space(8.0);
            });
        });
    }
}

impl MealFormApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    fn render_theme_controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(2.0);
        egui::widgets::global_theme_preference_switch(ui);
    }

    /// Buttons laid out right to left: delete, export, save, open, new.
    fn render_file_buttons(&mut self, ui: &mut egui::Ui) {
        let delete = egui::Button::new(format!("{} Delete", regular::TRASH));
        if ui
            .add_enabled(self.model.can_delete(), delete)
            .on_disabled_hover_text("Only the owner of a saved meal can delete it")
            .clicked()
        {
            self.inbox.push(Msg::DeleteRequested);
        }

        let has_name = !self.model.meal_name.trim().is_empty();
        let export = egui::Button::new(format!("{} Export recipe card", regular::FILE_HTML));
        if ui
            .add_enabled(has_name, export)
            .on_disabled_hover_text("Please enter a meal name")
            .clicked()
        {
            let dialog = rfd::FileDialog::new()
                .set_title("Export recipe card")
                .add_filter("HTML page", &["html"])
                .set_file_name(suggested_card_name(&self.model.meal_name));

            if let Some(path) = dialog.save_file() {
                self.inbox
                    .push(Msg::ExportRequested(ensure_extension(path, "html")));
            } else {
                self.inbox.push(Msg::ExportCancelled);
            }
        }

        let save = egui::Button::new(format!("{} Save", regular::FLOPPY_DISK));
        let hint = if !self.model.can_save() {
            "You are not allowed to save this meal"
        } else {
            "Please enter a meal name and add at least one ingredient"
        };
        let save_enabled =
            has_name && !self.model.ingredients.is_empty() && self.model.can_save();
        if ui
            .add_enabled(save_enabled, save)
            .on_disabled_hover_text(hint)
            .clicked()
        {
            self.inbox.push(Msg::SaveRequested);
        }

        if ui
            .button(format!("{} Open…", regular::FOLDER_OPEN))
            .clicked()
        {
            let dialog = rfd::FileDialog::new()
                .set_title("Open meal")
                .add_filter("Meal", &["json"]);
            if let Some(path) = dialog.pick_file() {
                self.inbox.push(Msg::OpenRequested(path));
            } else {
                self.inbox.push(Msg::OpenCancelled);
            }
        }

        if ui.button(format!("{} New", regular::FILE_PLUS)).clicked() {
            self.inbox.push(Msg::NewMeal);
        }
    }

    /// Saved meals with a mine/all filter; edit and delete only on the actor's own meals.
    fn render_meal_index(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.heading("Meals");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(regular::ARROWS_CLOCKWISE)
                    .on_hover_text("Reload meals")
                    .clicked()
                {
                    self.inbox.push(Msg::RefreshMeals);
                }
            });
        });

        ui.horizontal(|ui| {
            for filter in [MealFilter::Mine, MealFilter::All] {
                let button =
                    egui::Button::new(filter.label()).selected(self.model.meal_filter == filter);
                if ui.add(button).clicked() {
                    self.inbox.push(Msg::SetMealFilter(filter));
                }
            }
        });
        ui.separator();

        if self.model.visible_meals().next().is_none() {
            ui.label(
                egui::RichText::new("No meals saved yet.")
                    .italics()
                    .color(egui::Color32::from_gray(110)),
            );
            return;
        }

        egui::ScrollArea::vertical().id_salt("meal_index_scroll").show(ui, |ui| {
            egui::Grid::new("meal_index_grid")
                .num_columns(4)
                .striped(true)
                .spacing(egui::vec2(10.0, 6.0))
                .show(ui, |ui| {
                    ui.strong("Meal");
                    ui.strong("Servings");
                    ui.strong("Timing");
                    ui.label("");
                    ui.end_row();

                    let mut msgs = Vec::new();
                    for meal in self.model.visible_meals() {
                        let current = self.model.meal_id == Some(meal.id);
                        if ui.selectable_label(current, &meal.name).clicked() {
                            msgs.push(Msg::OpenMeal(meal.id));
                        }
                        ui.label(meal.servings.to_string());
                        ui.label(meal.readable_timing());
                        ui.horizontal(|ui| {
                            if ui.button(regular::EYE).on_hover_text("View").clicked() {
                                msgs.push(Msg::OpenMeal(meal.id));
                            }
                            if self.model.owns_with(Permission::MealEdit, meal.owner)
                                && ui.button(regular::PENCIL_SIMPLE).on_hover_text("Edit").clicked()
                            {
                                msgs.push(Msg::OpenMeal(meal.id));
                            }
                            if self.model.owns_with(Permission::MealDelete, meal.owner)
                                && ui.button(regular::TRASH).on_hover_text("Delete").clicked()
                            {
                                msgs.push(Msg::DeleteListedRequested(meal.id));
                            }
                        });
                        ui.end_row();
                    }
                    self.inbox.extend(msgs);
                });
        });
    }

    /// Render the meal name field.
    fn render_name_input(&mut self, ui: &mut egui::Ui) {
        ui.label("Name");
        ui.add_space(4.0);
        let mut name = self.model.meal_name.clone();
        if ui
            .add(egui::TextEdit::singleline(&mut name).hint_text("e.g., Sunday pancakes"))
            .changed()
        {
            self.inbox.push(Msg::MealNameChanged(name));
        }
    }

    /// Grouped servings and timing controls.
    fn render_meta_group(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            egui::Grid::new("meta_grid")
                .num_columns(2)
                .spacing(egui::vec2(8.0, 10.0))
                .min_col_width(140.0)
                .show(ui, |ui| {
                    ui.label("Servings");
                    let mut servings = self.model.servings;
                    if ui
                        .add(egui::DragValue::new(&mut servings).range(1..=100))
                        .changed()
                    {
                        self.inbox.push(Msg::ServingsChanged(servings));
                    }
                    ui.end_row();

                    ui.label("Timing (minutes)");
                    ui.horizontal(|ui| {
                        let mut minutes = self.model.timing_minutes;
                        if ui
                            .add(egui::DragValue::new(&mut minutes).range(0..=24 * 60).speed(5))
                            .changed()
                        {
                            self.inbox.push(Msg::TimingChanged(minutes));
                        }
                        ui.label(
                            egui::RichText::new(crate::models::meal::readable_timing(
                                self.model.timing_minutes,
                            ))
                            .color(egui::Color32::from_gray(110)),
                        );
                    });
                    ui.end_row();
                });
        });
    }

    /// Render the instructions editor and toolbar.
    fn render_instructions_input(&mut self, ui: &mut egui::Ui) {
        ui.label("Instructions");
        ui.label(
            egui::RichText::new("Use Markdown to format text.")
                .small()
                .color(egui::Color32::from_gray(110)),
        );
        ui.add_space(4.0);
        let msgs = instructions::view(&self.model.instructions, ui);
        self.inbox.extend(msgs.into_iter().map(Msg::Instructions));
    }

    /// Render a simple modal window for error messages.
    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.model.error.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push(Msg::DismissError);
                    }
                });
        }
    }

    fn render_delete_confirmation(&mut self, ctx: &egui::Context) {
        let Some(target) = self.model.pending_delete.clone() else {
            return;
        };
        egui::Window::new("Delete meal")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Delete \"{}\"? This cannot be undone.",
                    target.name
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        self.inbox.push(Msg::DeleteConfirmed);
                    }
                    if ui.button("Cancel").clicked() {
                        self.inbox.push(Msg::DeleteCancelled);
                    }
                });
            });
    }

    /// Render latest status message when present.
    fn render_status(&self, ui: &mut egui::Ui) {
        if let Some(text) = &self.model.status {
            let display = if self.model.pending_commands > 0 {
                format!("{}  ({} working…)", text, self.model.pending_commands)
            } else {
                text.to_string()
            };
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(display).color(egui::Color32::from_gray(68)));
                if self.model.pending_commands > 0 {
                    ui.add(egui::Spinner::new().size(14.0)).on_hover_text(format!(
                        "{} task(s) running in background",
                        self.model.pending_commands
                    ));
                }
            });
        }
    }
}
