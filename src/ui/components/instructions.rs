// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Markdown editor for the preparation steps of a meal.

use eframe::egui;
use egui_phosphor::regular;

/// Editor state for the instructions text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstructionsModel {
    /// Raw markdown content.
    pub text: String,
}

/// Snippets the toolbar can append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Snippet {
    /// Next numbered step, continuing the existing numbering.
    Step,
    Bullet,
    Bold,
    Italic,
    /// A quoted tip paragraph.
    Tip,
}

/// Messages emitted by the instructions view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstructionsMsg {
    SetText(String),
    Append(Snippet),
}

/// Update the instructions model in response to a message.
pub fn update(model: &mut InstructionsModel, msg: InstructionsMsg) {
    match msg {
        InstructionsMsg::SetText(text) => model.text = text,
        InstructionsMsg::Append(snippet) => append_snippet(model, snippet),
    }
}

/// Render the toolbar and text area, emitting messages instead of mutating state directly.
pub fn view(model: &InstructionsModel, ui: &mut egui::Ui) -> Vec<InstructionsMsg> {
    let mut msgs = Vec::new();

    ui.vertical(|ui| {
        ui.horizontal(|ui| {
            let buttons = [
                (regular::LIST_NUMBERS, "Add step", Snippet::Step),
                (regular::LIST_DASHES, "Bulleted item", Snippet::Bullet),
                (regular::TEXT_BOLDER, "Bold", Snippet::Bold),
                (regular::TEXT_ITALIC, "Italic", Snippet::Italic),
                (regular::LIGHTBULB, "Tip", Snippet::Tip),
            ];
            for (icon, hover, snippet) in buttons {
                if ui.button(icon).on_hover_text(hover).clicked() {
                    msgs.push(InstructionsMsg::Append(snippet));
                }
            }
        });

        ui.add_space(4.0);

        let mut buffer = model.text.clone();
        ui.add(
            egui::TextEdit::multiline(&mut buffer)
                .hint_text("1. Preheat the oven to 200 °C")
                .desired_width(f32::INFINITY)
                .desired_rows(8),
        );
        if buffer != model.text {
            msgs.push(InstructionsMsg::SetText(buffer));
        }
    });

    msgs
}

/// Append a snippet on its own line (inline styles stay on the current line).
fn append_snippet(model: &mut InstructionsModel, snippet: Snippet) {
    let text = match snippet {
        Snippet::Step => format!("{}. ", next_step_number(&model.text)),
        Snippet::Bullet => "- ".to_string(),
        Snippet::Bold => "**bold text**".to_string(),
        Snippet::Italic => "*italic text*".to_string(),
        Snippet::Tip => "> Tip: ".to_string(),
    };

    let block = matches!(snippet, Snippet::Step | Snippet::Bullet | Snippet::Tip);
    if block && !model.text.is_empty() && !model.text.ends_with('\n') {
        model.text.push('\n');
    }
    model.text.push_str(&text);
}

/// One past the highest `N.` prefix found at the start of a line.
fn next_step_number(text: &str) -> u32 {
    text.lines()
        .filter_map(|line| {
            let (number, _) = line.trim_start().split_once(". ")?;
            number.parse::<u32>().ok()
        })
        .max()
        .map_or(1, |n| n + 1)
}
