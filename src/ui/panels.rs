use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::LabelColumn;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // The Arc keeps the label lists alive while the state is mutated below.
    let Some(dataset) = state.dataset.as_ref().map(Arc::clone) else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            ui.strong("Date range");
            if let Some(range) = state.selection.date_range {
                let mut start = range.start;
                let mut end = range.end;
                let mut changed = false;
                egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                    ui.label("From");
                    changed |= ui
                        .add(DatePickerButton::new(&mut start).id_salt("date_start"))
                        .changed();
                    ui.end_row();
                    ui.label("To");
                    changed |= ui
                        .add(DatePickerButton::new(&mut end).id_salt("date_end"))
                        .changed();
                    ui.end_row();
                });
                if changed {
                    state.set_date_range(start, end);
                }
            }
            if ui.small_button("Reset filters").clicked() {
                state.reset_filters();
            }
            ui.separator();

            // ---- Per-column label filters (collapsible) ----
            for column in LabelColumn::ALL {
                let n_selected = state.selection.allowed(column).len();
                let n_total = dataset.distinct_count(column);
                let header_text = if n_selected == 0 {
                    format!("{column}  (all {n_total})")
                } else {
                    format!("{column}  ({n_selected}/{n_total})")
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(column.field_name())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            state.clear_column(column);
                        }

                        for value in dataset.values(column) {
                            let mut text = RichText::new(value);
                            let colors = match column {
                                LabelColumn::Category => state.category_colors.as_ref(),
                                LabelColumn::PaymentMethod => state.payment_colors.as_ref(),
                                _ => None,
                            };
                            if let Some(cm) = colors {
                                text = text.color(cm.color_for(value));
                            }

                            let mut checked = state.selection.allowed(column).contains(value);
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_label(column, value);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source_path.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                match state.reload_if_changed() {
                    Ok(true) => log::info!("Reloaded changed file"),
                    Ok(false) => log::info!("File unchanged, nothing to reload"),
                    Err(e) => log::error!("Reload failed: {e:#}"),
                }
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source_path.is_some(), egui::Button::new("Force reload"))
                .clicked()
            {
                if let Err(e) = state.force_reload() {
                    log::error!("Reload failed: {e:#}");
                }
                ui.close_menu();
            }
            if ui
                .add_enabled(state.dataset.is_some(), egui::Button::new("Export summary…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} transactions loaded, {} shown",
                ds.len(),
                state.views.filtered.len()
            ));
            if ds.dropped_rows > 0 {
                ui.separator();
                ui.label(
                    RichText::new(format!("{} rows skipped (bad date or amount)", ds.dropped_rows))
                        .color(Color32::YELLOW),
                );
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open transactions")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        // Failures are logged and shown in the status bar by `open`.
        let _ = state.open(&path);
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export summary")
        .set_file_name("summary.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_summary(&path) {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
