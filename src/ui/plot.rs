use chrono::{Datelike, NaiveDate, Timelike};
use eframe::egui::{self, Align2, Color32, FontId, Layout, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{self, ColorMap, INLIER_COLOR, OUTLIER_COLOR};
use crate::data::aggregate::{LabelTotal, WeekdayHourMatrix, WEEKDAY_LABELS};
use crate::data::model::Transaction;
use crate::data::outliers::{FlaggedTransaction, ranked_outliers};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 300.0;

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Plot x coordinate for a calendar day.
fn day_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Plot x coordinate for a timestamp, fractional within the day.
fn timestamp_x(tx: &Transaction) -> f64 {
    day_x(tx.date_only) + tx.date.num_seconds_from_midnight() as f64 / 86_400.0
}

fn format_day(mark: GridMark, _range: &std::ops::RangeInclusive<f64>) -> String {
    NaiveDate::from_num_days_from_ce_opt(mark.value.floor() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn money(v: f64) -> String {
    let sign = if v < 0.0 { "-" } else { "" };
    let cents = (v.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

pub fn kpi_row(ui: &mut Ui, state: &AppState) {
    let kpis = &state.views.kpis;
    ui.columns(3, |cols| {
        kpi_card(&mut cols[0], "Total Amount", money(kpis.total_amount));
        kpi_card(&mut cols[1], "# Transactions", kpis.transaction_count.to_string());
        kpi_card(&mut cols[2], "Average Amount", money(kpis.average_amount));
    });
}

fn kpi_card(ui: &mut Ui, title: &str, value: String) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(title).small());
        ui.label(RichText::new(value).size(22.0).strong());
    });
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

pub fn amount_over_time(ui: &mut Ui, state: &AppState) {
    ui.heading("Amount Over Time");
    let daily = &state.views.daily;
    let points: Vec<[f64; 2]> = daily.iter().map(|d| [day_x(d.date), d.amount]).collect();

    Plot::new("amount_over_time")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Amount")
        .x_axis_formatter(format_day)
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name("Daily total")
                    .width(1.5),
            );
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(2.5));
        });
}

// ---------------------------------------------------------------------------
// Bar breakdowns
// ---------------------------------------------------------------------------

/// Vertical bars, one per label, in the order given.
fn label_bars(ui: &mut Ui, id: &str, totals: &[LabelTotal], colors: Option<&ColorMap>) {
    let labels: Vec<String> = totals.iter().map(|t| t.label.clone()).collect();
    let bars: Vec<Bar> = totals
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let fill = colors.map_or(INLIER_COLOR, |cm| cm.color_for(&t.label));
            Bar::new(i as f64, t.amount)
                .name(&t.label)
                .fill(fill)
                .width(0.7)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label("Amount")
        .x_axis_formatter(move |mark, _range| {
            let v = mark.value;
            if v.fract() != 0.0 || v < 0.0 {
                return String::new();
            }
            labels.get(v as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

pub fn category_breakdown(ui: &mut Ui, state: &AppState) {
    ui.heading("Category Breakdown");
    label_bars(
        ui,
        "category_breakdown",
        &state.views.categories,
        state.category_colors.as_ref(),
    );
}

pub fn top_merchants(ui: &mut Ui, state: &mut AppState) {
    let max = state.max_top_n();
    let mut n = state.effective_top_n();
    ui.horizontal(|ui: &mut Ui| {
        ui.heading(format!("Top {n} Merchants"));
        ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            if ui.add(egui::DragValue::new(&mut n).range(1..=max)).changed() {
                state.set_top_n(n);
            }
            ui.label("Number of top merchants to show");
        });
    });
    label_bars(ui, "top_merchants", &state.views.top_merchants, None);
}

/// Share of the summed amount per payment method, as horizontal bars.
pub fn payment_method_share(ui: &mut Ui, state: &AppState) {
    ui.heading("Payment Method Share");
    let totals = &state.views.payment_methods;
    let sum: f64 = totals.iter().map(|t| t.amount).sum();
    let labels: Vec<String> = totals.iter().map(|t| t.label.clone()).collect();

    let bars: Vec<Bar> = totals
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let share = if sum == 0.0 { 0.0 } else { t.amount / sum * 100.0 };
            let fill = state
                .payment_colors
                .as_ref()
                .map_or(INLIER_COLOR, |cm| cm.color_for(&t.label));
            Bar::new(i as f64, share)
                .name(format!("{} ({share:.1}%)", t.label))
                .fill(fill)
                .width(0.7)
        })
        .collect();

    Plot::new("payment_method_share")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("% of total")
        .y_axis_formatter(move |mark, _range| {
            let v = mark.value;
            if v.fract() != 0.0 || v < 0.0 {
                return String::new();
            }
            labels.get(v as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

// ---------------------------------------------------------------------------
// Weekday × hour heatmap
// ---------------------------------------------------------------------------

pub fn weekday_hour_heatmap(ui: &mut Ui, matrix: &WeekdayHourMatrix) {
    ui.heading("Weekday-Hour Heatmap");

    let label_w = 44.0;
    let header_h = 18.0;
    let cell_h = 28.0;
    let cell_w = ((ui.available_width() - label_w) / 24.0).max(14.0);
    let size = egui::vec2(label_w + cell_w * 24.0, header_h + cell_h * 7.0);
    let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let font = FontId::proportional(11.0);
    let (lo, hi) = matrix.range();

    for hour in 0..24 {
        let x = rect.left() + label_w + cell_w * (hour as f32 + 0.5);
        painter.text(
            egui::pos2(x, rect.top() + header_h / 2.0),
            Align2::CENTER_CENTER,
            hour.to_string(),
            font.clone(),
            text_color,
        );
    }

    for (day, label) in WEEKDAY_LABELS.iter().enumerate() {
        let y = rect.top() + header_h + cell_h * day as f32;
        painter.text(
            egui::pos2(rect.left() + label_w - 6.0, y + cell_h / 2.0),
            Align2::RIGHT_CENTER,
            *label,
            font.clone(),
            text_color,
        );
        for hour in 0..24 {
            let cell = egui::Rect::from_min_size(
                egui::pos2(rect.left() + label_w + cell_w * hour as f32, y),
                egui::vec2(cell_w - 1.0, cell_h - 1.0),
            );
            let value = matrix.get(day, hour);
            painter.rect_filled(cell, 0.0, color::blues(color::normalize(value, lo, hi)));
        }
    }

    if let Some(pos) = response.hover_pos() {
        let col = ((pos.x - rect.left() - label_w) / cell_w).floor();
        let row = ((pos.y - rect.top() - header_h) / cell_h).floor();
        if (0.0..24.0).contains(&col) && (0.0..7.0).contains(&row) {
            let (day, hour) = (row as usize, col as usize);
            response.on_hover_text(format!(
                "{} {:02}:00  {}",
                WEEKDAY_LABELS[day],
                hour,
                money(matrix.get(day, hour))
            ));
        }
    }

    ui.label(RichText::new(format!("Scale: {}  →  {}", money(lo), money(hi))).small());
}

// ---------------------------------------------------------------------------
// Outliers
// ---------------------------------------------------------------------------

pub fn outliers_tab(ui: &mut Ui, state: &mut AppState) {
    let mut threshold = state.outlier.zscore_threshold;
    if ui
        .add(
            egui::Slider::new(&mut threshold, state.threshold_slider_range())
                .step_by(0.1)
                .text("Z-score threshold"),
        )
        .changed()
    {
        state.set_threshold(threshold);
    }

    ui.heading("Outliers by Amount (Z-score)");
    outliers_scatter(ui, &state.views.flagged);

    let ranked = ranked_outliers(&state.views.flagged);
    ui.label(format!("{} flagged transactions", ranked.len()));
    ui.push_id("outlier_table", |ui: &mut Ui| {
        flagged_table(ui, &ranked);
    });
}

fn outliers_scatter(ui: &mut Ui, flagged: &[FlaggedTransaction]) {
    let (outliers, inliers): (Vec<&FlaggedTransaction>, Vec<&FlaggedTransaction>) =
        flagged.iter().partition(|f| f.is_outlier);
    let to_points = |rows: &[&FlaggedTransaction]| {
        let coords: Vec<[f64; 2]> = rows
            .iter()
            .map(|f| [timestamp_x(&f.transaction), f.transaction.amount])
            .collect();
        PlotPoints::from(coords)
    };

    Plot::new("outliers_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label("Amount")
        .x_axis_formatter(format_day)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(to_points(&inliers))
                    .name("Normal")
                    .color(INLIER_COLOR)
                    .radius(2.5),
            );
            plot_ui.points(
                Points::new(to_points(&outliers))
                    .name("Outlier")
                    .color(OUTLIER_COLOR)
                    .radius(4.0),
            );
        });
}

fn flagged_table(ui: &mut Ui, rows: &[&FlaggedTransaction]) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(260.0)
        .cell_layout(Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(70.0))
        .columns(Column::auto().at_least(80.0), 4)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["ID", "Date", "Amount", "Z-score", "Category", "Merchant"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let f = rows[row.index()];
                let t = &f.transaction;
                row.col(|ui| {
                    ui.label(&t.transaction_id);
                });
                row.col(|ui| {
                    ui.label(t.date.format("%Y-%m-%d %H:%M").to_string());
                });
                row.col(|ui| {
                    ui.label(money(t.amount));
                });
                row.col(|ui| {
                    ui.colored_label(OUTLIER_COLOR, format!("{:+.2}", f.zscore));
                });
                row.col(|ui| {
                    ui.label(&t.category);
                });
                row.col(|ui| {
                    ui.label(&t.merchant);
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Raw data
// ---------------------------------------------------------------------------

pub fn raw_table(ui: &mut Ui, state: &AppState) {
    let rows = &state.views.filtered.transactions;
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(70.0), 8)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in [
                "ID",
                "Date",
                "Amount",
                "Category",
                "Merchant",
                "Payment Method",
                "Account Type",
                "Type",
                "Description",
            ] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let t = &rows[row.index()];
                row.col(|ui| {
                    ui.label(&t.transaction_id);
                });
                row.col(|ui| {
                    ui.label(t.date.format("%Y-%m-%d %H:%M").to_string());
                });
                row.col(|ui| {
                    if t.amount < 0.0 {
                        ui.colored_label(Color32::LIGHT_RED, money(t.amount));
                    } else {
                        ui.label(money(t.amount));
                    }
                });
                for text in [
                    &t.category,
                    &t.merchant,
                    &t.payment_method,
                    &t.account_type,
                    &t.transaction_type,
                    &t.description,
                ] {
                    row.col(|ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
