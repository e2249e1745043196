use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    TimeSeries,
    Breakdowns,
    Heatmap,
    Outliers,
    RawData,
}

impl Tab {
    const ALL: [Tab; 5] = [
        Tab::TimeSeries,
        Tab::Breakdowns,
        Tab::Heatmap,
        Tab::Outliers,
        Tab::RawData,
    ];

    fn title(self) -> &'static str {
        match self {
            Tab::TimeSeries => "Time Series",
            Tab::Breakdowns => "Breakdowns",
            Tab::Heatmap => "Heatmap",
            Tab::Outliers => "Outliers",
            Tab::RawData => "Raw Data",
        }
    }
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct LedgerLensApp {
    pub state: AppState,
    pub tab: Tab,
}

impl LedgerLensApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tab: Tab::default(),
        }
    }

    fn dashboard(&mut self, ui: &mut Ui) {
        ui.heading("Financial Transactions Dashboard");
        plot::kpi_row(ui, &self.state);
        ui.add_space(6.0);

        ui.horizontal(|ui: &mut Ui| {
            for tab in Tab::ALL {
                ui.selectable_value(&mut self.tab, tab, tab.title());
            }
        });
        ui.separator();

        if self.state.views.filtered.is_empty() {
            ui.label("No transactions match the current filters.");
        }

        match self.tab {
            Tab::TimeSeries => plot::amount_over_time(ui, &self.state),
            Tab::Breakdowns => {
                ScrollArea::vertical().show(ui, |ui: &mut Ui| {
                    ui.columns(2, |cols| {
                        plot::category_breakdown(&mut cols[0], &self.state);
                        plot::payment_method_share(&mut cols[1], &self.state);
                    });
                    ui.add_space(8.0);
                    plot::top_merchants(ui, &mut self.state);
                });
            }
            Tab::Heatmap => plot::weekday_hour_heatmap(ui, &self.state.views.heatmap),
            Tab::Outliers => {
                ScrollArea::vertical().show(ui, |ui: &mut Ui| {
                    plot::outliers_tab(ui, &mut self.state);
                });
            }
            Tab::RawData => plot::raw_table(ui, &self.state),
        }
    }
}

impl eframe::App for LedgerLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a transactions file to begin  (File → Open…)");
                });
                return;
            }
            self.dashboard(ui);
        });
    }
}
