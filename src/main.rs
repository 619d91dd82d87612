//! Health challenge tracker: desktop app entry point and persistent settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::{Column, TableBuilder};
use log::info;
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

mod analysis;
use analysis::{format_added_message, user_summaries};
mod controller;
use controller::ViewController;
mod export;
use export::{save_entries_csv, save_entries_json, save_summaries_csv, save_summaries_json};
mod plotting;
use plotting::PlotChart;
mod report;
mod store;
use store::{EntryStore, JsonFileStorage, KeyValueStorage, MemoryStorage};
mod workout;
use workout::{ALL_PAGE_SIZES, ALL_WORKOUT_TYPES, PageSize, WorkoutType};

#[cfg(test)]
pub(crate) static ENV_MUTEX: once_cell::sync::Lazy<std::sync::Mutex<()>> =
    once_cell::sync::Lazy::new(|| std::sync::Mutex::new(()));

const TOAST_DURATION: Duration = Duration::from_secs(3);

fn default_chart_height() -> f32 {
    300.0
}

/// Persistent user preferences.
///
/// Stored as JSON in the platform config directory. Every field has a
/// `#[serde(default)]` so older files keep loading when fields are added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    #[serde(default)]
    page_size: PageSize,
    /// User whose chart is shown on startup, if they still have entries.
    #[serde(default)]
    selected_user: Option<String>,
    /// Overrides the platform data directory. Takes effect on restart.
    #[serde(default)]
    data_dir: Option<String>,
    #[serde(default = "default_chart_height")]
    chart_height: f32,
    #[serde(default)]
    open_report_after_export: bool,
}

impl Settings {
    const FILE: &'static str = "health_tracker_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid settings file: {e}"),
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match serde_json::to_string_pretty(self) {
                Ok(data) => {
                    if let Err(e) = std::fs::write(&path, data) {
                        log::error!("Failed to save settings: {e}");
                    }
                }
                Err(e) => log::error!("Failed to serialize settings: {e}"),
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: PageSize::Five,
            selected_user: None,
            data_dir: None,
            chart_height: default_chart_height(),
            open_report_after_export: false,
        }
    }
}

fn open_storage(settings: &Settings) -> Box<dyn KeyValueStorage> {
    match store::resolve_data_dir(settings.data_dir.as_deref()) {
        Ok(dir) => {
            let storage = JsonFileStorage::new(dir);
            info!("Storing workouts in {}", storage.dir().display());
            Box::new(storage)
        }
        Err(e) => {
            log::warn!("{e}; workouts will not be saved");
            Box::new(MemoryStorage::default())
        }
    }
}

struct TrackerApp {
    controller: ViewController<Box<dyn KeyValueStorage>, PlotChart>,
    settings: Settings,
    settings_dirty: bool,
    show_settings: bool,
    status: Option<String>,
    toast_start: Option<Instant>,
}

impl Default for TrackerApp {
    fn default() -> Self {
        let settings = Settings::load();
        let store = EntryStore::load(open_storage(&settings));
        let mut controller = ViewController::new(store, PlotChart::default(), settings.page_size);
        if let Some(user) = settings.selected_user.as_deref() {
            if controller.unique_users().iter().any(|u| u == user) {
                controller.select_user(user);
            }
        }
        Self {
            controller,
            settings,
            settings_dirty: false,
            show_settings: false,
            status: None,
            toast_start: None,
        }
    }
}

impl TrackerApp {
    fn notify(&mut self, message: String) {
        info!("{message}");
        self.status = Some(message);
        self.toast_start = Some(Instant::now());
    }

    fn select_user(&mut self, user: &str) {
        self.controller.select_user(user);
        self.settings.selected_user = Some(user.to_owned());
        self.settings_dirty = true;
    }

    fn submit(&mut self) {
        if let Some(entry) = self.controller.submit() {
            self.settings.selected_user = Some(entry.user_name.clone());
            self.settings_dirty = true;
            self.notify(format_added_message(&entry));
        }
    }

    fn export_entries(&mut self, filtered_only: bool, json: bool) {
        let (label, ext) = if json { ("JSON", "json") } else { ("CSV", "csv") };
        let Some(path) = FileDialog::new().add_filter(label, &[ext]).save_file() else {
            return;
        };
        let entries: Vec<&workout::WorkoutEntry> = if filtered_only {
            self.controller.filtered_entries()
        } else {
            self.controller.entries().iter().collect()
        };
        let count = entries.len();
        let result = if json {
            save_entries_json(&path, &entries).map_err(|e| e.to_string())
        } else {
            save_entries_csv(&path, &entries).map_err(|e| e.to_string())
        };
        match result {
            Ok(()) => self.notify(format!("Exported {count} entries to {}", path.display())),
            Err(e) => log::error!("Failed to export entries: {e}"),
        }
    }

    fn export_summaries(&mut self, json: bool) {
        let (label, ext) = if json { ("JSON", "json") } else { ("CSV", "csv") };
        let Some(path) = FileDialog::new().add_filter(label, &[ext]).save_file() else {
            return;
        };
        let rows = user_summaries(self.controller.entries());
        let result = if json {
            save_summaries_json(&path, &rows).map_err(|e| e.to_string())
        } else {
            save_summaries_csv(&path, &rows).map_err(|e| e.to_string())
        };
        match result {
            Ok(()) => self.notify(format!("Exported {} users to {}", rows.len(), path.display())),
            Err(e) => log::error!("Failed to export user summary: {e}"),
        }
    }

    fn export_report(&mut self) {
        let Some(path) = FileDialog::new().add_filter("HTML", &["html"]).save_file() else {
            return;
        };
        let rows = user_summaries(self.controller.entries());
        let chart = self.controller.chart().current();
        if let Err(e) = report::export_html_report(&path, &rows, chart) {
            log::error!("Failed to export report: {e}");
            return;
        }
        self.notify(format!("Saved report to {}", path.display()));
        if self.settings.open_report_after_export {
            if let Err(e) = open::that(&path) {
                log::error!("Failed to open report: {e}");
            }
        }
    }

    fn form_ui(&mut self, ui: &mut egui::Ui) {
        let form = &mut self.controller.form;
        egui::Grid::new("workout_form")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label("User Name");
                ui.text_edit_singleline(&mut form.user_name);
                ui.end_row();

                ui.label("Workout Type");
                egui::ComboBox::from_id_source("form_workout_type")
                    .selected_text(
                        form.workout_type
                            .map(WorkoutType::label)
                            .unwrap_or("Select a workout type"),
                    )
                    .show_ui(ui, |ui| {
                        for t in ALL_WORKOUT_TYPES {
                            ui.selectable_value(&mut form.workout_type, Some(t), t.label());
                        }
                    });
                ui.end_row();

                ui.label("Workout Minutes");
                ui.text_edit_singleline(&mut form.workout_minutes);
                ui.end_row();
            });
        let valid = self.controller.form.is_valid();
        if ui
            .add_enabled(valid, egui::Button::new("Add Workout"))
            .clicked()
        {
            self.submit();
        }
    }

    fn filters_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut search = self.controller.search_term().to_owned();
            if ui
                .add(egui::TextEdit::singleline(&mut search).hint_text("Search by name"))
                .changed()
            {
                self.controller.set_search_term(search);
            }

            let mut filter = self.controller.filter_type();
            egui::ComboBox::from_id_source("filter_workout_type")
                .selected_text(filter.map(WorkoutType::label).unwrap_or("All Workout Types"))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filter, None, "All Workout Types");
                    for t in ALL_WORKOUT_TYPES {
                        ui.selectable_value(&mut filter, Some(t), t.label());
                    }
                });
            if filter != self.controller.filter_type() {
                self.controller.set_filter_type(filter);
            }
        });
    }

    fn table_ui(&mut self, ui: &mut egui::Ui) {
        let rows: Vec<(String, WorkoutType, usize, u64)> = self
            .controller
            .page_entries()
            .into_iter()
            .map(|e| {
                (
                    e.user_name.clone(),
                    e.workout_type,
                    self.controller.count_for_user(&e.user_name),
                    self.controller.total_minutes_for_user(&e.user_name),
                )
            })
            .collect();

        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(160.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(160.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["Name", "Workouts", "Number of Workouts", "Total Workout Minutes"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (name, kind, count, minutes) in &rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(name);
                        });
                        row.col(|ui| {
                            ui.label(kind.label());
                        });
                        row.col(|ui| {
                            ui.label(count.to_string());
                        });
                        row.col(|ui| {
                            ui.label(minutes.to_string());
                        });
                    });
                }
            });
    }

    fn pagination_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.controller.can_go_prev(), egui::Button::new("<"))
                .clicked()
            {
                self.controller.change_page(-1);
            }
            ui.label(format!(
                "Page {} of {}",
                self.controller.current_page(),
                self.controller.total_pages()
            ));
            if ui
                .add_enabled(self.controller.can_go_next(), egui::Button::new(">"))
                .clicked()
            {
                self.controller.change_page(1);
            }

            let mut size = self.controller.page_size();
            egui::ComboBox::from_id_source("page_size")
                .selected_text(format!("{} per page", size.get()))
                .show_ui(ui, |ui| {
                    for p in ALL_PAGE_SIZES {
                        ui.selectable_value(&mut size, p, format!("{} per page", p.get()));
                    }
                });
            if size != self.controller.page_size() {
                self.controller.set_page_size(size);
                self.settings.page_size = size;
                self.settings_dirty = true;
            }
        });
    }

    fn users_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Users");
        egui::ScrollArea::vertical().show(ui, |ui| {
            for user in self.controller.unique_users() {
                let selected = self.controller.selected_user() == Some(user.as_str());
                if ui.selectable_label(selected, &user).clicked() {
                    self.select_user(&user);
                }
            }
        });
    }

    fn settings_ui(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        egui::Window::new("Settings")
            .open(&mut open)
            .show(ctx, |ui| {
                let mut data_dir = self.settings.data_dir.clone().unwrap_or_default();
                ui.horizontal(|ui| {
                    ui.label("Data directory:");
                    if ui.text_edit_singleline(&mut data_dir).changed() {
                        self.settings.data_dir = if data_dir.trim().is_empty() {
                            None
                        } else {
                            Some(data_dir.clone())
                        };
                        self.settings_dirty = true;
                    }
                });
                ui.label("Changes to the data directory apply after a restart.");
                if ui
                    .add(
                        egui::Slider::new(&mut self.settings.chart_height, 150.0..=600.0)
                            .text("Chart height"),
                    )
                    .changed()
                {
                    self.settings_dirty = true;
                }
                if ui
                    .checkbox(
                        &mut self.settings.open_report_after_export,
                        "Open report after export",
                    )
                    .changed()
                {
                    self.settings_dirty = true;
                }
            });
        self.show_settings = open;
    }
}

impl App for TrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export Entries (CSV)").clicked() {
                        self.export_entries(false, false);
                        ui.close_menu();
                    }
                    if ui.button("Export Entries (JSON)").clicked() {
                        self.export_entries(false, true);
                        ui.close_menu();
                    }
                    if ui.button("Export Filtered Entries (CSV)").clicked() {
                        self.export_entries(true, false);
                        ui.close_menu();
                    }
                    if ui.button("Export Filtered Entries (JSON)").clicked() {
                        self.export_entries(true, true);
                        ui.close_menu();
                    }
                    if ui.button("Export User Summary (CSV)").clicked() {
                        self.export_summaries(false);
                        ui.close_menu();
                    }
                    if ui.button("Export User Summary (JSON)").clicked() {
                        self.export_summaries(true);
                        ui.close_menu();
                    }
                    if ui.button("Export Report (HTML)").clicked() {
                        self.export_report();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                        ui.close_menu();
                    }
                });
            });
        });

        if let Some(start) = self.toast_start {
            if start.elapsed() < TOAST_DURATION {
                if let Some(msg) = &self.status {
                    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                        ui.label(msg);
                    });
                }
                ctx.request_repaint_after(Duration::from_millis(200));
            } else {
                self.toast_start = None;
            }
        }

        egui::SidePanel::left("users_panel")
            .resizable(true)
            .default_width(180.0)
            .show(ctx, |ui| self.users_ui(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Health Challenge Tracker");
                self.form_ui(ui);
                ui.separator();

                ui.heading("Workout Entries");
                self.filters_ui(ui);
                self.table_ui(ui);
                self.pagination_ui(ui);

                if let Some(user) = self.controller.selected_user() {
                    ui.separator();
                    ui.heading(format!("{user}'s workout progress"));
                    self.controller.chart().show(ui, self.settings.chart_height);
                }
            });
        });

        if self.show_settings {
            self.settings_ui(ctx);
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Health Challenge Tracker",
        options,
        Box::new(|_cc| Box::new(TrackerApp::default())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::ffi::OsString;

    struct EnvGuard {
        saved: Vec<(&'static str, Option<OsString>)>,
    }

    impl EnvGuard {
        fn set(vars: &[(&'static str, &std::path::Path)]) -> Self {
            let mut saved = Vec::new();
            for (key, value) in vars {
                saved.push((*key, env::var_os(key)));
                unsafe {
                    env::set_var(key, value);
                }
            }
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                unsafe {
                    match value {
                        Some(v) => env::set_var(key, v),
                        None => env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn settings_roundtrip() {
        let s = Settings {
            page_size: PageSize::Twenty,
            selected_user: Some("Jane Smith".into()),
            data_dir: Some("/tmp/workouts".into()),
            chart_height: 420.0,
            open_report_after_export: true,
        };
        let json = serde_json::to_string(&s).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, loaded);
    }

    #[test]
    fn missing_settings_fields_use_defaults() {
        let loaded: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn settings_persist_in_config_dir() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let _env = EnvGuard::set(&[("XDG_CONFIG_HOME", dir.path())]);

        let mut s = Settings::default();
        s.page_size = PageSize::Ten;
        s.save();
        assert_eq!(Settings::load().page_size, PageSize::Ten);

        std::fs::write(Settings::path().unwrap(), "not json").unwrap();
        assert_eq!(Settings::load(), Settings::default());
    }

    #[test]
    fn app_starts_with_seed_data_and_restores_selection() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let config = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let _env = EnvGuard::set(&[
            ("XDG_CONFIG_HOME", config.path()),
            ("HEALTH_TRACKER_DATA_DIR", data.path()),
        ]);

        let mut s = Settings::default();
        s.selected_user = Some("Jane Smith".into());
        s.page_size = PageSize::Ten;
        s.save();

        let app = TrackerApp::default();
        assert_eq!(app.controller.entries().len(), 6);
        assert_eq!(app.controller.total_pages(), 1);
        assert_eq!(app.controller.selected_user(), Some("Jane Smith"));
        let chart = app.controller.chart().current().expect("chart rendered");
        assert_eq!(chart.labels, vec!["Swimming", "Running"]);
        assert!(data.path().join("workoutEntries.json").exists());
    }

    #[test]
    fn submit_through_app_remembers_user() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let config = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let _env = EnvGuard::set(&[
            ("XDG_CONFIG_HOME", config.path()),
            ("HEALTH_TRACKER_DATA_DIR", data.path()),
        ]);

        let mut app = TrackerApp::default();
        assert!(app.controller.selected_user().is_none());
        app.controller.form.user_name = "Ann".into();
        app.controller.form.workout_type = Some(WorkoutType::Swimming);
        app.controller.form.workout_minutes = "35".into();
        app.submit();

        assert_eq!(app.settings.selected_user.as_deref(), Some("Ann"));
        assert!(app.settings_dirty);
        assert_eq!(
            app.status.as_deref(),
            Some("Added 35 min of Swimming for Ann")
        );

        let reloaded = TrackerApp::default();
        assert_eq!(reloaded.controller.entries().len(), 7);
    }

    #[test]
    fn stale_selected_user_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let config = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let _env = EnvGuard::set(&[
            ("XDG_CONFIG_HOME", config.path()),
            ("HEALTH_TRACKER_DATA_DIR", data.path()),
        ]);

        let mut s = Settings::default();
        s.selected_user = Some("Gone".into());
        s.save();

        let app = TrackerApp::default();
        assert!(app.controller.selected_user().is_none());
        assert!(app.controller.chart().current().is_none());
    }
}
