use eframe::{egui, egui::ViewportBuilder};
use env_logger::Env;
use log::{info, warn};
use replwatch_lib::classify::input_label;
use replwatch_lib::transform::install_builtins;
use replwatch_lib::{MapNamespace, Registry, Session, TickReport, WidgetId};
use rfd::FileDialog;
use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod console;
mod panels;

use panels::PanelState;

const IDLE_REPAINT: Duration = Duration::from_millis(250);

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let mut app = WatchApp::default();
    // Optional positional arguments: a namespace JSON, then a session TOML.
    let mut args = env::args().skip(1).map(PathBuf::from);
    if let Some(path) = args.next() {
        app.load_namespace(&path);
    }
    if let Some(path) = args.next() {
        app.load_session(&path);
    }

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default().with_inner_size([1100.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "replwatch",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}

struct WatchApp {
    ns: MapNamespace,
    registry: Registry,
    panels: PanelState,
    console: String,
    history: Vec<String>,
    status: String,
}

impl Default for WatchApp {
    fn default() -> Self {
        let mut ns = MapNamespace::new();
        install_builtins(&mut ns);
        Self {
            ns,
            registry: Registry::default(),
            panels: PanelState::default(),
            console: String::new(),
            history: Vec::new(),
            status: "Empty namespace".into(),
        }
    }
}

impl WatchApp {
    fn load_namespace(&mut self, path: &Path) {
        match MapNamespace::read_json(path) {
            Ok(loaded) => {
                let count = loaded.len();
                self.ns.extend(loaded);
                self.status = format!("Loaded {count} variables from {}", path.display());
            }
            Err(err) => self.status = format!("{err:#}"),
        }
    }

    fn save_namespace(&mut self, path: &Path) {
        self.status = match self.ns.without_functions().write_json(path) {
            Ok(()) => format!("Saved namespace to {}", path.display()),
            Err(err) => format!("{err:#}"),
        };
    }

    fn load_session(&mut self, path: &Path) {
        let session = match Session::read(path) {
            Ok(session) => session,
            Err(err) => {
                self.status = format!("{err:#}");
                return;
            }
        };
        if self.registry.is_empty() {
            self.registry = Registry::new(session.config.clone());
        } else if self.registry.config() != &session.config {
            warn!("widgets already open; ignoring [config] from {}", path.display());
        }
        if !session.events.is_empty() {
            info!("{} scripted events ignored in the viewer", session.events.len());
        }
        let mut opened = 0;
        for spec in session.widgets {
            let kind = spec.kind_name();
            match self.registry.open(spec, &self.ns) {
                Ok(_) => opened += 1,
                Err(err) => self.status = format!("Could not open {kind}: {err}"),
            }
        }
        info!("opened {opened} widgets from {}", path.display());
        if opened > 0 {
            self.status = format!("Opened {opened} widgets from {}", path.display());
        }
    }

    fn run_console(&mut self) {
        let line = self.console.trim().to_string();
        if line.is_empty() {
            return;
        }
        let result = console::parse(&line).and_then(|cmd| console::apply(&mut self.ns, cmd));
        match result {
            Ok(message) => {
                self.history.push(format!(">>> {line}"));
                self.status = message;
                self.console.clear();
            }
            Err(err) => self.status = format!("{err:#}"),
        }
    }

    fn absorb(&mut self, report: TickReport) {
        for closed in &report.closed {
            self.panels.forget(closed.id);
            self.status = format!("{} {} closed: {}", closed.kind, closed.id, closed.reason);
        }
        if let Some(failure) = report.failures.last() {
            self.status = format!("{}: {}", failure.id, failure.error);
        }
    }

    fn show_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("variables").show(ctx, |ui| {
            ui.heading("Namespace");
            ui.horizontal(|ui| {
                if ui.button("Load namespace").clicked() {
                    if let Some(path) = FileDialog::new().add_filter("JSON", &["json"]).pick_file() {
                        self.load_namespace(&path);
                    }
                }
                if ui.button("Save").clicked() {
                    if let Some(path) = FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .set_file_name("namespace.json")
                        .save_file()
                    {
                        self.save_namespace(&path);
                    }
                }
            });
            if ui.button("Open session").clicked() {
                if let Some(path) = FileDialog::new().add_filter("TOML", &["toml"]).pick_file() {
                    self.load_session(&path);
                }
            }
            ui.separator();
            let max_len = self.registry.config().inline_value_max_len;
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (name, value) in self.ns.iter() {
                    if value.as_function().is_some() {
                        continue;
                    }
                    ui.monospace(input_label(name, value, max_len))
                        .on_hover_text(value.type_name());
                }
            });
        });
    }

    fn show_console(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("console").show(ctx, |ui| {
            for line in self.history.iter().rev().take(4).rev() {
                ui.monospace(line);
            }
            ui.horizontal(|ui| {
                ui.monospace(">>>");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.console)
                        .hint_text("name = <json>   |   del name")
                        .desired_width(f32::INFINITY),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.run_console();
                    response.request_focus();
                }
            });
            ui.label(format!("Status: {}", self.status));
        });
    }

    fn show_windows(&mut self, ctx: &egui::Context) {
        for id in self.registry.ids() {
            let (Some(view), Some(kind)) = (self.registry.view(id), self.registry.kind(id)) else {
                continue;
            };
            let mut open = true;
            let mut events = Vec::new();
            let title = if view.title.is_empty() {
                kind.to_string()
            } else {
                view.title.clone()
            };
            egui::Window::new(title)
                .id(window_id(id))
                .open(&mut open)
                .show(ctx, |ui| {
                    events = panels::show_view(ui, id, kind, view, &mut self.panels);
                });
            for event in events {
                let report = self.registry.dispatch(id, &event, &mut self.ns);
                self.absorb(report);
            }
            if !open && self.registry.close(id) {
                self.panels.forget(id);
                self.status = format!("Closed {kind} {id}");
            }
        }
    }
}

fn window_id(id: WidgetId) -> egui::Id {
    egui::Id::new(("widget", id.0))
}

impl eframe::App for WatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let report = self.registry.tick_due(now, &mut self.ns);
        self.absorb(report);

        self.show_side_panel(ctx);
        self.show_console(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.registry.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label("Open a session to watch namespace variables.");
                });
            }
        });
        self.show_windows(ctx);

        let wait = self
            .registry
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_REPAINT);
        ctx.request_repaint_after(wait.min(IDLE_REPAINT));
    }
}
