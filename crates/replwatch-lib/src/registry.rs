//! The collection of open widgets, driven by the host's event loop.

use crate::config::WatchConfig;
use crate::error::{BindError, BindResult};
use crate::media::{ClockPlayer, FrameOpener, PlayerOpener};
use crate::namespace::Namespace;
use crate::session::WidgetSpec;
use crate::surface::{UiEvent, View};
use crate::widget::{build, Openers, Widget, WidgetId, WidgetState};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::time::Instant;

struct Entry {
    widget: Widget,
    view: View,
    next_due: Instant,
}

/// A widget removed because of a fatal binding error.
#[derive(Debug, Clone)]
pub struct ClosedWidget {
    pub id: WidgetId,
    pub kind: &'static str,
    pub reason: String,
}

/// A user transform that raised; the widget is still open.
#[derive(Debug)]
pub struct TransformFailure {
    pub id: WidgetId,
    pub error: BindError,
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub ticked: Vec<WidgetId>,
    pub closed: Vec<ClosedWidget>,
    pub failures: Vec<TransformFailure>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.closed.is_empty() && self.failures.is_empty()
    }

    fn merge(&mut self, other: TickReport) {
        self.ticked.extend(other.ticked);
        self.closed.extend(other.closed);
        self.failures.extend(other.failures);
    }
}

pub struct Registry {
    config: WatchConfig,
    entries: BTreeMap<WidgetId, Entry>,
    next_id: u64,
    frame_opener: Option<FrameOpener>,
    player_opener: PlayerOpener,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(WatchConfig::default())
    }
}

impl Registry {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
            next_id: 1,
            frame_opener: None,
            player_opener: ClockPlayer::opener(),
        }
    }

    /// Install the decoder used by image sequences bound to a video file.
    pub fn with_frame_opener(mut self, opener: FrameOpener) -> Self {
        self.frame_opener = Some(opener);
        self
    }

    pub fn with_player_opener(mut self, opener: PlayerOpener) -> Self {
        self.player_opener = opener;
        self
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<WidgetId> {
        self.entries.keys().copied().collect()
    }

    pub fn is_open(&self, id: WidgetId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn view(&self, id: WidgetId) -> Option<&View> {
        self.entries.get(&id).map(|entry| &entry.view)
    }

    pub fn state(&self, id: WidgetId) -> Option<WidgetState> {
        self.entries.get(&id).map(|entry| entry.widget.state())
    }

    pub fn kind(&self, id: WidgetId) -> Option<&'static str> {
        self.entries.get(&id).map(|entry| entry.widget.kind())
    }

    /// Open a widget. Configuration errors and failed open-time reads are
    /// returned here and nothing is registered.
    pub fn open(&mut self, spec: WidgetSpec, ns: &dyn Namespace) -> BindResult<WidgetId> {
        let kind_name = spec.kind_name();
        let openers = Openers {
            frames: self.frame_opener.as_ref(),
            player: &self.player_opener,
        };
        let kind = build(spec, ns, &self.config, &openers).inspect_err(|err| {
            warn!("could not open {kind_name} widget: {err}");
        })?;
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        let widget = Widget::new(id, kind);
        info!("opened {kind_name} widget {id}: {}", widget.title());
        self.entries.insert(
            id,
            Entry {
                widget,
                view: View::default(),
                next_due: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Close a widget on request of the host. Returns `false` when it was not
    /// open.
    pub fn close(&mut self, id: WidgetId) -> bool {
        match self.entries.remove(&id) {
            Some(mut entry) => {
                entry.widget.close(None);
                info!("closed {} widget {id}", entry.widget.kind());
                true
            }
            None => false,
        }
    }

    /// Route the outcome of one widget operation: fatal errors remove the
    /// widget, transform errors are handed back.
    fn settle(&mut self, id: WidgetId, result: BindResult<()>, report: &mut TickReport) {
        let Err(err) = result else {
            return;
        };
        if !err.is_fatal() {
            warn!("widget {id}: {err}");
            report.failures.push(TransformFailure { id, error: err });
            return;
        }
        if let Some(mut entry) = self.entries.remove(&id) {
            let reason = err.to_string();
            error!("{reason}");
            if entry.widget.close(Some(reason.clone())) {
                report.closed.push(ClosedWidget {
                    id,
                    kind: entry.widget.kind(),
                    reason,
                });
            }
        }
    }

    /// Tick one widget regardless of its deadline.
    pub fn tick(&mut self, id: WidgetId, ns: &mut dyn Namespace) -> TickReport {
        let mut report = TickReport::default();
        let Some(entry) = self.entries.get_mut(&id) else {
            return report;
        };
        let result = entry.widget.tick(ns, &self.config, &mut entry.view);
        entry.next_due = Instant::now() + entry.widget.interval(&self.config);
        report.ticked.push(id);
        self.settle(id, result, &mut report);
        report
    }

    /// Tick every open widget once, in id order.
    pub fn tick_all(&mut self, ns: &mut dyn Namespace) -> TickReport {
        let mut report = TickReport::default();
        for id in self.ids() {
            report.merge(self.tick(id, ns));
        }
        report
    }

    /// Tick the widgets whose interval has elapsed at `now`.
    pub fn tick_due(&mut self, now: Instant, ns: &mut dyn Namespace) -> TickReport {
        let mut report = TickReport::default();
        let due: Vec<WidgetId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.next_due <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in due {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            let result = entry.widget.tick(ns, &self.config, &mut entry.view);
            entry.next_due = now + entry.widget.interval(&self.config);
            report.ticked.push(id);
            self.settle(id, result, &mut report);
        }
        report
    }

    /// Earliest instant at which some widget wants its next tick.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|entry| entry.next_due).min()
    }

    /// Deliver a user interaction to one widget.
    pub fn dispatch(&mut self, id: WidgetId, event: &UiEvent, ns: &mut dyn Namespace) -> TickReport {
        let mut report = TickReport::default();
        let Some(entry) = self.entries.get_mut(&id) else {
            warn!("dropping {event:?} for widget {id}: not open");
            return report;
        };
        let result = entry.widget.handle(event, ns, &self.config);
        self.settle(id, result, &mut report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::MapNamespace;
    use crate::value::Value;
    use std::time::Duration;

    #[test]
    fn ids_are_unique_and_increasing() {
        let ns = MapNamespace::new();
        let mut registry = Registry::default();
        let a = registry.open(WidgetSpec::graph("a", None), &ns).unwrap();
        let b = registry.open(WidgetSpec::graph("b", None), &ns).unwrap();
        assert!(b > a);
        assert_eq!(registry.ids(), vec![a, b]);
    }

    #[test]
    fn config_errors_register_nothing() {
        let ns = MapNamespace::new();
        let mut registry = Registry::default();
        let mut spec = WidgetSpec::image("img");
        if let WidgetSpec::Image(image) = &mut spec {
            image.colormap = Some("sepia".into());
        }
        assert!(matches!(registry.open(spec, &ns), Err(BindError::Config(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn fatal_errors_close_once() {
        let mut ns = MapNamespace::new();
        let mut registry = Registry::default();
        let id = registry.open(WidgetSpec::graph("gone", None), &ns).unwrap();
        let report = registry.tick_all(&mut ns);
        assert_eq!(report.closed.len(), 1);
        assert_eq!(report.closed[0].reason, "Variable gone not defined in the namespace");
        assert!(!registry.is_open(id));
        assert!(registry.tick_all(&mut ns).closed.is_empty());
        assert!(!registry.close(id));
    }

    #[test]
    fn transform_errors_keep_the_widget() {
        let mut ns = MapNamespace::new().with("x", "text");
        crate::transform::install_builtins(&mut ns);
        let mut registry = Registry::default();
        let id = registry
            .open(WidgetSpec::transform("x", Some("negate"), "y"), &ns)
            .unwrap();
        let report = registry.tick_all(&mut ns);
        assert_eq!(report.failures.len(), 1);
        assert!(registry.is_open(id));
        assert!(ns.get("y").is_none());
    }

    #[test]
    fn tick_due_respects_intervals() {
        let mut ns = MapNamespace::new().with("x", 1);
        let mut registry = Registry::new(WatchConfig {
            tick_interval_ms: 100,
            ..WatchConfig::default()
        });
        let id = registry.open(WidgetSpec::transform("x", None, "y"), &ns).unwrap();
        let start = Instant::now();
        assert_eq!(registry.tick_due(start, &mut ns).ticked, vec![id]);
        assert!(registry.tick_due(start + Duration::from_millis(10), &mut ns).ticked.is_empty());
        assert_eq!(registry.next_deadline(), Some(start + Duration::from_millis(100)));
        ns.set("x", Value::Int(2));
        registry.tick_due(start + Duration::from_millis(100), &mut ns);
        assert_eq!(ns.get("y"), Some(&Value::Int(2)));
    }
}
