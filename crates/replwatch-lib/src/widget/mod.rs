//! Widget kinds and the lifecycle they share.
//!
//! Every widget runs the same tick: load from the namespace, reconcile cached
//! coordinate state with what was loaded, then render into a [`Surface`].
//! The kind-specific parts live behind [`WidgetKind`]; [`Widget`] owns the
//! state machine `Bound -> {Active, Paused} -> Closed`.

mod graph;
mod image;
mod images;
mod pane;
mod range;
mod tracker;
mod transform;
mod video;

use crate::config::WatchConfig;
use crate::error::BindResult;
use crate::media::{FrameOpener, PlayerOpener};
use crate::namespace::Namespace;
use crate::session::WidgetSpec;
use crate::surface::{Surface, UiEvent};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub use graph::GraphWidget;
pub use image::ImageWidget;
pub use images::ImageSequenceWidget;
pub use pane::PaneWidget;
pub use range::RangeWidget;
pub use transform::{DropDownWidget, LabelWidget, SliderWidget};
pub use video::VideoWidget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    /// Opened, not ticked yet.
    Bound,
    Active,
    /// Ticks still refresh the display but never write outputs.
    Paused,
    Closed,
}

/// Per-tick inputs that are not the namespace.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub config: &'a WatchConfig,
    pub enabled: bool,
}

pub trait WidgetKind {
    fn kind(&self) -> &'static str;

    fn title(&self) -> String;

    /// Read this tick's values. Transform widgets also write their output here.
    fn load(&mut self, ns: &mut dyn Namespace, ctx: &TickContext) -> BindResult<()>;

    /// Fit cached state (axis plans, frames) to the freshly loaded data.
    fn reconcile(&mut self, _ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, ctx: &TickContext);

    fn on_event(
        &mut self,
        event: &UiEvent,
        ns: &mut dyn Namespace,
        ctx: &TickContext,
    ) -> BindResult<()>;

    fn interval(&self, config: &WatchConfig) -> Duration {
        config.tick_interval()
    }

    /// Whether the widget offers the enable toggle.
    fn connectable(&self) -> bool {
        false
    }
}

/// External collaborators needed while building kinds.
pub struct Openers<'a> {
    pub frames: Option<&'a FrameOpener>,
    pub player: &'a PlayerOpener,
}

/// Construct the kind for `spec`. Kinds that read the namespace at open time
/// (drop-down items, video file) fail here and are never registered.
pub fn build(
    spec: WidgetSpec,
    ns: &dyn Namespace,
    config: &WatchConfig,
    openers: &Openers,
) -> BindResult<Box<dyn WidgetKind>> {
    let kind: Box<dyn WidgetKind> = match spec {
        WidgetSpec::Transform(binding) => Box::new(LabelWidget::new(binding)),
        WidgetSpec::Slider(spec) => Box::new(SliderWidget::new(&spec, config)?),
        WidgetSpec::DropDown(binding) => Box::new(DropDownWidget::open(binding, ns)?),
        WidgetSpec::Graph(spec) => Box::new(GraphWidget::new(spec)),
        WidgetSpec::Image(spec) => Box::new(ImageWidget::new(spec)?),
        WidgetSpec::Pane(spec) => Box::new(PaneWidget::new(spec)),
        WidgetSpec::Range(spec) => Box::new(RangeWidget::new(spec)),
        WidgetSpec::ImageSequence(spec) => {
            Box::new(ImageSequenceWidget::new(spec, openers.frames.cloned())?)
        }
        WidgetSpec::Video(spec) => Box::new(VideoWidget::open(spec, ns, openers.player)?),
    };
    Ok(kind)
}

pub struct Widget {
    id: WidgetId,
    state: WidgetState,
    kind: Box<dyn WidgetKind>,
    status: Option<String>,
}

impl Widget {
    pub fn new(id: WidgetId, kind: Box<dyn WidgetKind>) -> Self {
        Self {
            id,
            state: WidgetState::Bound,
            kind,
            status: None,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn kind(&self) -> &'static str {
        self.kind.kind()
    }

    pub fn title(&self) -> String {
        self.kind.title()
    }

    /// Reason the widget closed, if it did not close normally.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn interval(&self, config: &WatchConfig) -> Duration {
        self.kind.interval(config)
    }

    fn context<'a>(&self, config: &'a WatchConfig) -> TickContext<'a> {
        TickContext {
            config,
            enabled: self.state != WidgetState::Paused,
        }
    }

    pub fn tick(
        &mut self,
        ns: &mut dyn Namespace,
        config: &WatchConfig,
        surface: &mut dyn Surface,
    ) -> BindResult<()> {
        if self.state == WidgetState::Closed {
            return Ok(());
        }
        if self.state == WidgetState::Bound {
            self.state = WidgetState::Active;
        }
        surface.set_title(self.kind.title());
        let ctx = self.context(config);
        self.kind.load(ns, &ctx)?;
        self.kind.reconcile(ns, &ctx)?;
        self.kind.render(surface, &ctx);
        if self.kind.connectable() {
            surface.set_connection(ctx.enabled);
        }
        Ok(())
    }

    pub fn handle(
        &mut self,
        event: &UiEvent,
        ns: &mut dyn Namespace,
        config: &WatchConfig,
    ) -> BindResult<()> {
        if self.state == WidgetState::Closed {
            return Ok(());
        }
        if let UiEvent::ToggleConnection { enabled } = event {
            if self.kind.connectable() {
                self.state = if *enabled {
                    WidgetState::Active
                } else {
                    WidgetState::Paused
                };
            }
            return Ok(());
        }
        let ctx = self.context(config);
        self.kind.on_event(event, ns, &ctx)
    }

    /// Move to `Closed`. Returns `false` when the widget was already closed.
    pub fn close(&mut self, reason: Option<String>) -> bool {
        if self.state == WidgetState::Closed {
            return false;
        }
        self.state = WidgetState::Closed;
        self.status = reason;
        true
    }
}
