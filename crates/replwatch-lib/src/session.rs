//! Widget entry points and the TOML session files that list them.

use crate::config::WatchConfig;
use crate::surface::UiEvent;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Names linking a transform widget to the namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub input: String,
    #[serde(default)]
    pub function: Option<String>,
    /// Variable holding extra positional arguments for `function`.
    #[serde(default)]
    pub args: Option<String>,
    pub output: String,
}

impl Binding {
    pub fn new(input: &str, function: Option<&str>, output: &str) -> Self {
        Self {
            input: input.to_string(),
            function: function.map(str::to_string),
            args: None,
            output: output.to_string(),
        }
    }

    pub fn with_args(mut self, args: &str) -> Self {
        self.args = Some(args.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderSpec {
    pub input: String,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub args: Option<String>,
    pub output: String,
    #[serde(default)]
    pub limits: Option<[i64; 2]>,
}

impl SliderSpec {
    pub fn binding(&self) -> Binding {
        Binding {
            input: self.input.clone(),
            function: self.function.clone(),
            args: self.args.clone(),
            output: self.output.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub y: String,
    #[serde(default)]
    pub x: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub data: String,
    #[serde(default)]
    pub levels: Option<[f64; 2]>,
    #[serde(default)]
    pub colormap: Option<String>,
    /// `ud`, `lr` or `udlr`; checked when the widget opens.
    #[serde(default)]
    pub flip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneSpec {
    pub tracker: String,
    pub data: String,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub tracker: String,
    pub window: String,
    pub data: String,
    /// Scalar or per-sample multiplier applied to the index axis.
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSequenceSpec {
    pub tracker: String,
    /// Frame stack (N x H x W[, C]) or a video file name.
    pub base: String,
    #[serde(default)]
    pub overlay: Option<String>,
    #[serde(default)]
    pub levels: Option<[f64; 2]>,
    #[serde(default)]
    pub colormap: Option<String>,
    #[serde(default)]
    pub opacity: Option<u8>,
    /// `ud`, `lr` or `udlr`; checked when the widget opens.
    #[serde(default)]
    pub flip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSpec {
    pub position: String,
    pub file: String,
}

/// One widget to open; each variant is an entry point of its own kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetSpec {
    Transform(Binding),
    Slider(SliderSpec),
    DropDown(Binding),
    Graph(GraphSpec),
    Image(ImageSpec),
    Pane(PaneSpec),
    Range(RangeSpec),
    ImageSequence(ImageSequenceSpec),
    Video(VideoSpec),
}

impl WidgetSpec {
    pub fn transform(input: &str, function: Option<&str>, output: &str) -> Self {
        WidgetSpec::Transform(Binding::new(input, function, output))
    }

    pub fn slider(input: &str, function: Option<&str>, output: &str, limits: Option<[i64; 2]>) -> Self {
        WidgetSpec::Slider(SliderSpec {
            input: input.to_string(),
            function: function.map(str::to_string),
            args: None,
            output: output.to_string(),
            limits,
        })
    }

    pub fn drop_down(input: &str, function: Option<&str>, output: &str) -> Self {
        WidgetSpec::DropDown(Binding::new(input, function, output))
    }

    pub fn graph(y: &str, x: Option<&str>) -> Self {
        WidgetSpec::Graph(GraphSpec {
            y: y.to_string(),
            x: x.map(str::to_string),
        })
    }

    pub fn image(data: &str) -> Self {
        WidgetSpec::Image(ImageSpec {
            data: data.to_string(),
            levels: None,
            colormap: None,
            flip: None,
        })
    }

    pub fn pane(tracker: &str, data: &str) -> Self {
        WidgetSpec::Pane(PaneSpec {
            tracker: tracker.to_string(),
            data: data.to_string(),
            x: None,
            transform: None,
        })
    }

    pub fn range(tracker: &str, window: &str, data: &str) -> Self {
        WidgetSpec::Range(RangeSpec {
            tracker: tracker.to_string(),
            window: window.to_string(),
            data: data.to_string(),
            x: None,
            transform: None,
        })
    }

    pub fn image_sequence(tracker: &str, base: &str) -> Self {
        WidgetSpec::ImageSequence(ImageSequenceSpec {
            tracker: tracker.to_string(),
            base: base.to_string(),
            overlay: None,
            levels: None,
            colormap: None,
            opacity: None,
            flip: None,
        })
    }

    pub fn video(position: &str, file: &str) -> Self {
        WidgetSpec::Video(VideoSpec {
            position: position.to_string(),
            file: file.to_string(),
        })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            WidgetSpec::Transform(_) => "transform",
            WidgetSpec::Slider(_) => "slider",
            WidgetSpec::DropDown(_) => "drop_down",
            WidgetSpec::Graph(_) => "graph",
            WidgetSpec::Image(_) => "image",
            WidgetSpec::Pane(_) => "pane",
            WidgetSpec::Range(_) => "range",
            WidgetSpec::ImageSequence(_) => "image_sequence",
            WidgetSpec::Video(_) => "video",
        }
    }
}

/// A UI event replayed by headless hosts before a given tick.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptedEvent {
    /// Zero-based tick before which the event fires.
    pub tick: usize,
    /// Index into the session's widget list.
    pub widget: usize,
    #[serde(flatten)]
    pub event: UiEvent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub config: WatchConfig,
    #[serde(default, rename = "widget")]
    pub widgets: Vec<WidgetSpec>,
    #[serde(default, rename = "event")]
    pub events: Vec<ScriptedEvent>,
}

impl Session {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing session {}", path.display()))
    }
}
