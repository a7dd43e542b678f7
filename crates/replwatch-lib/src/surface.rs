use crate::classify::OutputDisplay;
use crate::image::RgbaImage;
use crate::plot::Figure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Editable text fields a widget may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Input,
    Position,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSlot {
    Input,
    Function,
    Elapsed,
    Total,
    Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliderView {
    pub value: i64,
    pub min: i64,
    pub max: i64,
}

/// User interaction reported by a presentation surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    SliderMoved { value: i64 },
    Forward,
    Backward,
    /// Keystroke in a text field; marks the field as being edited.
    TextEdited { field: Field, text: String },
    /// Enter pressed in a text field.
    TextCommitted { field: Field },
    EditCancelled { field: Field },
    ItemSelected { index: usize },
    ToggleConnection { enabled: bool },
    Play,
    Stop,
    Seek { delta_ms: i64 },
}

/// Render requests issued by widgets. The core never owns a window system;
/// hosts implement this or read back a [`View`].
pub trait Surface {
    fn set_title(&mut self, title: String);
    fn set_label(&mut self, slot: LabelSlot, text: String);
    fn set_output(&mut self, output: OutputDisplay);
    fn set_field_text(&mut self, field: Field, text: String);
    fn set_slider(&mut self, slider: SliderView);
    fn set_items(&mut self, items: Vec<String>, selected: usize);
    fn set_connection(&mut self, enabled: bool);
    fn set_playing(&mut self, playing: bool);
    fn draw_figure(&mut self, figure: Figure);
    fn draw_image(&mut self, image: RgbaImage);
}

/// Last state requested for one widget.
#[derive(Debug, Clone, Default, Serialize)]
pub struct View {
    pub title: String,
    pub labels: BTreeMap<LabelSlot, String>,
    pub output: Option<OutputDisplay>,
    pub fields: BTreeMap<Field, String>,
    pub slider: Option<SliderView>,
    pub items: Vec<String>,
    pub selected: Option<usize>,
    pub connection: Option<bool>,
    pub playing: Option<bool>,
    pub figure: Option<Figure>,
    pub image: Option<RgbaImage>,
}

impl View {
    pub fn label(&self, slot: LabelSlot) -> Option<&str> {
        self.labels.get(&slot).map(String::as_str)
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

impl Surface for View {
    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn set_label(&mut self, slot: LabelSlot, text: String) {
        self.labels.insert(slot, text);
    }

    fn set_output(&mut self, output: OutputDisplay) {
        self.output = Some(output);
    }

    fn set_field_text(&mut self, field: Field, text: String) {
        self.fields.insert(field, text);
    }

    fn set_slider(&mut self, slider: SliderView) {
        self.slider = Some(slider);
    }

    fn set_items(&mut self, items: Vec<String>, selected: usize) {
        self.items = items;
        self.selected = Some(selected);
    }

    fn set_connection(&mut self, enabled: bool) {
        self.connection = Some(enabled);
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = Some(playing);
    }

    fn draw_figure(&mut self, figure: Figure) {
        self.figure = Some(figure);
    }

    fn draw_image(&mut self, image: RgbaImage) {
        self.image = Some(image);
    }
}
