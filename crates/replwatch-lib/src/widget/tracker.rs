use crate::error::BindResult;
use crate::guard::{parse_bounded, EditField};
use crate::namespace::{resolve_i64, Namespace};
use crate::surface::{Field, SliderView, Surface, UiEvent};
use crate::value::Value;

/// Integer namespace variable that selects one element of a sequence, with
/// the step buttons, slider and guarded position field that drive it.
#[derive(Debug, Clone)]
pub(crate) struct Tracker {
    name: String,
    index: i64,
    max: i64,
    field: EditField,
}

impl Tracker {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            index: 0,
            max: 0,
            field: EditField::default(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_max(&mut self, max: i64) {
        self.max = max.max(0);
    }

    pub(crate) fn max(&self) -> i64 {
        self.max
    }

    pub(crate) fn load(&mut self, ns: &dyn Namespace) -> BindResult<i64> {
        self.index = resolve_i64(ns, &self.name)?;
        Ok(self.index)
    }

    /// Index used for display; the namespace value itself is left alone.
    pub(crate) fn current(&self) -> usize {
        self.index.clamp(0, self.max) as usize
    }

    fn write(&self, ns: &mut dyn Namespace, index: i64) {
        ns.set(&self.name, Value::Int(index.clamp(0, self.max)));
    }

    /// Apply a navigation event. Returns whether the event was consumed.
    pub(crate) fn handle(&mut self, event: &UiEvent, ns: &mut dyn Namespace) -> BindResult<bool> {
        match event {
            UiEvent::Forward => {
                let index = resolve_i64(&*ns, &self.name)?;
                if index < self.max {
                    self.write(ns, index + 1);
                }
            }
            UiEvent::Backward => {
                let index = resolve_i64(&*ns, &self.name)?;
                if index > 0 {
                    self.write(ns, index - 1);
                }
            }
            UiEvent::SliderMoved { value } => self.write(ns, *value),
            UiEvent::TextEdited {
                field: Field::Position,
                text,
            } => self.field.edit(text.clone()),
            UiEvent::TextCommitted {
                field: Field::Position,
            } => {
                let text = self.field.commit();
                if let Some(index) = parse_bounded(&text, 0, self.max) {
                    self.write(ns, index);
                }
            }
            UiEvent::EditCancelled {
                field: Field::Position,
            } => self.field.cancel(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn render(&mut self, surface: &mut dyn Surface) {
        self.field.refresh(self.index.to_string());
        surface.set_field_text(Field::Position, self.field.text().to_string());
        surface.set_slider(SliderView {
            value: self.current() as i64,
            min: 0,
            max: self.max,
        });
    }
}
