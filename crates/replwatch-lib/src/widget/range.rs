use super::pane::transform_view;
use super::{TickContext, WidgetKind};
use crate::axis::{reconcile, AxisPlan};
use crate::error::{BindError, BindResult};
use crate::guard::{parse_bounded, EditField};
use crate::namespace::{mismatch, resolve, resolve_array, resolve_i64, Namespace};
use crate::plot::figure_from_plan;
use crate::range::RangeWindow;
use crate::session::RangeSpec;
use crate::surface::{Field, SliderView, Surface, UiEvent};
use crate::transform::{resolve_function, Transform};
use crate::value::{NdArray, Value};

/// Scrolls a window over a long series. Position and window length both live
/// in the namespace and are re-read on every tick.
#[derive(Debug)]
pub struct RangeWidget {
    spec: RangeSpec,
    data: Option<NdArray>,
    transform: Option<Transform>,
    range: Option<RangeWindow>,
    position_field: EditField,
    window_field: EditField,
    plan: Option<AxisPlan>,
    view: Option<NdArray>,
}

impl RangeWidget {
    pub fn new(spec: RangeSpec) -> Self {
        Self {
            spec,
            data: None,
            transform: None,
            range: None,
            position_field: EditField::default(),
            window_field: EditField::default(),
            plan: None,
            view: None,
        }
    }

    fn load_data(&mut self, ns: &dyn Namespace) -> BindResult<()> {
        let data = resolve_array(ns, &self.spec.data)?;
        if !matches!(data.rank(), 1 | 2) {
            return Err(BindError::shape(format!(
                "Data {} needs to be 1 or 2 dimensional, got shape {:?}",
                self.spec.data, data.shape
            )));
        }
        self.transform = resolve_function(ns, self.spec.transform.as_deref())?;
        self.data = Some(data);
        Ok(())
    }

    /// Window as currently stored in the namespace.
    fn read_range(&self, ns: &dyn Namespace) -> BindResult<Option<RangeWindow>> {
        let Some(data) = &self.data else {
            return Ok(None);
        };
        let position = resolve_i64(ns, &self.spec.tracker)?;
        let window = resolve_i64(ns, &self.spec.window)?;
        Ok(Some(RangeWindow::new(position, window, data.last_dim())))
    }

    fn multiplier(&self, ns: &dyn Namespace) -> BindResult<Option<Vec<f64>>> {
        let Some(name) = self.spec.x.as_deref() else {
            return Ok(None);
        };
        let value = resolve(ns, name)?;
        if let Some(factor) = value.as_f64() {
            return Ok(Some(vec![factor]));
        }
        match value.to_array() {
            Some(array) if array.rank() == 1 => Ok(Some(array.data)),
            _ => Err(mismatch(name, "a number or 1 dimensional array", value)),
        }
    }

    fn set_position(&self, ns: &mut dyn Namespace, position: i64) {
        ns.set(&self.spec.tracker, Value::Int(position));
    }
}

impl WidgetKind for RangeWidget {
    fn kind(&self) -> &'static str {
        "range"
    }

    fn title(&self) -> String {
        format!("{}[{}:+{}]", self.spec.data, self.spec.tracker, self.spec.window)
    }

    fn load(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        if self.data.is_none() {
            self.load_data(&*ns)?;
        }
        self.range = self.read_range(&*ns)?;
        Ok(())
    }

    fn reconcile(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        let (Some(data), Some(range)) = (&self.data, self.range) else {
            return Ok(());
        };
        let span = range.span();
        let view = transform_view(self.transform.as_ref(), data.slice_last(span.start, span.end))?;
        let mut plan = reconcile(&view.shape, None)?;
        if let Some(factor) = self.multiplier(&*ns)? {
            plan = plan.scaled(&factor)?;
        }
        self.plan = Some(plan);
        self.view = Some(view);
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, ctx: &TickContext) {
        let Some(range) = self.range else {
            return;
        };
        self.position_field.refresh(range.position.to_string());
        self.window_field.refresh(range.window.to_string());
        surface.set_field_text(Field::Position, self.position_field.text().to_string());
        surface.set_field_text(Field::Window, self.window_field.text().to_string());
        surface.set_slider(SliderView {
            value: range.effective_position(),
            min: 0,
            max: range.max_position(),
        });
        if let (Some(plan), Some(view)) = (&self.plan, &self.view) {
            let span = range.span();
            let title = format!("{}[{}:{}]", self.spec.data, span.start, span.end);
            surface.draw_figure(figure_from_plan(&title, plan, view, ctx.config.max_plot_points));
        }
    }

    fn on_event(&mut self, event: &UiEvent, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        match event {
            UiEvent::TextEdited {
                field: Field::Position,
                text,
            } => self.position_field.edit(text.clone()),
            UiEvent::TextEdited {
                field: Field::Window,
                text,
            } => self.window_field.edit(text.clone()),
            UiEvent::EditCancelled {
                field: Field::Position,
            } => self.position_field.cancel(),
            UiEvent::EditCancelled {
                field: Field::Window,
            } => self.window_field.cancel(),
            _ => {
                let Some(range) = self.read_range(&*ns)? else {
                    return Ok(());
                };
                match event {
                    UiEvent::Forward => self.set_position(ns, range.forward()),
                    UiEvent::Backward => self.set_position(ns, range.backward()),
                    UiEvent::SliderMoved { value } => {
                        self.set_position(ns, (*value).clamp(0, range.max_position()))
                    }
                    UiEvent::TextCommitted {
                        field: Field::Position,
                    } => {
                        let text = self.position_field.commit();
                        if let Some(position) = parse_bounded(&text, 0, range.max_position()) {
                            self.set_position(ns, position);
                        }
                    }
                    UiEvent::TextCommitted {
                        field: Field::Window,
                    } => {
                        let text = self.window_field.commit();
                        if let Some(window) = parse_bounded(&text, 1, range.max_window()) {
                            ns.set(&self.spec.window, Value::Int(window));
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}
