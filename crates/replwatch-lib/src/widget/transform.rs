use super::{TickContext, WidgetKind};
use crate::classify::{classify_output, input_label, OutputDisplay};
use crate::config::WatchConfig;
use crate::error::{BindError, BindResult};
use crate::guard::{parse_bounded, EditField};
use crate::namespace::{mismatch, resolve, resolve_i64, Namespace};
use crate::session::{Binding, SliderSpec};
use crate::surface::{Field, LabelSlot, SliderView, Surface, UiEvent};
use crate::transform::{invoke, resolve_args, resolve_function};
use crate::value::Value;

/// The read-transform-write core shared by every input flavour.
#[derive(Debug)]
struct Pipeline {
    binding: Binding,
    input_label: String,
    output: Option<OutputDisplay>,
}

impl Pipeline {
    fn new(binding: Binding) -> Self {
        Self {
            input_label: binding.input.clone(),
            binding,
            output: None,
        }
    }

    fn title(&self) -> String {
        match &self.binding.function {
            Some(function) => format!("{} = {function}({})", self.binding.output, self.binding.input),
            None => format!("{} = {}", self.binding.output, self.binding.input),
        }
    }

    fn run(&mut self, ns: &mut dyn Namespace, input: &Value, ctx: &TickContext) -> BindResult<()> {
        self.input_label = input_label(&self.binding.input, input, ctx.config.inline_value_max_len);
        let args = resolve_args(&*ns, self.binding.args.as_deref())?;
        if !ctx.enabled {
            return Ok(());
        }
        let function = resolve_function(&*ns, self.binding.function.as_deref())?;
        let output = invoke(function.as_ref(), input, args.as_deref())?;
        self.output = Some(classify_output(&self.binding.output, &output));
        ns.set(&self.binding.output, output);
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.set_label(LabelSlot::Input, self.input_label.clone());
        let function = match &self.binding.function {
            Some(function) => format!("{function}({}) = ", self.binding.input),
            None => "-------->".to_string(),
        };
        surface.set_label(LabelSlot::Function, function);
        if let Some(output) = &self.output {
            surface.set_output(output.clone());
        }
    }
}

/// Input read from any namespace value and shown as a label.
#[derive(Debug)]
pub struct LabelWidget {
    pipeline: Pipeline,
}

impl LabelWidget {
    pub fn new(binding: Binding) -> Self {
        Self {
            pipeline: Pipeline::new(binding),
        }
    }
}

impl WidgetKind for LabelWidget {
    fn kind(&self) -> &'static str {
        "transform"
    }

    fn title(&self) -> String {
        self.pipeline.title()
    }

    fn load(&mut self, ns: &mut dyn Namespace, ctx: &TickContext) -> BindResult<()> {
        let input = resolve(&*ns, &self.pipeline.binding.input)?.clone();
        self.pipeline.run(ns, &input, ctx)
    }

    fn render(&mut self, surface: &mut dyn Surface, _ctx: &TickContext) {
        self.pipeline.render(surface);
    }

    fn on_event(&mut self, _event: &UiEvent, _ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        Ok(())
    }

    fn connectable(&self) -> bool {
        true
    }
}

/// Integer input driven by a bounded slider and a guarded text field.
#[derive(Debug)]
pub struct SliderWidget {
    pipeline: Pipeline,
    min: i64,
    max: i64,
    value: Option<i64>,
    field: EditField,
}

impl SliderWidget {
    pub fn new(spec: &SliderSpec, config: &WatchConfig) -> BindResult<Self> {
        let [min, max] = spec.limits.unwrap_or([0, config.slider_default_max]);
        if min >= max {
            return Err(BindError::Config(format!(
                "slider limits must be increasing, got [{min}, {max}]"
            )));
        }
        Ok(Self {
            pipeline: Pipeline::new(spec.binding()),
            min,
            max,
            value: None,
            field: EditField::default(),
        })
    }

    fn input(&self) -> &str {
        &self.pipeline.binding.input
    }

    fn write(&self, ns: &mut dyn Namespace, value: i64) {
        ns.set(self.input(), Value::Int(value.clamp(self.min, self.max)));
    }
}

impl WidgetKind for SliderWidget {
    fn kind(&self) -> &'static str {
        "slider"
    }

    fn title(&self) -> String {
        self.pipeline.title()
    }

    fn load(&mut self, ns: &mut dyn Namespace, ctx: &TickContext) -> BindResult<()> {
        let value = resolve_i64(&*ns, self.input())?;
        self.value = Some(value);
        self.pipeline.run(ns, &Value::Int(value), ctx)
    }

    fn render(&mut self, surface: &mut dyn Surface, _ctx: &TickContext) {
        self.pipeline.render(surface);
        if let Some(value) = self.value {
            self.field.refresh(value.to_string());
            surface.set_slider(SliderView {
                value: value.clamp(self.min, self.max),
                min: self.min,
                max: self.max,
            });
        }
        surface.set_field_text(Field::Input, self.field.text().to_string());
    }

    fn on_event(&mut self, event: &UiEvent, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        match event {
            UiEvent::SliderMoved { value } => self.write(ns, *value),
            UiEvent::Forward => {
                let current = resolve_i64(&*ns, self.input())?;
                if current < self.max {
                    self.write(ns, current + 1);
                }
            }
            UiEvent::Backward => {
                let current = resolve_i64(&*ns, self.input())?;
                if current > self.min {
                    self.write(ns, current - 1);
                }
            }
            UiEvent::TextEdited {
                field: Field::Input,
                text,
            } => self.field.edit(text.clone()),
            UiEvent::TextCommitted { field: Field::Input } => {
                let text = self.field.commit();
                if let Some(value) = parse_bounded(&text, self.min, self.max) {
                    self.write(ns, value);
                }
            }
            UiEvent::EditCancelled { field: Field::Input } => self.field.cancel(),
            _ => {}
        }
        Ok(())
    }

    fn connectable(&self) -> bool {
        true
    }
}

/// Input chosen from a list captured when the widget opens.
#[derive(Debug)]
pub struct DropDownWidget {
    pipeline: Pipeline,
    items: Vec<Value>,
    selected: usize,
}

impl DropDownWidget {
    pub fn open(binding: Binding, ns: &dyn Namespace) -> BindResult<Self> {
        let value = resolve(ns, &binding.input)?;
        let items = value
            .items()
            .ok_or_else(|| mismatch(&binding.input, "a list", value))?;
        if items.is_empty() {
            return Err(BindError::Config(format!(
                "drop-down list {} has no items",
                binding.input
            )));
        }
        Ok(Self {
            pipeline: Pipeline::new(binding),
            items,
            selected: 0,
        })
    }
}

impl WidgetKind for DropDownWidget {
    fn kind(&self) -> &'static str {
        "drop_down"
    }

    fn title(&self) -> String {
        self.pipeline.title()
    }

    fn load(&mut self, ns: &mut dyn Namespace, ctx: &TickContext) -> BindResult<()> {
        let input = self.items[self.selected].clone();
        self.pipeline.run(ns, &input, ctx)
    }

    fn render(&mut self, surface: &mut dyn Surface, _ctx: &TickContext) {
        self.pipeline.render(surface);
        let labels = self.items.iter().map(Value::to_string).collect();
        surface.set_items(labels, self.selected);
    }

    fn on_event(&mut self, event: &UiEvent, _ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        if let UiEvent::ItemSelected { index } = event {
            if *index < self.items.len() {
                self.selected = *index;
            }
        }
        Ok(())
    }

    fn connectable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::MapNamespace;
    use crate::surface::View;
    use crate::transform::install_builtins;

    fn ctx(config: &WatchConfig, enabled: bool) -> TickContext<'_> {
        TickContext { config, enabled }
    }

    #[test]
    fn label_applies_function_with_args() {
        let config = WatchConfig::default();
        let mut ns = MapNamespace::new().with("x", 7).with("k", 2);
        install_builtins(&mut ns);
        let binding = Binding::new("x", Some("divide_floor"), "y").with_args("k");
        let mut widget = LabelWidget::new(binding);
        widget.load(&mut ns, &ctx(&config, true)).unwrap();
        assert_eq!(ns.get("y"), Some(&Value::Int(3)));

        let mut view = View::default();
        widget.render(&mut view, &ctx(&config, true));
        assert_eq!(view.label(LabelSlot::Function), Some("divide_floor(x) = "));
        assert_eq!(view.output, Some(OutputDisplay::Literal("3".into())));
    }

    #[test]
    fn long_inputs_show_only_their_name() {
        let config = WatchConfig::default();
        let mut ns = MapNamespace::new().with("x", "abcdefgh");
        let mut widget = LabelWidget::new(Binding::new("x", None, "y"));
        widget.load(&mut ns, &ctx(&config, true)).unwrap();
        let mut view = View::default();
        widget.render(&mut view, &ctx(&config, true));
        assert_eq!(view.label(LabelSlot::Input), Some("x"));
        assert_eq!(view.label(LabelSlot::Function), Some("-------->"));
    }

    #[test]
    fn missing_function_is_fatal_only_when_enabled() {
        let config = WatchConfig::default();
        let mut ns = MapNamespace::new().with("x", 1);
        let mut widget = LabelWidget::new(Binding::new("x", Some("nope"), "y"));
        widget.load(&mut ns, &ctx(&config, false)).unwrap();
        let err = widget.load(&mut ns, &ctx(&config, true)).unwrap_err();
        assert!(matches!(err, BindError::NameNotFound { .. }));
    }

    #[test]
    fn slider_steps_within_limits() {
        let config = WatchConfig::default();
        let spec = SliderSpec {
            input: "i".into(),
            function: None,
            args: None,
            output: "o".into(),
            limits: Some([0, 2]),
        };
        let mut widget = SliderWidget::new(&spec, &config).unwrap();
        let mut ns = MapNamespace::new().with("i", 2);
        widget.on_event(&UiEvent::Forward, &mut ns, &ctx(&config, true)).unwrap();
        assert_eq!(ns.get("i"), Some(&Value::Int(2)));
        widget.on_event(&UiEvent::Backward, &mut ns, &ctx(&config, true)).unwrap();
        assert_eq!(ns.get("i"), Some(&Value::Int(1)));
        widget
            .on_event(&UiEvent::SliderMoved { value: 50 }, &mut ns, &ctx(&config, true))
            .unwrap();
        assert_eq!(ns.get("i"), Some(&Value::Int(2)));
    }

    #[test]
    fn slider_rejects_floats_and_bad_limits() {
        let config = WatchConfig::default();
        let mut spec = SliderSpec {
            input: "i".into(),
            function: None,
            args: None,
            output: "o".into(),
            limits: None,
        };
        let mut widget = SliderWidget::new(&spec, &config).unwrap();
        let mut ns = MapNamespace::new().with("i", 1.5);
        assert!(matches!(
            widget.load(&mut ns, &ctx(&config, true)),
            Err(BindError::TypeMismatch { .. })
        ));
        spec.limits = Some([3, 3]);
        assert!(matches!(
            SliderWidget::new(&spec, &config),
            Err(BindError::Config(_))
        ));
    }

    #[test]
    fn slider_commit_ignores_out_of_range_text() {
        let config = WatchConfig::default();
        let spec = SliderSpec {
            input: "i".into(),
            function: None,
            args: None,
            output: "o".into(),
            limits: Some([0, 10]),
        };
        let mut widget = SliderWidget::new(&spec, &config).unwrap();
        let mut ns = MapNamespace::new().with("i", 4);
        let edit = |text: &str| UiEvent::TextEdited {
            field: Field::Input,
            text: text.into(),
        };
        let commit = UiEvent::TextCommitted { field: Field::Input };
        widget.on_event(&edit("11"), &mut ns, &ctx(&config, true)).unwrap();
        widget.on_event(&commit, &mut ns, &ctx(&config, true)).unwrap();
        assert_eq!(ns.get("i"), Some(&Value::Int(4)));
        widget.on_event(&edit("7"), &mut ns, &ctx(&config, true)).unwrap();
        widget.on_event(&commit, &mut ns, &ctx(&config, true)).unwrap();
        assert_eq!(ns.get("i"), Some(&Value::Int(7)));
    }

    #[test]
    fn drop_down_reads_items_once() {
        let config = WatchConfig::default();
        let mut ns = MapNamespace::new().with(
            "choices",
            Value::List(vec![Value::from("a"), Value::from("b")]),
        );
        let mut widget = DropDownWidget::open(Binding::new("choices", None, "picked"), &ns).unwrap();
        ns.remove("choices");
        widget
            .on_event(&UiEvent::ItemSelected { index: 1 }, &mut ns, &ctx(&config, true))
            .unwrap();
        widget.load(&mut ns, &ctx(&config, true)).unwrap();
        assert_eq!(ns.get("picked"), Some(&Value::from("b")));
        let mut view = View::default();
        widget.render(&mut view, &ctx(&config, true));
        assert_eq!(view.items, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(view.selected, Some(1));
    }

    #[test]
    fn drop_down_needs_its_list_at_open() {
        let ns = MapNamespace::new();
        assert!(matches!(
            DropDownWidget::open(Binding::new("choices", None, "picked"), &ns),
            Err(BindError::NameNotFound { .. })
        ));
    }
}
