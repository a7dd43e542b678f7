use super::graph::load_axis;
use super::tracker::Tracker;
use super::{TickContext, WidgetKind};
use crate::axis::{reconcile, AxisPlan};
use crate::error::{BindError, BindResult};
use crate::namespace::{resolve_array, Namespace};
use crate::plot::figure_from_plan;
use crate::session::PaneSpec;
use crate::surface::{Surface, UiEvent};
use crate::transform::{invoke, resolve_function, Transform};
use crate::value::{NdArray, Value};
use anyhow::anyhow;

/// Apply an optional per-view transform and insist on an array result.
pub(crate) fn transform_view(transform: Option<&Transform>, view: NdArray) -> BindResult<NdArray> {
    let Some(function) = transform else {
        return Ok(view);
    };
    let output = invoke(Some(function), &Value::Array(view), None)?;
    output.to_array().ok_or_else(|| BindError::Transform {
        name: function.name().to_string(),
        source: anyhow!("returned {}, expected a numeric array", output.type_name()),
    })
}

/// Steps through `data[index]` for a tracker variable `index`.
#[derive(Debug)]
pub struct PaneWidget {
    spec: PaneSpec,
    tracker: Tracker,
    data: Option<NdArray>,
    transform: Option<Transform>,
    axis: Option<Vec<f64>>,
    plan: Option<AxisPlan>,
    pane: Option<NdArray>,
}

impl PaneWidget {
    pub fn new(spec: PaneSpec) -> Self {
        Self {
            tracker: Tracker::new(&spec.tracker),
            spec,
            data: None,
            transform: None,
            axis: None,
            plan: None,
            pane: None,
        }
    }

    fn load_data(&mut self, ns: &dyn Namespace) -> BindResult<()> {
        let data = resolve_array(ns, &self.spec.data)?;
        if !matches!(data.rank(), 2 | 3) {
            return Err(BindError::shape(format!(
                "Data {} needs to be 2 or 3 dimensional, got shape {:?}",
                self.spec.data, data.shape
            )));
        }
        self.transform = resolve_function(ns, self.spec.transform.as_deref())?;
        self.axis = load_axis(ns, self.spec.x.as_deref())?;
        self.tracker.set_max(data.len() as i64 - 1);
        self.data = Some(data);
        Ok(())
    }
}

impl WidgetKind for PaneWidget {
    fn kind(&self) -> &'static str {
        "pane"
    }

    fn title(&self) -> String {
        format!("{}[{}]", self.spec.data, self.tracker.name())
    }

    fn load(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        if self.data.is_none() {
            self.load_data(&*ns)?;
        }
        self.tracker.load(&*ns)?;
        Ok(())
    }

    fn reconcile(&mut self, _ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        let Some(data) = &self.data else {
            return Ok(());
        };
        let index = self.tracker.current();
        let pane = data
            .index(index)
            .ok_or_else(|| BindError::shape(format!("Data {} has no pane {index}", self.spec.data)))?;
        let pane = transform_view(self.transform.as_ref(), pane)?;
        if !self.plan.as_ref().is_some_and(|plan| plan.matches(&pane.shape)) {
            self.plan = Some(reconcile(&pane.shape, self.axis.as_deref())?);
        }
        self.pane = Some(pane);
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, ctx: &TickContext) {
        self.tracker.render(surface);
        if let (Some(plan), Some(pane)) = (&self.plan, &self.pane) {
            let title = format!("{}[{}]", self.spec.data, self.tracker.current());
            surface.draw_figure(figure_from_plan(&title, plan, pane, ctx.config.max_plot_points));
        }
    }

    fn on_event(&mut self, event: &UiEvent, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        self.tracker.handle(event, ns)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use crate::namespace::MapNamespace;
    use crate::plot::Series;
    use crate::surface::View;
    use crate::transform::install_builtins;

    fn tick(widget: &mut PaneWidget, ns: &mut MapNamespace, view: &mut View) -> BindResult<()> {
        let config = WatchConfig::default();
        let ctx = TickContext {
            config: &config,
            enabled: true,
        };
        widget.load(ns, &ctx)?;
        widget.reconcile(ns, &ctx)?;
        widget.render(view, &ctx);
        Ok(())
    }

    fn panes() -> NdArray {
        NdArray::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap()
    }

    #[test]
    fn tracker_selects_pane_and_clamps_display() {
        let mut ns = MapNamespace::new().with("i", 1).with("data", panes());
        let mut widget = PaneWidget::new(PaneSpec {
            tracker: "i".into(),
            data: "data".into(),
            x: None,
            transform: None,
        });
        let mut view = View::default();
        tick(&mut widget, &mut ns, &mut view).unwrap();
        assert_eq!(widget.pane.as_ref().unwrap().data, vec![3.0, 4.0]);

        ns.set("i", Value::Int(40));
        tick(&mut widget, &mut ns, &mut view).unwrap();
        assert_eq!(widget.pane.as_ref().unwrap().data, vec![5.0, 6.0]);
        assert_eq!(ns.get("i"), Some(&Value::Int(40)));
        assert_eq!(view.slider.map(|s| s.max), Some(2));
    }

    #[test]
    fn data_is_cached_after_first_load() {
        let mut ns = MapNamespace::new().with("i", 0).with("data", panes());
        let mut widget = PaneWidget::new(PaneSpec {
            tracker: "i".into(),
            data: "data".into(),
            x: None,
            transform: None,
        });
        let mut view = View::default();
        tick(&mut widget, &mut ns, &mut view).unwrap();
        ns.remove("data");
        tick(&mut widget, &mut ns, &mut view).unwrap();
        ns.remove("i");
        assert!(matches!(
            tick(&mut widget, &mut ns, &mut view),
            Err(BindError::NameNotFound { .. })
        ));
    }

    #[test]
    fn transform_applies_to_each_pane() {
        let mut ns = MapNamespace::new().with("i", 0).with("data", panes());
        install_builtins(&mut ns);
        let mut widget = PaneWidget::new(PaneSpec {
            tracker: "i".into(),
            data: "data".into(),
            x: None,
            transform: Some("negate".into()),
        });
        let mut view = View::default();
        tick(&mut widget, &mut ns, &mut view).unwrap();
        let Some(Series::Line(line)) = view.figure.as_ref().map(|f| &f.series[0]) else {
            panic!("expected a line");
        };
        assert_eq!(line.points, vec![[0.0, -1.0], [1.0, -2.0]]);
    }

    #[test]
    fn rank_one_data_closes() {
        let mut ns = MapNamespace::new().with("i", 0).with("data", vec![1.0, 2.0]);
        let mut widget = PaneWidget::new(PaneSpec {
            tracker: "i".into(),
            data: "data".into(),
            x: None,
            transform: None,
        });
        let mut view = View::default();
        assert!(matches!(
            tick(&mut widget, &mut ns, &mut view),
            Err(BindError::ShapeMismatch { .. })
        ));
    }
}
