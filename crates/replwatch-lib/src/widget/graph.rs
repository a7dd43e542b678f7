use super::{TickContext, WidgetKind};
use crate::axis::{reconcile, AxisPlan};
use crate::error::{BindError, BindResult};
use crate::namespace::{resolve_array, Namespace};
use crate::plot::figure_from_plan;
use crate::session::GraphSpec;
use crate::surface::{Surface, UiEvent};
use crate::value::NdArray;
use log::debug;

/// Read an optional explicit x axis, which must be one dimensional.
pub(crate) fn load_axis(ns: &dyn Namespace, name: Option<&str>) -> BindResult<Option<Vec<f64>>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let axis = resolve_array(ns, name)?;
    if axis.rank() != 1 {
        return Err(BindError::shape(format!(
            "X axis {name} needs to be 1 dimensional, got shape {:?}",
            axis.shape
        )));
    }
    Ok(Some(axis.data))
}

/// One-shot plot of a whole series, re-read on every tick.
#[derive(Debug)]
pub struct GraphWidget {
    spec: GraphSpec,
    data: Option<NdArray>,
    plan: Option<AxisPlan>,
}

impl GraphWidget {
    pub fn new(spec: GraphSpec) -> Self {
        Self {
            spec,
            data: None,
            plan: None,
        }
    }
}

impl WidgetKind for GraphWidget {
    fn kind(&self) -> &'static str {
        "graph"
    }

    fn title(&self) -> String {
        match &self.spec.x {
            Some(x) => format!("{} vs {x}", self.spec.y),
            None => self.spec.y.clone(),
        }
    }

    fn load(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        self.data = Some(resolve_array(&*ns, &self.spec.y)?);
        Ok(())
    }

    fn reconcile(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        let Some(data) = &self.data else {
            return Ok(());
        };
        if self.plan.as_ref().is_some_and(|plan| plan.matches(&data.shape)) {
            return Ok(());
        }
        let axis = load_axis(&*ns, self.spec.x.as_deref())?;
        let plan = reconcile(&data.shape, axis.as_deref())?;
        debug!("{}: axis plan {:?} for shape {:?}", self.spec.y, plan.mode, plan.shape);
        self.plan = Some(plan);
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, ctx: &TickContext) {
        if let (Some(plan), Some(data)) = (&self.plan, &self.data) {
            surface.draw_figure(figure_from_plan(
                &self.spec.y,
                plan,
                data,
                ctx.config.max_plot_points,
            ));
        }
    }

    fn on_event(&mut self, _event: &UiEvent, _ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        Ok(())
    }
}
