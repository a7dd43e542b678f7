use anyhow::{Context, Result};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use replwatch_lib::session::Binding;
use replwatch_lib::{MapNamespace, NdArray, Value, WidgetSpec};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct DemoSession {
    widget: Vec<WidgetSpec>,
}

/// Ten offset rows of uniform noise plus a short series, with the trackers
/// that scroll through them.
pub fn demo_namespace(seed: u64) -> MapNamespace {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..10)
        .map(|row| (0..10_000).map(|_| rng.gen::<f64>() + row as f64).collect())
        .collect();
    let short: Vec<f64> = (0..500).map(|_| rng.gen::<f64>()).collect();
    let mut ns = MapNamespace::new()
        .with("position1", 0)
        .with("range1", 1000)
        .with("position2", 0)
        .with("range2", 10)
        .with("pane", 0)
        .with("ten", 10)
        .with("data2", short);
    if let Some(data1) = NdArray::from_rows(rows) {
        ns = ns.with("data1", Value::Array(data1));
    }
    ns
}

/// Widgets that exercise the demo namespace: two range viewers, a pane viewer,
/// and a transform linking the first range position to the second.
pub fn demo_session() -> Vec<WidgetSpec> {
    vec![
        WidgetSpec::range("position1", "range1", "data1"),
        WidgetSpec::range("position2", "range2", "data2"),
        WidgetSpec::pane("pane", "data1"),
        WidgetSpec::Transform(
            Binding::new("position1", Some("divide_floor"), "position2").with_args("ten"),
        ),
    ]
}

pub fn cmd_demo(out: &Path, session_out: Option<&Path>, seed: u64) -> Result<()> {
    let ns = demo_namespace(seed);
    ns.write_json(out)?;
    info!("wrote {} demo variables to {}", ns.len(), out.display());
    if let Some(path) = session_out {
        let session = DemoSession {
            widget: demo_session(),
        };
        let text = toml::to_string(&session).context("serializing demo session")?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replwatch_lib::Namespace;

    #[test]
    fn rows_are_offset_by_their_index() {
        let ns = demo_namespace(1);
        let data1 = ns.get("data1").and_then(Value::to_array).unwrap();
        assert_eq!(data1.shape, vec![10, 10_000]);
        let row9 = data1.index(9).unwrap();
        assert!(row9.data.iter().all(|v| (9.0..10.0).contains(v)));
    }

    #[test]
    fn seed_makes_output_repeatable() {
        assert_eq!(demo_namespace(3), demo_namespace(3));
    }
}
