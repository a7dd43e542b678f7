use crate::value::Value;
use serde::Serialize;

/// How a computed output is shown next to the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutputDisplay {
    /// Two-state indicator (green when true, red when false).
    Indicator(bool),
    Literal(String),
    /// Values without a compact representation show the variable name.
    Name(String),
}

pub fn classify_output(output_name: &str, value: &Value) -> OutputDisplay {
    match value {
        Value::Bool(b) => OutputDisplay::Indicator(*b),
        Value::Int(_) | Value::Float(_) | Value::Str(_) => OutputDisplay::Literal(value.to_string()),
        _ => OutputDisplay::Name(output_name.to_string()),
    }
}

/// `name = value` for short values, just `name` for long ones.
pub fn input_label(name: &str, value: &Value, inline_max_len: usize) -> String {
    if value.len().unwrap_or(0) > inline_max_len {
        name.to_string()
    } else {
        format!("{name} = {value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_become_indicators() {
        assert_eq!(
            classify_output("y", &Value::Bool(false)),
            OutputDisplay::Indicator(false)
        );
    }

    #[test]
    fn scalars_render_literally() {
        assert_eq!(
            classify_output("y", &Value::Int(40)),
            OutputDisplay::Literal("40".into())
        );
        assert_eq!(
            classify_output("y", &Value::from("on")),
            OutputDisplay::Literal("on".into())
        );
    }

    #[test]
    fn containers_render_their_name() {
        let value = Value::from(vec![1.0, 2.0]);
        assert_eq!(
            classify_output("smoothed", &value),
            OutputDisplay::Name("smoothed".into())
        );
    }

    #[test]
    fn long_inputs_show_only_the_name() {
        let short = Value::from(vec![1.0, 2.0]);
        let long = Value::from(vec![0.0; 6]);
        assert_eq!(input_label("x", &short, 5), "x = [1.0, 2.0]");
        assert_eq!(input_label("x", &long, 5), "x");
    }
}
