use crate::error::{BindError, BindResult};
use crate::namespace::{mismatch, resolve, Namespace};
use crate::value::{NdArray, Value};
use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::sync::Arc;

pub type TransformFn = dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync;

/// A named function stored in the namespace next to the data it transforms.
#[derive(Clone)]
pub struct Transform {
    name: String,
    func: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, input: &Value, args: &[Value]) -> Result<Value> {
        (self.func)(input, args)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({})", self.name)
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

/// Look up the configured function. No name means identity.
pub fn resolve_function(ns: &dyn Namespace, name: Option<&str>) -> BindResult<Option<Transform>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let value = resolve(ns, name)?;
    value
        .as_function()
        .cloned()
        .map(Some)
        .ok_or_else(|| mismatch(name, "a function", value))
}

/// Look up the argument list. A scalar argument is wrapped into a one-element
/// list.
pub fn resolve_args(ns: &dyn Namespace, name: Option<&str>) -> BindResult<Option<Vec<Value>>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let value = resolve(ns, name)?;
    let args = match value {
        Value::Str(_) => vec![value.clone()],
        other => other.items().unwrap_or_else(|| vec![other.clone()]),
    };
    Ok(Some(args))
}

/// Run `function(input, *args)`. Errors raised by the function are reported
/// as `BindError::Transform` and are not treated as fatal.
pub fn invoke(function: Option<&Transform>, input: &Value, args: Option<&[Value]>) -> BindResult<Value> {
    match function {
        None => Ok(input.clone()),
        Some(f) => f
            .call(input, args.unwrap_or(&[]))
            .map_err(|source| BindError::Transform {
                name: f.name().to_string(),
                source,
            }),
    }
}

/// Resolve and invoke in one step.
pub fn apply(
    ns: &dyn Namespace,
    function_name: Option<&str>,
    args_name: Option<&str>,
    input: &Value,
) -> BindResult<Value> {
    let function = resolve_function(ns, function_name)?;
    let args = resolve_args(ns, args_name)?;
    invoke(function.as_ref(), input, args.as_deref())
}

fn arg_f64(args: &[Value], index: usize, what: &str) -> Result<f64> {
    args.get(index)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("missing numeric argument '{what}'"))
}

/// Apply `f` element-wise. Integer inputs stay integers when every result is
/// exact.
fn map_numeric(input: &Value, f: impl Fn(f64) -> f64) -> Result<Value> {
    match input {
        Value::Int(i) => {
            let out = f(*i as f64);
            if out.fract() == 0.0 && out.abs() < i64::MAX as f64 {
                Ok(Value::Int(out as i64))
            } else {
                Ok(Value::Float(out))
            }
        }
        Value::Float(v) => Ok(Value::Float(f(*v))),
        other => match other.to_array() {
            Some(array) => Ok(Value::Array(NdArray {
                data: array.data.iter().map(|&v| f(v)).collect(),
                shape: array.shape,
            })),
            None => bail!("expected a number or numeric array, got {}", other.type_name()),
        },
    }
}

fn scalar(input: &Value) -> Result<f64> {
    input
        .as_f64()
        .ok_or_else(|| anyhow!("expected a number, got {}", input.type_name()))
}

/// Transforms available to hosts whose namespaces come from data files.
pub fn builtins() -> Vec<Transform> {
    vec![
        Transform::new("identity", |x, _| Ok(x.clone())),
        Transform::new("negate", |x, _| map_numeric(x, |v| -v)),
        Transform::new("abs", |x, _| map_numeric(x, f64::abs)),
        Transform::new("scale", |x, args| {
            let k = arg_f64(args, 0, "k")?;
            map_numeric(x, |v| v * k)
        }),
        Transform::new("offset", |x, args| {
            let c = arg_f64(args, 0, "c")?;
            map_numeric(x, |v| v + c)
        }),
        Transform::new("clamp", |x, args| {
            let lo = arg_f64(args, 0, "lo")?;
            let hi = arg_f64(args, 1, "hi")?;
            if lo > hi {
                bail!("clamp bounds are inverted ({lo} > {hi})");
            }
            map_numeric(x, |v| v.clamp(lo, hi))
        }),
        Transform::new("threshold", |x, args| {
            let t = arg_f64(args, 0, "t")?;
            Ok(Value::Bool(scalar(x)? >= t))
        }),
        Transform::new("is_positive", |x, _| Ok(Value::Bool(scalar(x)? > 0.0))),
        Transform::new("mean", |x, _| {
            if let Some(v) = x.as_f64() {
                return Ok(Value::Float(v));
            }
            let array = x
                .to_array()
                .ok_or_else(|| anyhow!("mean needs numbers, got {}", x.type_name()))?;
            if array.is_empty() {
                bail!("mean of an empty array");
            }
            Ok(Value::Float(
                array.data.iter().sum::<f64>() / array.data.len() as f64,
            ))
        }),
        Transform::new("divide_floor", |x, args| {
            let k = arg_f64(args, 0, "k")?;
            if k == 0.0 {
                bail!("division by zero");
            }
            Ok(Value::Int((scalar(x)? / k).floor() as i64))
        }),
        Transform::new("normalize", |x, _| {
            let array = x
                .to_array()
                .ok_or_else(|| anyhow!("normalize needs an array, got {}", x.type_name()))?;
            let (lo, hi) = array.min_max().unwrap_or((0.0, 1.0));
            let span = if hi > lo { hi - lo } else { 1.0 };
            Ok(Value::Array(NdArray {
                data: array.data.iter().map(|v| (v - lo) / span).collect(),
                shape: array.shape,
            }))
        }),
    ]
}

/// Store each builtin under its own name unless the namespace already
/// holds a variable of that name.
pub fn install_builtins(ns: &mut dyn Namespace) {
    for transform in builtins() {
        let name = transform.name().to_string();
        if !ns.contains(&name) {
            ns.set(&name, Value::Function(transform));
        }
    }
}
