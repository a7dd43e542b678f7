use crate::transform::Transform;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as Json;
use std::fmt;

/// Dense row-major float array with an explicit shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl NdArray {
    /// Build an array, returning `None` when the shape does not cover the data.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Option<Self> {
        if shape.iter().product::<usize>() != data.len() {
            return None;
        }
        Some(Self { shape, data })
    }

    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        let height = rows.len();
        let data = rows.into_iter().flatten().collect();
        Self::new(vec![height, width], data)
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Length along the first axis.
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn last_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    /// Sub-array at `index` along the first axis.
    pub fn index(&self, index: usize) -> Option<NdArray> {
        if self.rank() == 0 || index >= self.len() {
            return None;
        }
        let stride: usize = self.shape[1..].iter().product();
        let start = index * stride;
        Some(NdArray {
            shape: self.shape[1..].to_vec(),
            data: self.data[start..start + stride].to_vec(),
        })
    }

    /// Window `[start, end)` along the last axis, kept for every outer row.
    pub fn slice_last(&self, start: usize, end: usize) -> NdArray {
        let width = self.last_dim();
        let end = end.min(width);
        let start = start.min(end);
        let mut shape = self.shape.clone();
        if let Some(last) = shape.last_mut() {
            *last = end - start;
        }
        let data = self
            .rows()
            .flat_map(|row| row[start..end].iter().copied())
            .collect();
        NdArray { shape, data }
    }

    /// Iterate over contiguous runs of the last axis.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.last_dim().max(1))
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut iter = self.data.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    fn to_json(&self) -> Json {
        fn nest(shape: &[usize], data: &[f64]) -> Json {
            match shape.split_first() {
                None => number(data.first().copied().unwrap_or(f64::NAN)),
                Some((&n, rest)) => {
                    let stride: usize = rest.iter().product();
                    Json::Array(
                        (0..n)
                            .map(|i| nest(rest, &data[i * stride..(i + 1) * stride]))
                            .collect(),
                    )
                }
            }
        }
        nest(&self.shape, &self.data)
    }
}

/// A value held in a namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Array(NdArray),
    Function(Transform),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
        }
    }

    /// Integer view; integral floats are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Transform> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Numeric array view. Lists of numbers (or of equal-length numeric
    /// lists) convert; scalars do not.
    pub fn to_array(&self) -> Option<NdArray> {
        match self {
            Value::Array(array) => Some(array.clone()),
            Value::List(_) => numeric_array(&self.to_json()),
            _ => None,
        }
    }

    /// Sized values report their length; scalars have none.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Array(array) => Some(array.len()),
            _ => None,
        }
    }

    /// Elements of a sequence value, used for drop-down items and argument
    /// lists.
    pub fn items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.clone()),
            Value::Array(array) => Some(
                (0..array.len())
                    .filter_map(|i| array.index(i))
                    .map(|sub| {
                        if sub.rank() == 0 {
                            Value::Float(sub.data[0])
                        } else {
                            Value::Array(sub)
                        }
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => match numeric_array(json) {
                Some(array) => Value::Array(array),
                None => Value::List(items.iter().map(Value::from_json).collect()),
            },
            Json::Object(_) => Value::Str(json.to_string()),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => number(*f),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Array(array) => array.to_json(),
            Value::Function(f) => Json::String(format!("<function {}>", f.name())),
        }
    }
}

fn number(value: f64) -> Json {
    serde_json::Number::from_f64(value)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}

fn numeric_array(json: &Json) -> Option<NdArray> {
    match json {
        Json::Number(n) => n.as_f64().map(|v| NdArray {
            shape: Vec::new(),
            data: vec![v],
        }),
        Json::Array(items) if !items.is_empty() => {
            let mut inner: Option<Vec<usize>> = None;
            let mut data = Vec::new();
            for item in items {
                let sub = numeric_array(item)?;
                match &inner {
                    Some(shape) if *shape != sub.shape => return None,
                    Some(_) => {}
                    None => inner = Some(sub.shape.clone()),
                }
                data.extend(sub.data);
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Some(NdArray { shape, data })
        }
        _ => None,
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        Ok(Value::from_json(&json))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => fmt_float(f, *v),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::Str(s) => write!(f, "'{s}'")?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "]")
            }
            Value::Array(array) => fmt_nested(f, &array.shape, &array.data),
            Value::Function(t) => write!(f, "<function {}>", t.name()),
        }
    }
}

fn fmt_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

fn fmt_nested(f: &mut fmt::Formatter<'_>, shape: &[usize], data: &[f64]) -> fmt::Result {
    match shape.split_first() {
        None => fmt_float(f, data.first().copied().unwrap_or(f64::NAN)),
        Some((&n, rest)) => {
            let stride: usize = rest.iter().product();
            write!(f, "[")?;
            for i in 0..n {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_nested(f, rest, &data[i * stride..(i + 1) * stride])?;
            }
            write!(f, "]")
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(NdArray::from_vec(v))
    }
}

impl From<NdArray> for Value {
    fn from(v: NdArray) -> Self {
        Value::Array(v)
    }
}
