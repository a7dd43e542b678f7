use crate::error::{BindError, BindResult};
use crate::value::{NdArray, Value};
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Shared variable namespace owned by the host session.
///
/// Widgets never hold on to it between ticks; the host hands it in for every
/// tick and every dispatched UI event.
pub trait Namespace {
    fn get(&self, name: &str) -> Option<&Value>;
    fn set(&mut self, name: &str, value: Value);
    fn remove(&mut self, name: &str) -> Option<Value>;
    fn keys(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Ordered in-memory namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapNamespace {
    vars: BTreeMap<String, Value>,
}

impl MapNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Build from a JSON object; every key becomes a variable.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| anyhow!("namespace snapshot must be a JSON object"))?;
        let vars = object
            .iter()
            .map(|(name, value)| (name.clone(), Value::from_json(value)))
            .collect();
        Ok(Self { vars })
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing namespace {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("loading namespace {}", path.display()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.vars
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &self.to_json())?;
        Ok(())
    }

    /// Copy without function values, which have no JSON form.
    pub fn without_functions(&self) -> MapNamespace {
        let vars = self
            .vars
            .iter()
            .filter(|(_, value)| value.as_function().is_none())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self { vars }
    }

    /// Merge `other` into this namespace, replacing existing names.
    pub fn extend(&mut self, other: MapNamespace) {
        self.vars.extend(other.vars);
    }
}

impl Namespace for MapNamespace {
    fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    fn keys(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}

/// Look up `name`, failing with `NameNotFound` when it is absent.
pub fn resolve<'a>(ns: &'a dyn Namespace, name: &str) -> BindResult<&'a Value> {
    ns.get(name).ok_or_else(|| BindError::name_not_found(name))
}

pub fn resolve_i64(ns: &dyn Namespace, name: &str) -> BindResult<i64> {
    let value = resolve(ns, name)?;
    value.as_i64().ok_or_else(|| mismatch(name, "an integer", value))
}

pub fn resolve_array(ns: &dyn Namespace, name: &str) -> BindResult<NdArray> {
    let value = resolve(ns, name)?;
    value
        .to_array()
        .ok_or_else(|| mismatch(name, "a numeric array", value))
}

pub(crate) fn mismatch(name: &str, expected: &'static str, found: &Value) -> BindError {
    BindError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}
