use anyhow::{anyhow, bail, Context, Result};
use replwatch_lib::{MapNamespace, Namespace, Value};

/// One line typed into the console.
#[derive(Debug, PartialEq)]
pub enum Command {
    Assign { name: String, value: Value },
    Delete(String),
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse `name = <json>` or `del name`.
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("del ") {
        let name = rest.trim();
        if !valid_name(name) {
            bail!("not a variable name: {name:?}");
        }
        return Ok(Command::Delete(name.to_string()));
    }
    let (name, json) = line
        .split_once('=')
        .ok_or_else(|| anyhow!("expected `name = <json>` or `del name`"))?;
    let name = name.trim();
    if !valid_name(name) {
        bail!("not a variable name: {name:?}");
    }
    let json: serde_json::Value =
        serde_json::from_str(json.trim()).with_context(|| format!("value for {name}"))?;
    Ok(Command::Assign {
        name: name.to_string(),
        value: Value::from_json(&json),
    })
}

/// Apply a command, returning a short status line.
pub fn apply(ns: &mut MapNamespace, command: Command) -> Result<String> {
    match command {
        Command::Assign { name, value } => {
            let kind = value.type_name();
            ns.set(&name, value);
            Ok(format!("{name} <- {kind}"))
        }
        Command::Delete(name) => match ns.remove(&name) {
            Some(_) => Ok(format!("deleted {name}")),
            None => bail!("{name} is not defined"),
        },
    }
}
