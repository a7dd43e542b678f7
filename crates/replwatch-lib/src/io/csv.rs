use crate::namespace::Namespace;
use crate::value::{NdArray, Value};
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Numeric columns of a headed CSV table, in header order.
pub fn parse_columns<R: Read>(reader: R, delimiter: u8) -> Result<Vec<(String, Vec<f64>)>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader.headers().context("reading header")?.clone();
    let mut columns: Vec<(String, Vec<f64>)> = headers
        .iter()
        .map(|name| (name.to_string(), Vec::new()))
        .collect();
    for (row, result) in reader.records().enumerate() {
        let record = result.context("reading record")?;
        for (col, (name, values)) in columns.iter_mut().enumerate() {
            let cell = record
                .get(col)
                .ok_or_else(|| anyhow!("row {} is missing column {name}", row + 1))?;
            let value = cell
                .parse::<f64>()
                .with_context(|| format!("row {} column {name} is not f64: {cell}", row + 1))?;
            values.push(value);
        }
    }
    Ok(columns)
}

/// Load every column of `path` as a rank-1 array named `{prefix}{header}`.
/// Returns the variable names that were set.
pub fn load_csv_columns(
    ns: &mut dyn Namespace,
    path: &Path,
    prefix: &str,
    delimiter: u8,
) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let columns = parse_columns(file, delimiter)
        .with_context(|| format!("parsing {}", path.display()))?;
    let mut names = Vec::with_capacity(columns.len());
    for (header, values) in columns {
        let name = format!("{prefix}{header}");
        ns.set(&name, Value::Array(NdArray::from_vec(values)));
        names.push(name);
    }
    Ok(names)
}
