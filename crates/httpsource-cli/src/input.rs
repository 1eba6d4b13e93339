//! Loading data source attributes from a configuration file

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use httpsource::DataSourceConfig;
use serde_json::{Map, Value};

/// Attributes that may be given as a path instead of inline PEM
const FILE_ATTRIBUTES: [(&str, &str); 3] = [
    ("ca_file", "ca"),
    ("client_crt_file", "client_crt"),
    ("client_key_file", "client_key"),
];

/// Read a YAML or JSON attribute file.
///
/// `*_file` attributes are resolved relative to the file's directory and
/// replaced by the file contents.
pub fn load(path: &Path) -> Result<DataSourceConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse(&text, is_json(path), base).with_context(|| format!("invalid config {}", path.display()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn parse(text: &str, json: bool, base: &Path) -> Result<DataSourceConfig> {
    let value: Value = if json {
        serde_json::from_str(text)?
    } else {
        serde_yaml::from_str(text)?
    };

    let Value::Object(mut attrs) = value else {
        bail!("expected a mapping of data source attributes");
    };
    resolve_files(&mut attrs, base)?;

    Ok(serde_json::from_value(Value::Object(attrs))?)
}

fn resolve_files(attrs: &mut Map<String, Value>, base: &Path) -> Result<()> {
    for (file_key, key) in FILE_ATTRIBUTES {
        let Some(value) = attrs.remove(file_key) else {
            continue;
        };
        if attrs.contains_key(key) {
            bail!("{} and {} are mutually exclusive", key, file_key);
        }
        let Value::String(relative) = value else {
            bail!("{} must be a path", file_key);
        };

        let path = base.join(relative);
        let pem = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {} {}", file_key, path.display()))?;
        attrs.insert(key.to_string(), Value::String(pem));
    }
    Ok(())
}
