use anyhow::{Context, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Error;

pub type Vars = BTreeMap<String, Value>;

const VAULT_HEADER: &str = "$ANSIBLE_VAULT";

/// Convert a YAML mapping into variables, dropping non-scalar keys.
pub fn vars_from_value(value: &Value, path: &Path) -> Result<Vars> {
    match value {
        Value::Null => Ok(Vars::new()),
        Value::Mapping(mapping) => Ok(mapping
            .iter()
            .filter_map(|(key, value)| scalar_to_string(key).map(|key| (key, value.clone())))
            .collect()),
        other => Err(Error::InvalidInventory {
            path: path.to_path_buf(),
            reason: format!("expected a mapping of variables, found {}", kind_of(other)),
        }
        .into()),
    }
}

/// Render a scalar YAML value as a string. Sequences, mappings and tagged
/// values (e.g. `!vault`) have no string form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

pub fn read_vars_file(path: &Path) -> Result<Vars> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read variables file {}", path.display()))?;

    if content.trim_start().starts_with(VAULT_HEADER) {
        tracing::warn!("Skipping vault-encrypted file {}", path.display());
        return Ok(Vars::new());
    }

    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse variables file {}", path.display()))?;
    vars_from_value(&value, path)
}

/// Load `<base>/<kind>/<name>` variables, where `kind` is `group_vars` or
/// `host_vars`. The entry may be a bare file, a `.yml`/`.yaml` file or a
/// directory whose YAML files are merged in name order.
pub fn load_adjacent_vars(base: &Path, kind: &str, name: &str) -> Result<Vars> {
    let dir = base.join(kind);
    let mut vars = Vars::new();
    if !dir.is_dir() {
        return Ok(vars);
    }

    for candidate in [
        dir.join(name),
        dir.join(format!("{name}.yml")),
        dir.join(format!("{name}.yaml")),
    ] {
        if candidate.is_file() {
            tracing::debug!("Loading {} for '{}' from {}", kind, name, candidate.display());
            vars.extend(read_vars_file(&candidate)?);
        }
    }

    let nested = dir.join(name);
    if nested.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(&nested)
            .with_context(|| format!("Failed to read directory {}", nested.display()))?
        {
            let path = entry
                .with_context(|| format!("Failed to read directory entry in {}", nested.display()))?
                .path();
            if path.is_file() && is_yaml(&path) {
                files.push(path);
            }
        }
        files.sort();
        for file in files {
            tracing::debug!("Loading {} for '{}' from {}", kind, name, file.display());
            vars.extend(read_vars_file(&file)?);
        }
    }

    Ok(vars)
}

pub fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}
