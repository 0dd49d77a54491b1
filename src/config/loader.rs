use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use toml::Value;
use toml::value::Table;

use super::core::AppConfig;

/// Load configuration files in order, later files overriding earlier ones.
///
/// Missing files are an error; an empty path list yields the defaults.
pub fn load_config(paths: &[PathBuf]) -> Result<AppConfig> {
    let mut merged = Value::Table(Table::new());
    for path in paths {
        let layer = read_layer(path)?;
        merge_values(&mut merged, layer);
    }

    merged
        .try_into::<AppConfig>()
        .context("failed to deserialize merged configuration")
}

/// Like [`load_config`], but skips the base file when it does not exist.
pub fn load_config_with_base(base: &Path, extra: &[PathBuf]) -> Result<AppConfig> {
    let mut paths = Vec::with_capacity(extra.len() + 1);
    if base.is_file() {
        paths.push(base.to_path_buf());
    }
    paths.extend(extra.iter().cloned());
    load_config(&paths)
}

fn read_layer(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let table: Table = toml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(Value::Table(table))
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
