//! Optional TOML defaults for the `uqi` command.
//!
//! ```toml
//! [uqi]
//! roots = ["Platform", "Silicon"]
//! output = "Platform/Strings/UqiList.uni"
//! exclude = ["Build"]
//! strictness = "warn"
//! prefix = "\\x"
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use unitool::Strictness;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitoolConfig {
    #[serde(default)]
    pub uqi: UqiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UqiConfig {
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub exclude: Vec<PathBuf>,
    pub strictness: Option<Strictness>,
    pub prefix: Option<String>,
}

/// Reads a config file and resolves its paths.
pub fn load_config(path: &Path) -> Result<UnitoolConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
    let mut config: UnitoolConfig = toml::from_str(&text)
        .map_err(|e| format!("Failed to parse config '{}': {}", path.display(), e))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let uqi = &mut config.uqi;
    uqi.roots = uqi.roots.iter().map(|p| base.join(p)).collect();
    uqi.output = uqi.output.as_ref().map(|p| base.join(p));
    Ok(config)
}
