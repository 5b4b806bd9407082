// ============================================================
// Layer 6 — Config Store
// ============================================================
// Saves and restores the PipelineConfig as pretty-printed JSON.
//
// Why keep the config on disk?
//   A prepared corpus is only reproducible if the thresholds it
//   was filtered and normalised with are known. Writing the
//   config next to the corpus records them; passing it back with
//   --config reruns the pipeline with the same values.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::application::config::PipelineConfig;

/// Load a config file. Keys missing from the file keep their defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

    let cfg = serde_json::from_str(&json)
        .with_context(|| format!("Invalid config in '{}'", path.display()))?;

    tracing::debug!("Loaded pipeline config from '{}'", path.display());
    Ok(cfg)
}

/// Load `path` if given, otherwise the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(PipelineConfig::default()),
    }
}

/// Write a config file, creating parent directories as needed.
pub fn save_config(path: &Path, cfg: &PipelineConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json)
        .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

    tracing::debug!("Saved pipeline config to '{}'", path.display());
    Ok(())
}
