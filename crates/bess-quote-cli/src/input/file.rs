use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use bess_quote_core::pricing::PricingCatalog;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (canonical, contents) = read_text(path)?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Load a pricing catalog. YAML for `.yaml`/`.yml`, JSON otherwise. The
/// catalog's tier tables are validated while deserialising.
pub fn read_pricing(path: &str) -> Result<PricingCatalog, Box<dyn std::error::Error>> {
    let (canonical, contents) = read_text(path)?;
    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let catalog = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Invalid pricing catalog '{}': {}", canonical.display(), e))?
    } else {
        PricingCatalog::from_json(&contents)
            .map_err(|e| format!("Invalid pricing catalog '{}': {}", canonical.display(), e))?
    };
    tracing::info!(path = %canonical.display(), "loaded pricing catalog");
    Ok(catalog)
}

fn read_text(path: &str) -> Result<(PathBuf, String), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    Ok((canonical, contents))
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
