//! Settings file loading

use anyhow::{Context, Result};
use enrich_core::FeatureConfig;
use std::path::Path;

/// Read and decode a settings file. `.json` files use the settings-export
/// format; everything else is TOML.
pub async fn load(path: &Path) -> Result<FeatureConfig> {
    let input = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let config = if is_json(path) {
        FeatureConfig::from_json_str(&input)
    } else {
        FeatureConfig::from_toml_str(&input)
    }
    .with_context(|| format!("Failed to decode settings file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded settings");
    Ok(config)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_detection_follows_extension() {
        assert!(is_json(Path::new("settings.JSON")));
        assert!(!is_json(Path::new("settings.toml")));
        assert!(!is_json(Path::new("settings")));
    }
}
