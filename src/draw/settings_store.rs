use crate::draw::settings::InkSettings;
use anyhow::{Context, Result};
use std::path::Path;

pub const SETTINGS_FILE_NAME: &str = "ink_settings.json";

/// Reads settings from `path`. A missing or blank file yields the defaults.
pub fn load_from_path(path: &Path) -> Result<InkSettings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(InkSettings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(InkSettings::default());
    }

    let mut loaded: InkSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize settings file {}", path.display()))?;
    loaded.sanitize();
    Ok(loaded)
}

/// Like [`load_from_path`], but logs and falls back to defaults on error.
pub fn load_or_default(path: &Path) -> InkSettings {
    match load_from_path(path) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(?err, "failed to load settings, using defaults");
            InkSettings::default()
        }
    }
}

pub fn save_to_path(path: &Path, settings: &InkSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json = serde_json::to_string_pretty(&sanitized).context("serialize settings")?;
    std::fs::write(path, json).with_context(|| format!("write settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::Color;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from_path(&dir.path().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(loaded, InkSettings::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        let settings = InkSettings {
            stroke_color: Color::BLUE,
            stroke_width: 6.0,
            smoothing_level: 4,
            ..InkSettings::default()
        };
        save_to_path(&path, &settings).unwrap();
        assert_eq!(load_from_path(&path).unwrap(), settings);
    }

    #[test]
    fn malformed_file_is_an_error_but_load_or_default_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_from_path(&path).is_err());
        assert_eq!(load_or_default(&path), InkSettings::default());
    }

    #[test]
    fn blank_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(load_from_path(&path).unwrap(), InkSettings::default());
    }
}
