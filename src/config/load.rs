use crate::config::types::{Config, UserSettings};
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

/// 設定檔名稱（位於目前工作目錄）
pub const SETTINGS_FILE: &str = "settings.json";

impl Config {
    pub fn new() -> Self {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    /// 讀取指定的設定檔；檔案不存在或格式錯誤時使用預設值
    pub fn load_from(path: &Path) -> Self {
        let settings = load_settings(path).unwrap_or_else(|e| {
            warn!("{e:#}，使用預設設定");
            UserSettings::default()
        });

        Self { settings }
    }
}

fn load_settings(path: &Path) -> Result<UserSettings> {
    if !path.exists() {
        return Ok(UserSettings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("settings.json"));
        assert_eq!(config.settings, UserSettings::default());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "summary": { "segment_count": 5 }, "encoder": { "fps": 24.0 } }"#,
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.settings.summary.segment_count, 5);
        assert!((config.settings.summary.segment_duration - 3.0).abs() < f64::EPSILON);
        assert!((config.settings.summary.summary_duration - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.settings.encoder.video_codec, "libx264");
        assert_eq!(config.settings.encoder.fps, Some(24.0));
        assert!(config.settings.extraction.parallel);
    }

    #[test]
    fn test_corrupted_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.settings, UserSettings::default());
    }
}
