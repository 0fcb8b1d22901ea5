use serde::{Deserialize, Serialize};

/// 最近使用路徑的保留數量
pub const MAX_RECENT_PATHS: usize = 10;

/// 摘要預設參數（命令列未指定時使用）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryDefaults {
    pub segment_count: usize,
    /// 每個片段的長度（秒）
    pub segment_duration: f64,
    /// 摘要影片總長度（秒）
    pub summary_duration: f64,
}

impl Default for SummaryDefaults {
    fn default() -> Self {
        Self {
            segment_count: 10,
            segment_duration: 3.0,
            summary_duration: 30.0,
        }
    }
}

/// 最終輸出的編碼設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub audio_codec: String,
    /// 未設定時沿用來源影片的幀率
    pub fps: Option<f64>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            fps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// 平行擷取片段
    pub parallel: bool,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self { parallel: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub summary: SummaryDefaults,
    pub encoder: EncoderSettings,
    pub extraction: ExtractionSettings,
    /// 最近處理過的影片（最新的在最前面）
    pub recent_paths: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}
