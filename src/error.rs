//! 摘要流程的錯誤型別

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 摘要流程的結果型別
pub type SummaryResult<T> = Result<T, SummaryError>;

/// 合成階段（用於標示哪一步失敗）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStage {
    Rescale,
    Concatenate,
}

impl fmt::Display for ComposeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rescale => write!(f, "rescale"),
            Self::Concatenate => write!(f, "concatenate"),
        }
    }
}

/// 致命錯誤
///
/// 可恢復的狀況（片段擷取失敗、音訊附加失敗、片段數量縮減）不在這裡，
/// 而是記錄在 [`crate::component::video_summarizer::Diagnostics`]。
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("參數無效: {0}")]
    InvalidInput(String),

    #[error("無法載入影片: {}", .path.display())]
    SourceLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("沒有可用的影片片段，無法建立摘要")]
    NoSegments,

    #[error("合成失敗（{stage}）")]
    CompositionFailed {
        stage: ComposeStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("編碼失敗: {}", .output.display())]
    EncodeFailed {
        output: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("操作已取消")]
    Cancelled,
}

impl SummaryError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}
