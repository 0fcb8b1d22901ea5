use super::backend::TimeRange;
use log::warn;
use std::fmt;

/// 非致命的警告，流程會繼續執行
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// 影片長度不足，片段數量被縮減
    PlanReduced { requested: usize, effective: usize },
    /// 從 `first_index` 起的區段起點都落在影片結尾之後，共 `dropped` 個未列入計畫
    RangeOutOfBounds { first_index: usize, dropped: usize },
    /// 後端無法擷取此區段，已略過
    SegmentSkipped {
        index: usize,
        range: TimeRange,
        cause: String,
    },
    /// 音訊裁切或附加失敗，摘要不含音訊
    AudioAttachFailed { cause: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlanReduced {
                requested,
                effective,
            } => write!(
                f,
                "影片長度不足以擷取 {requested} 個片段，已縮減為 {effective} 個"
            ),
            Self::RangeOutOfBounds {
                first_index,
                dropped,
            } => write!(
                f,
                "片段 {first_index} 起共 {dropped} 個區段的起點超出影片長度，已略過"
            ),
            Self::SegmentSkipped {
                index,
                range,
                cause,
            } => write!(f, "片段 {index}（{range}）擷取失敗: {cause}"),
            Self::AudioAttachFailed { cause } => write!(f, "無法加入音訊: {cause}"),
        }
    }
}

/// 收集流程中的警告
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄警告（同時寫入 log）
    pub fn push(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// 若有片段數量縮減，回傳 (原本數量, 縮減後數量)
    #[must_use]
    pub fn plan_reduction(&self) -> Option<(usize, usize)> {
        self.warnings.iter().find_map(|w| match w {
            Warning::PlanReduced {
                requested,
                effective,
            } => Some((*requested, *effective)),
            _ => None,
        })
    }

    #[must_use]
    pub fn skipped_segments(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::SegmentSkipped { .. }))
            .count()
    }

    #[must_use]
    pub fn audio_failed(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, Warning::AudioAttachFailed { .. }))
    }
}
