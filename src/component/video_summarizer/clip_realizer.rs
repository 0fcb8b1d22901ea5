use super::backend::{ClipHandle, MediaBackend, SourceProfile, TimeRange, release_all};
use super::diagnostics::{Diagnostics, Warning};
use super::segment_planner::SamplingPlan;
use crate::error::{SummaryError, SummaryResult};
use indicatif::ProgressBar;
use log::{debug, info};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// 單一區段的擷取結果
#[derive(Debug)]
enum SliceOutcome {
    Realized(ClipHandle),
    Failed(String),
    Cancelled,
}

/// 依取樣計畫向後端擷取片段
///
/// 平行模式下使用 rayon，各區段之間沒有相依性；
/// 回傳的片段永遠依照計畫中的時間順序排列。
pub struct ClipRealizer<'a> {
    backend: &'a dyn MediaBackend,
    shutdown_signal: &'a AtomicBool,
    parallel: bool,
    progress: ProgressBar,
}

impl<'a> ClipRealizer<'a> {
    pub fn new(backend: &'a dyn MediaBackend, shutdown_signal: &'a AtomicBool) -> Self {
        Self {
            backend,
            shutdown_signal,
            parallel: true,
            progress: ProgressBar::hidden(),
        }
    }

    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// 擷取計畫中的所有區段
    ///
    /// 擷取失敗的區段會被略過並記錄為 [`Warning::SegmentSkipped`]；
    /// 收到中斷訊號時，已擷取的片段全部釋放並回傳 [`SummaryError::Cancelled`]。
    pub fn realize(
        &self,
        profile: &SourceProfile,
        plan: &SamplingPlan,
        diagnostics: &mut Diagnostics,
    ) -> SummaryResult<Vec<ClipHandle>> {
        self.progress.set_length(plan.len() as u64);

        let slice_one = |(index, range): (usize, &TimeRange)| -> SliceOutcome {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                return SliceOutcome::Cancelled;
            }

            debug!("擷取片段 {index}: {range}");
            let outcome = match self.backend.slice(profile, *range) {
                Ok(clip) => SliceOutcome::Realized(clip),
                Err(e) => {
                    debug!("片段 {index} 擷取失敗: {e:#}");
                    SliceOutcome::Failed(format!("{e:#}"))
                }
            };
            self.progress.inc(1);
            outcome
        };

        let outcomes: Vec<SliceOutcome> = if self.parallel {
            plan.ranges().par_iter().enumerate().map(slice_one).collect()
        } else {
            plan.ranges().iter().enumerate().map(slice_one).collect()
        };

        let mut clips = Vec::with_capacity(outcomes.len());
        let mut cancelled = false;
        for (index, (range, outcome)) in plan.ranges().iter().zip(outcomes).enumerate() {
            match outcome {
                SliceOutcome::Realized(clip) => clips.push(clip),
                SliceOutcome::Failed(cause) => diagnostics.push(Warning::SegmentSkipped {
                    index,
                    range: *range,
                    cause,
                }),
                SliceOutcome::Cancelled => cancelled = true,
            }
        }

        if cancelled {
            self.progress.abandon_with_message("已取消");
            release_all(self.backend, clips);
            return Err(SummaryError::Cancelled);
        }

        self.progress.finish_with_message("完成");
        info!("成功擷取 {}/{} 個片段", clips.len(), plan.len());

        Ok(clips)
    }
}
