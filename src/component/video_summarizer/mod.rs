//! 影片摘要元件
//!
//! 四階段流程：
//! A. 取得影片資訊
//! B. 均勻取樣規劃
//! C. 平行擷取片段
//! D. 調整長度、串接、加入音訊並編碼

mod backend;
mod clip_realizer;
mod diagnostics;
mod ffmpeg_backend;
mod main;
mod segment_planner;
mod summary_composer;
#[cfg(test)]
mod testing;

pub use backend::{
    AudioHandle, ClipHandle, EncodeOptions, MediaBackend, MediaHandle, ScopedHandle,
    SourceProfile, TimeRange, release_all,
};
pub use clip_realizer::ClipRealizer;
pub use diagnostics::{Diagnostics, Warning};
pub use ffmpeg_backend::{FfmpegBackend, compose_concat_filter, rescale_filter, split_seek};
pub use main::{
    SummaryFailure, SummaryReport, SummaryRequest, VideoSummarizer, default_output_path,
};
pub use segment_planner::{MIN_INTERVAL_SECONDS, SamplingPlan, plan};
pub use summary_composer::{ComposeRequest, SummaryArtifact, adjusted_duration, compose};
