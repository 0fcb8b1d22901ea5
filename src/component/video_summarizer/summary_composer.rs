//! 摘要合成
//!
//! 流程：調整長度 → 串接 → 加入音訊（可失敗）→ 編碼 → 釋放。
//! 每個 handle 都包在 [`ScopedHandle`] 裡，不論在哪一步結束都會被釋放。

use super::backend::{
    ClipHandle, EncodeOptions, MediaBackend, ScopedHandle, SourceProfile, TimeRange,
};
use super::diagnostics::{Diagnostics, Warning};
use crate::error::{ComposeStage, SummaryError, SummaryResult};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// 合成參數
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    pub summary_duration: f64,
    pub profile: &'a SourceProfile,
    pub output_path: &'a Path,
    pub encode_options: &'a EncodeOptions,
}

/// 最終輸出
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryArtifact {
    pub output_path: PathBuf,
    pub duration_seconds: f64,
    pub has_audio: bool,
}

/// 每個片段調整後的長度
#[must_use]
pub fn adjusted_duration(summary_duration: f64, clip_count: usize) -> f64 {
    summary_duration / clip_count as f64
}

/// 將擷取到的片段合成為摘要影片
///
/// `clips` 的所有權在函式開頭就被接管，即使參數驗證失敗也會釋放。
pub fn compose(
    backend: &dyn MediaBackend,
    clips: Vec<ClipHandle>,
    request: &ComposeRequest<'_>,
    diagnostics: &mut Diagnostics,
) -> SummaryResult<SummaryArtifact> {
    let originals: Vec<_> = clips
        .into_iter()
        .map(|clip| ScopedHandle::new(backend, clip))
        .collect();

    if originals.is_empty() {
        return Err(SummaryError::NoSegments);
    }
    if !(request.summary_duration.is_finite() && request.summary_duration > 0.0) {
        return Err(SummaryError::invalid_input(format!(
            "摘要長度必須大於 0（目前為 {}）",
            request.summary_duration
        )));
    }

    let target = adjusted_duration(request.summary_duration, originals.len());
    info!(
        "合成 {} 個片段，每段調整為 {target:.3}s（總長 {:.3}s）",
        originals.len(),
        request.summary_duration
    );

    let mut rescaled = Vec::with_capacity(originals.len());
    for clip in &originals {
        let handle = backend
            .rescale(clip, target)
            .map_err(|source| SummaryError::CompositionFailed {
                stage: ComposeStage::Rescale,
                source,
            })?;
        rescaled.push(ScopedHandle::new(backend, handle));
    }
    drop(originals);

    let sequence: Vec<&ClipHandle> = rescaled.iter().map(|clip| &**clip).collect();
    let concatenated = backend
        .concatenate(&sequence)
        .map_err(|source| SummaryError::CompositionFailed {
            stage: ComposeStage::Concatenate,
            source,
        })?;
    let concatenated = ScopedHandle::new(backend, concatenated);
    drop(sequence);
    drop(rescaled);

    let with_audio = attach_source_audio(backend, &concatenated, request, diagnostics);
    let final_clip: &ClipHandle = with_audio.as_deref().unwrap_or(&*concatenated);

    backend
        .encode(final_clip, request.output_path, request.encode_options)
        .map_err(|source| SummaryError::EncodeFailed {
            output: request.output_path.to_path_buf(),
            source,
        })?;

    info!("摘要影片已建立: {}", request.output_path.display());

    Ok(SummaryArtifact {
        output_path: request.output_path.to_path_buf(),
        duration_seconds: final_clip.duration_seconds(),
        has_audio: with_audio.is_some(),
    })
}

/// 加入來源音訊；任何失敗都只記錄警告
fn attach_source_audio<'b>(
    backend: &'b dyn MediaBackend,
    video: &ClipHandle,
    request: &ComposeRequest<'_>,
    diagnostics: &mut Diagnostics,
) -> Option<ScopedHandle<'b, ClipHandle>> {
    if !request.profile.has_audio() {
        debug!("來源沒有音軌，略過音訊");
        return None;
    }

    match try_attach_audio(backend, video, request) {
        Ok(attached) => attached,
        Err(e) => {
            diagnostics.push(Warning::AudioAttachFailed {
                cause: format!("{e:#}"),
            });
            None
        }
    }
}

/// 音訊取自來源的 `[0, summary_duration]`，與實際取樣的片段無關
fn try_attach_audio<'b>(
    backend: &'b dyn MediaBackend,
    video: &ClipHandle,
    request: &ComposeRequest<'_>,
) -> anyhow::Result<Option<ScopedHandle<'b, ClipHandle>>> {
    let window = TimeRange::within(
        0.0,
        request.summary_duration,
        request.profile.duration_seconds(),
    )?;

    let Some(audio) = backend.trim_audio(request.profile, window)? else {
        debug!("後端未回傳音訊");
        return Ok(None);
    };
    let audio = ScopedHandle::new(backend, audio);

    let attached = backend.attach_audio(video, &audio)?;
    Ok(Some(ScopedHandle::new(backend, attached)))
}
