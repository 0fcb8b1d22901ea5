//! 媒體後端介面
//!
//! 核心流程只決定「要擷取哪些時間區段」以及「如何組合」，
//! 實際的解碼、編碼與封裝都交給實作 [`MediaBackend`] 的後端。

use crate::error::{SummaryError, SummaryResult};
use anyhow::Result;
use log::warn;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 影片來源資訊，載入時建立一次，之後不可變
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProfile {
    path: PathBuf,
    duration_seconds: f64,
    fps: f64,
    width: u32,
    height: u32,
    has_audio: bool,
}

impl SourceProfile {
    /// 建立來源資訊；長度、幀率、尺寸必須為正數
    pub fn new(
        path: &Path,
        duration_seconds: f64,
        fps: f64,
        width: u32,
        height: u32,
        has_audio: bool,
    ) -> SummaryResult<Self> {
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            return Err(SummaryError::invalid_input(format!(
                "影片長度無效（{duration_seconds} 秒）: {}",
                path.display()
            )));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(SummaryError::invalid_input(format!("幀率無效: {fps}")));
        }
        if width == 0 || height == 0 {
            return Err(SummaryError::invalid_input(format!(
                "影片尺寸無效: {width}x{height}"
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            duration_seconds,
            fps,
            width,
            height,
            has_audio,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    #[must_use]
    pub const fn fps(&self) -> f64 {
        self.fps
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn has_audio(&self) -> bool {
        self.has_audio
    }
}

/// 時間區段 `[start, end)`，單位為秒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> SummaryResult<Self> {
        if !(start.is_finite() && end.is_finite()) || start < 0.0 || end <= start {
            return Err(SummaryError::invalid_input(format!(
                "時間區段無效: {start:.3}s ~ {end:.3}s"
            )));
        }
        Ok(Self { start, end })
    }

    /// 建立區段並確認不超出來源長度
    pub fn within(start: f64, end: f64, limit: f64) -> SummaryResult<Self> {
        let range = Self::new(start, end)?;
        if end > limit {
            return Err(SummaryError::invalid_input(format!(
                "時間區段超出影片長度: {range}（影片長度 {limit:.3}s）"
            )));
        }
        Ok(range)
    }

    #[must_use]
    pub const fn start(&self) -> f64 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> f64 {
        self.end
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s ~ {:.3}s", self.start, self.end)
    }
}

/// 影片片段資源（由後端持有實體）
///
/// 不實作 `Clone`：每個 handle 只有一個擁有者，並且只能被釋放一次。
#[derive(Debug, PartialEq)]
pub struct ClipHandle {
    id: Uuid,
    duration_seconds: f64,
}

impl ClipHandle {
    #[must_use]
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration_seconds,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// 音訊資源
#[derive(Debug, PartialEq)]
pub struct AudioHandle {
    id: Uuid,
    duration_seconds: f64,
}

impl AudioHandle {
    #[must_use]
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration_seconds,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// 交給 [`MediaBackend::release`] 的資源
#[derive(Debug, PartialEq)]
pub enum MediaHandle {
    Clip(ClipHandle),
    Audio(AudioHandle),
}

impl MediaHandle {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Clip(clip) => clip.id(),
            Self::Audio(audio) => audio.id(),
        }
    }
}

impl From<ClipHandle> for MediaHandle {
    fn from(handle: ClipHandle) -> Self {
        Self::Clip(handle)
    }
}

impl From<AudioHandle> for MediaHandle {
    fn from(handle: AudioHandle) -> Self {
        Self::Audio(handle)
    }
}

/// 最終編碼參數
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub video_codec: String,
    pub audio_codec: String,
    pub fps: f64,
}

/// 媒體後端
///
/// 所有方法都可能在多個 worker 執行緒上同時被呼叫（`slice`），
/// 因此要求 `Send + Sync`。
pub trait MediaBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<SourceProfile>;

    fn slice(&self, profile: &SourceProfile, range: TimeRange) -> Result<ClipHandle>;

    /// 產生一個長度為 `new_duration` 的新片段，原片段不變
    fn rescale(&self, clip: &ClipHandle, new_duration: f64) -> Result<ClipHandle>;

    fn concatenate(&self, clips: &[&ClipHandle]) -> Result<ClipHandle>;

    /// 來源沒有音軌時回傳 `Ok(None)`
    fn trim_audio(&self, profile: &SourceProfile, range: TimeRange)
    -> Result<Option<AudioHandle>>;

    fn attach_audio(&self, clip: &ClipHandle, audio: &AudioHandle) -> Result<ClipHandle>;

    fn encode(&self, clip: &ClipHandle, output_path: &Path, options: &EncodeOptions)
    -> Result<()>;

    /// 釋放資源；對已釋放或不存在的資源必須是安全的
    fn release(&self, handle: MediaHandle);
}

/// 範圍內持有的 handle，離開範圍時自動釋放
pub struct ScopedHandle<'a, H: Into<MediaHandle>> {
    backend: &'a dyn MediaBackend,
    handle: Option<H>,
}

impl<'a, H: Into<MediaHandle>> ScopedHandle<'a, H> {
    pub fn new(backend: &'a dyn MediaBackend, handle: H) -> Self {
        Self {
            backend,
            handle: Some(handle),
        }
    }

    fn release_inner(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.release(handle.into());
        }
    }
}

impl<H: Into<MediaHandle>> Deref for ScopedHandle<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        // handle 只在 release/drop 時取出，之後不會再被存取
        self.handle
            .as_ref()
            .unwrap_or_else(|| unreachable!("scoped handle used after release"))
    }
}

impl<H: Into<MediaHandle>> Drop for ScopedHandle<'_, H> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl<H: Into<MediaHandle> + fmt::Debug> fmt::Debug for ScopedHandle<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedHandle")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// 釋放一組 handle，並記錄數量
pub fn release_all(backend: &dyn MediaBackend, handles: Vec<ClipHandle>) {
    let count = handles.len();
    for handle in handles {
        backend.release(handle.into());
    }
    if count > 0 {
        warn!("已釋放 {count} 個尚未合成的影片片段");
    }
}
