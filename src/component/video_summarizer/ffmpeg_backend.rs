//! 以 ffmpeg / ffprobe 指令實作的媒體後端
//!
//! 每個 handle 對應暫存資料夾中的一個檔案，釋放時刪除；
//! 後端被丟棄時整個暫存資料夾一併清除。

use super::backend::{
    AudioHandle, ClipHandle, EncodeOptions, MediaBackend, MediaHandle, SourceProfile, TimeRange,
};
use crate::tools::{FfmpegCommand, get_video_info};
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

/// 中間檔的編碼參數（畫質優先，之後還會再編碼一次）
const INTERMEDIATE_VIDEO_ARGS: [&str; 8] = [
    "-c:v", "libx264", "-preset", "veryfast", "-crf", "18", "-pix_fmt", "yuv420p",
];

/// libx264 需要偶數寬高
const EVEN_DIMENSIONS_FILTER: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2,setsar=1";

pub struct FfmpegBackend {
    work_dir: TempDir,
}

impl FfmpegBackend {
    pub fn new() -> Result<Self> {
        let work_dir = tempfile::Builder::new()
            .prefix(".video_summary_")
            .tempdir()
            .context("無法建立暫存資料夾")?;
        debug!("暫存資料夾: {}", work_dir.path().display());
        Ok(Self { work_dir })
    }

    /// 在指定資料夾下建立暫存資料夾（例如與輸出檔同一個磁碟）
    pub fn new_in(parent: &Path) -> Result<Self> {
        let work_dir = tempfile::Builder::new()
            .prefix(".video_summary_")
            .tempdir_in(parent)
            .with_context(|| format!("無法在 {} 建立暫存資料夾", parent.display()))?;
        debug!("暫存資料夾: {}", work_dir.path().display());
        Ok(Self { work_dir })
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    fn clip_path(&self, id: Uuid) -> PathBuf {
        self.work_dir.path().join(format!("clip_{id}.mkv"))
    }

    fn audio_path(&self, id: Uuid) -> PathBuf {
        self.work_dir.path().join(format!("audio_{id}.mka"))
    }

    fn handle_path(&self, handle: &MediaHandle) -> PathBuf {
        match handle {
            MediaHandle::Clip(clip) => self.clip_path(clip.id()),
            MediaHandle::Audio(audio) => self.audio_path(audio.id()),
        }
    }

    /// 執行指令並確認輸出檔存在；失敗時清掉殘留檔案
    fn produce(command: &FfmpegCommand, output: &Path) -> Result<()> {
        if let Err(e) = command.run() {
            remove_if_exists(output);
            return Err(e);
        }
        if !output.exists() {
            bail!("輸出檔案未建立: {}", output.display());
        }
        Ok(())
    }
}

fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("已刪除 {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("無法刪除暫存檔 {}: {e}", path.display()),
    }
}

/// 兩段式 seek：`-ss` 在 `-i` 前快速跳到關鍵幀附近，`-i` 後再精準定位
pub fn split_seek(start: f64) -> (f64, f64) {
    let coarse = (start - SEEK_MARGIN).max(0.0);
    (coarse, start - coarse)
}

/// 調整長度的 setpts 係數
pub fn rescale_filter(current: f64, target: f64) -> String {
    format!("setpts={:.6}*PTS", target / current)
}

/// 向上取偶數
const fn even(value: u32) -> u32 {
    value + value % 2
}

/// compose 模式串接：每段置中貼在最大尺寸的黑底畫布上
pub fn compose_concat_filter(sizes: &[(u32, u32)]) -> String {
    let width = even(sizes.iter().map(|(w, _)| *w).max().unwrap_or(2));
    let height = even(sizes.iter().map(|(_, h)| *h).max().unwrap_or(2));

    let mut filter = String::new();
    for i in 0..sizes.len() {
        filter.push_str(&format!(
            "[{i}:v]pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:black,setsar=1,format=yuv420p[v{i}];"
        ));
    }
    for i in 0..sizes.len() {
        filter.push_str(&format!("[v{i}]"));
    }
    filter.push_str(&format!("concat=n={}:v=1:a=0[outv]", sizes.len()));
    filter
}

impl MediaBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<SourceProfile> {
        let info = get_video_info(path)?;
        debug!(
            "影片資訊: {:.2}s, {}x{}, {:.2} fps, audio={}",
            info.duration_seconds, info.width, info.height, info.frame_rate, info.has_audio
        );

        Ok(SourceProfile::new(
            path,
            info.duration_seconds,
            info.frame_rate,
            info.width,
            info.height,
            info.has_audio,
        )?)
    }

    fn slice(&self, profile: &SourceProfile, range: TimeRange) -> Result<ClipHandle> {
        let clip = ClipHandle::new(range.duration());
        let output = self.clip_path(clip.id());
        let (coarse, fine) = split_seek(range.start());

        let mut command = FfmpegCommand::new();
        if coarse > 0.0 {
            command = command.seek(coarse);
        }
        command = command.input(profile.path());
        if fine > 0.0 {
            command = command.seek(fine);
        }
        let command = command
            .duration(range.duration())
            .args(["-map", "0:v:0", "-an", "-sn", "-dn", "-vf", EVEN_DIMENSIONS_FILTER])
            .args(INTERMEDIATE_VIDEO_ARGS)
            .output(&output);

        Self::produce(&command, &output)
            .with_context(|| format!("無法擷取片段 {range}"))?;
        Ok(clip)
    }

    fn rescale(&self, clip: &ClipHandle, new_duration: f64) -> Result<ClipHandle> {
        let rescaled = ClipHandle::new(new_duration);
        let output = self.clip_path(rescaled.id());

        let command = FfmpegCommand::new()
            .input(&self.clip_path(clip.id()))
            .args([
                "-filter:v".to_string(),
                rescale_filter(clip.duration_seconds(), new_duration),
                "-an".to_string(),
            ])
            .duration(new_duration)
            .args(INTERMEDIATE_VIDEO_ARGS)
            .output(&output);

        Self::produce(&command, &output).with_context(|| {
            format!(
                "無法調整片段長度 {:.3}s → {new_duration:.3}s",
                clip.duration_seconds()
            )
        })?;
        Ok(rescaled)
    }

    fn concatenate(&self, clips: &[&ClipHandle]) -> Result<ClipHandle> {
        if clips.is_empty() {
            bail!("沒有可串接的片段");
        }

        let mut sizes = Vec::with_capacity(clips.len());
        let mut command = FfmpegCommand::new();
        for clip in clips {
            let path = self.clip_path(clip.id());
            let info = get_video_info(&path)
                .with_context(|| format!("無法讀取片段資訊: {}", path.display()))?;
            sizes.push((info.width, info.height));
            command = command.input(&path);
        }

        let total: f64 = clips.iter().map(|c| c.duration_seconds()).sum();
        let combined = ClipHandle::new(total);
        let output = self.clip_path(combined.id());

        let command = command
            .args([
                "-filter_complex".to_string(),
                compose_concat_filter(&sizes),
                "-map".to_string(),
                "[outv]".to_string(),
            ])
            .args(INTERMEDIATE_VIDEO_ARGS)
            .output(&output);

        Self::produce(&command, &output)
            .with_context(|| format!("無法串接 {} 個片段", clips.len()))?;
        Ok(combined)
    }

    fn trim_audio(&self, profile: &SourceProfile, range: TimeRange) -> Result<Option<AudioHandle>> {
        if !profile.has_audio() {
            return Ok(None);
        }

        let audio = AudioHandle::new(range.duration());
        let output = self.audio_path(audio.id());

        let mut command = FfmpegCommand::new().input(profile.path());
        if range.start() > 0.0 {
            command = command.seek(range.start());
        }
        let command = command
            .duration(range.duration())
            .args(["-map", "0:a:0", "-vn", "-sn", "-dn", "-c:a", "flac"])
            .output(&output);

        Self::produce(&command, &output)
            .with_context(|| format!("無法裁切音訊 {range}"))?;
        Ok(Some(audio))
    }

    fn attach_audio(&self, clip: &ClipHandle, audio: &AudioHandle) -> Result<ClipHandle> {
        let attached = ClipHandle::new(clip.duration_seconds());
        let output = self.clip_path(attached.id());

        let command = FfmpegCommand::new()
            .input(&self.clip_path(clip.id()))
            .input(&self.audio_path(audio.id()))
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c", "copy"])
            .output(&output);

        Self::produce(&command, &output).context("無法合併音訊")?;
        Ok(attached)
    }

    fn encode(&self, clip: &ClipHandle, output_path: &Path, options: &EncodeOptions) -> Result<()> {
        let command = FfmpegCommand::new()
            .input(&self.clip_path(clip.id()))
            .args(["-map", "0:v:0", "-map", "0:a:0?"])
            .args([
                "-c:v".to_string(),
                options.video_codec.clone(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-c:a".to_string(),
                options.audio_codec.clone(),
                "-r".to_string(),
                format!("{:.3}", options.fps),
            ])
            .output(output_path);

        Self::produce(&command, output_path)
    }

    fn release(&self, handle: MediaHandle) {
        remove_if_exists(&self.handle_path(&handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_seek() {
        assert_eq!(split_seek(0.0), (0.0, 0.0));
        assert_eq!(split_seek(1.5), (0.0, 1.5));
        assert_eq!(split_seek(20.0), (18.0, 2.0));
    }

    #[test]
    fn test_rescale_filter() {
        assert_eq!(rescale_filter(3.0, 6.0), "setpts=2.000000*PTS");
        assert_eq!(rescale_filter(4.0, 1.0), "setpts=0.250000*PTS");
    }

    #[test]
    fn test_compose_concat_filter_pads_to_largest() {
        let filter = compose_concat_filter(&[(640, 360), (1279, 720)]);

        assert!(filter.starts_with("[0:v]pad=1280:720:(ow-iw)/2:(oh-ih)/2:black"));
        assert!(filter.contains("[1:v]pad=1280:720"));
        assert!(filter.ends_with("[v0][v1]concat=n=2:v=1:a=0[outv]"));
    }

    #[test]
    fn test_release_removes_file_and_is_idempotent() {
        let backend = FfmpegBackend::new().unwrap();
        let clip = ClipHandle::new(3.0);
        let id = clip.id();
        let path = backend.clip_path(id);
        fs::write(&path, b"clip").unwrap();

        backend.release(MediaHandle::from(clip));
        assert!(!path.exists());

        // 再釋放一次不應出錯
        backend.release(MediaHandle::Clip(ClipHandle::new(1.0)));
    }

    #[test]
    fn test_work_dir_removed_on_drop() {
        let backend = FfmpegBackend::new().unwrap();
        let dir = backend.work_dir().to_path_buf();
        assert!(dir.is_dir());

        drop(backend);
        assert!(!dir.exists());
    }
}
