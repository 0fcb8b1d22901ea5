use super::backend::{EncodeOptions, MediaBackend, release_all};
use super::clip_realizer::ClipRealizer;
use super::diagnostics::Diagnostics;
use super::segment_planner::{SamplingPlan, plan};
use super::summary_composer::{ComposeRequest, SummaryArtifact, compose};
use crate::config::Config;
use crate::error::{SummaryError, SummaryResult};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::error::Error as _;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 一次摘要的參數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRequest {
    pub segment_count: usize,
    pub segment_duration: f64,
    pub summary_duration: f64,
}

impl SummaryRequest {
    pub fn validate(&self) -> SummaryResult<()> {
        if self.segment_count == 0 {
            return Err(SummaryError::invalid_input("片段數量必須大於 0"));
        }
        for (name, value) in [
            ("片段長度", self.segment_duration),
            ("摘要長度", self.summary_duration),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SummaryError::invalid_input(format!(
                    "{name} 必須大於 0（目前為 {value}）"
                )));
            }
        }
        Ok(())
    }
}

/// 摘要結果：輸出檔、取樣計畫與過程中的警告
#[derive(Debug)]
pub struct SummaryReport {
    pub artifact: SummaryArtifact,
    pub plan: SamplingPlan,
    pub diagnostics: Diagnostics,
}

/// 摘要失敗：錯誤本身，以及失敗前已建立的取樣計畫與警告
///
/// `plan` 在取樣計畫建立前就失敗時為 `None`。
#[derive(Debug)]
pub struct SummaryFailure {
    pub error: SummaryError,
    pub plan: Option<SamplingPlan>,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for SummaryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for SummaryFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

/// 預設輸出路徑：`<檔名>_summary.<副檔名>`，與來源放在同一個資料夾
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let file_stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    let file_name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{file_stem}_summary.{ext}"),
        None => format!("{file_stem}_summary"),
    };
    input.with_file_name(file_name)
}

/// 影片摘要產生器
///
/// 四階段流程：
/// A. 讀取影片資訊
/// B. 建立取樣計畫
/// C. 擷取片段（可平行）
/// D. 合成並編碼
pub struct VideoSummarizer<'a> {
    backend: &'a dyn MediaBackend,
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
    interactive: bool,
}

impl<'a> VideoSummarizer<'a> {
    pub fn new(
        backend: &'a dyn MediaBackend,
        config: Config,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            backend,
            config,
            shutdown_signal,
            interactive: false,
        }
    }

    /// 顯示各階段進度與進度條
    #[must_use]
    pub const fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// 執行摘要流程
    ///
    /// 失敗時同樣回傳已建立的取樣計畫與累積的警告，
    /// 呼叫端可以據此說明失敗原因或調整參數重試。
    pub fn summarize(
        &self,
        input: &Path,
        output: Option<&Path>,
        request: &SummaryRequest,
    ) -> Result<SummaryReport, SummaryFailure> {
        let mut diagnostics = Diagnostics::new();
        let mut sampling = None;

        match self.run_stages(input, output, request, &mut diagnostics, &mut sampling) {
            Ok((artifact, plan)) => Ok(SummaryReport {
                artifact,
                plan,
                diagnostics,
            }),
            Err(error) => Err(SummaryFailure {
                error,
                plan: sampling,
                diagnostics,
            }),
        }
    }

    fn run_stages(
        &self,
        input: &Path,
        output: Option<&Path>,
        request: &SummaryRequest,
        diagnostics: &mut Diagnostics,
        plan_slot: &mut Option<SamplingPlan>,
    ) -> SummaryResult<(SummaryArtifact, SamplingPlan)> {
        request.validate()?;

        let output_path = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
        if output_path == input {
            return Err(SummaryError::invalid_input(format!(
                "輸出路徑不可與來源相同: {}",
                input.display()
            )));
        }

        // Stage A: 讀取影片資訊
        self.stage("A", "讀取影片資訊...");
        let profile = self
            .backend
            .open(input)
            .map_err(|source| SummaryError::SourceLoad {
                path: input.to_path_buf(),
                source,
            })?;
        self.stage_done(&format!(
            "{:.1}s, {}x{}, {:.2} fps{}",
            profile.duration_seconds(),
            profile.width(),
            profile.height(),
            profile.fps(),
            if profile.has_audio() { ", 含音訊" } else { "" }
        ));
        info!(
            "影片已載入: {} ({:.2}s)",
            input.display(),
            profile.duration_seconds()
        );
        self.check_shutdown()?;

        // Stage B: 取樣計畫
        self.stage("B", "建立取樣計畫...");
        let sampling = plan(
            profile.duration_seconds(),
            request.segment_count,
            request.segment_duration,
            diagnostics,
        )?;
        *plan_slot = Some(sampling.clone());
        self.stage_done(&format!(
            "{} 個片段（要求 {} 個）",
            sampling.len(),
            sampling.requested_count()
        ));

        // Stage C: 擷取片段
        self.stage("C", "擷取片段...");
        let clips = ClipRealizer::new(self.backend, &self.shutdown_signal)
            .parallel(self.config.settings.extraction.parallel)
            .progress(self.progress_bar(sampling.len()))
            .realize(&profile, &sampling, diagnostics)?;
        self.stage_done(&format!(
            "成功 {}, 失敗 {}",
            clips.len(),
            diagnostics.skipped_segments()
        ));

        if self.shutdown_signal.load(Ordering::SeqCst) {
            release_all(self.backend, clips);
            return Err(SummaryError::Cancelled);
        }

        // Stage D: 合成與編碼
        self.stage("D", "合成摘要影片...");
        let encode_options = EncodeOptions {
            video_codec: self.config.settings.encoder.video_codec.clone(),
            audio_codec: self.config.settings.encoder.audio_codec.clone(),
            fps: self.config.settings.encoder.fps.unwrap_or(profile.fps()),
        };
        let request = ComposeRequest {
            summary_duration: request.summary_duration,
            profile: &profile,
            output_path: &output_path,
            encode_options: &encode_options,
        };
        let artifact = compose(self.backend, clips, &request, diagnostics)?;
        self.stage_done("完成");

        Ok((artifact, sampling))
    }

    fn check_shutdown(&self) -> SummaryResult<()> {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return Err(SummaryError::Cancelled);
        }
        Ok(())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.interactive {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(len as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("    {spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        progress_bar
    }

    fn stage(&self, label: &str, message: &str) {
        if self.interactive {
            println!("  {} {message}", style(label).dim());
        }
    }

    fn stage_done(&self, message: &str) {
        if self.interactive {
            println!("    {} {message}", style("✓").green());
        }
    }
}
