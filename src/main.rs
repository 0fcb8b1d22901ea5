use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use video_summarizer::component::video_summarizer::{
    Diagnostics, FfmpegBackend, SummaryReport, SummaryRequest, VideoSummarizer,
};
use video_summarizer::config::{Config, add_recent_path, save_settings};
use video_summarizer::init;
use video_summarizer::signal::setup_shutdown_signal;
use video_summarizer::tools::{ensure_parent_directory_exists, validate_file_exists};

/// 從影片中均勻取樣片段，合成固定長度的摘要影片
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// 來源影片（未指定時會詢問）
    input: Option<PathBuf>,

    /// 輸出路徑（預設為 `<檔名>_summary.<副檔名>`）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 取樣片段數量
    #[arg(short = 'n', long = "segments")]
    segment_count: Option<usize>,

    /// 每個片段長度（秒）
    #[arg(short = 'd', long)]
    segment_duration: Option<f64>,

    /// 摘要影片總長度（秒）
    #[arg(short = 't', long)]
    summary_duration: Option<f64>,

    /// 依序擷取片段（不使用平行處理）
    #[arg(long)]
    sequential: bool,

    /// 將本次參數存為預設值
    #[arg(long)]
    save_defaults: bool,
}

impl Cli {
    fn request(&self, config: &Config) -> SummaryRequest {
        let defaults = &config.settings.summary;
        SummaryRequest {
            segment_count: self.segment_count.unwrap_or(defaults.segment_count),
            segment_duration: self.segment_duration.unwrap_or(defaults.segment_duration),
            summary_duration: self.summary_duration.unwrap_or(defaults.summary_duration),
        }
    }
}

fn main() -> ExitCode {
    init::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => {
            info!("程式正常結束");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("執行失敗: {e:#}");
            eprintln!("{} {e:#}", style("錯誤:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let shutdown_signal = setup_shutdown_signal()?;
    let mut config = Config::new();
    let request = cli.request(&config);

    let mut run_config = config.clone();
    if cli.sequential {
        run_config.settings.extraction.parallel = false;
    }

    let input = match &cli.input {
        Some(path) => path.clone(),
        None => prompt_input_path(&config)?,
    };
    validate_file_exists(&input)?;

    let backend = match &cli.output {
        Some(output) => {
            ensure_parent_directory_exists(output)?;
            FfmpegBackend::new_in(parent_or_current(output))?
        }
        None => FfmpegBackend::new()?,
    };

    let summarizer =
        VideoSummarizer::new(&backend, run_config, shutdown_signal).interactive(true);
    let report = match summarizer.summarize(&input, cli.output.as_deref(), &request) {
        Ok(report) => report,
        Err(failure) => {
            print_warnings(&failure.diagnostics);
            return Err(failure.into());
        }
    };
    print_report(&report);

    add_recent_path(&mut config.settings, &input.to_string_lossy());
    if cli.save_defaults {
        config.settings.summary.segment_count = request.segment_count;
        config.settings.summary.segment_duration = request.segment_duration;
        config.settings.summary.summary_duration = request.summary_duration;
        if cli.sequential {
            config.settings.extraction.parallel = false;
        }
    }
    if let Err(e) = save_settings(&config.settings) {
        warn!("無法儲存設定: {e:#}");
    }

    Ok(())
}

fn prompt_input_path(config: &Config) -> Result<PathBuf> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme).with_prompt("請輸入影片路徑");
    if let Some(recent) = config.settings.recent_paths.first() {
        input = input.default(recent.clone());
    }

    let path = input.interact_text().context("無法讀取輸入")?;
    Ok(PathBuf::from(path.trim()))
}

fn parent_or_current(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn print_report(report: &SummaryReport) {
    let artifact = &report.artifact;

    println!("\n{}", style("=== 摘要完成 ===").cyan().bold());
    println!(
        "{} {}",
        style("輸出檔案:").green(),
        artifact.output_path.display()
    );
    println!(
        "{} {:.2} 秒（{} 個片段）",
        style("影片長度:").green(),
        artifact.duration_seconds,
        report
            .plan
            .len()
            .saturating_sub(report.diagnostics.skipped_segments())
    );
    println!(
        "{} {}",
        style("音訊:").green(),
        if artifact.has_audio { "有" } else { "無" }
    );

    print_warnings(&report.diagnostics);
}

fn print_warnings(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }

    println!("\n{}", style("警告:").yellow().bold());
    for warning in diagnostics.warnings() {
        println!("  {} {warning}", style("•").yellow());
    }
}
