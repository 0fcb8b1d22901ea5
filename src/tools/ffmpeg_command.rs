use anyhow::{Context, Result, bail};
use log::debug;
use std::path::Path;
use std::process::Command;

/// ffmpeg 指令產生器
///
/// 預設帶 `-hide_banner -nostdin -loglevel error`，輸出時一律覆寫（`-y`）。
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    args: Vec<String>,
}

impl Default for FfmpegCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            args: ["-hide_banner", "-nostdin", "-loglevel", "error"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `-ss`，放在 `-i` 之前為快速跳轉，之後為精準定位
    #[must_use]
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format!("{seconds:.3}"))
    }

    #[must_use]
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format!("{seconds:.3}"))
    }

    #[must_use]
    pub fn input(self, path: &Path) -> Self {
        self.arg("-i").arg(path.to_string_lossy())
    }

    #[must_use]
    pub fn output(self, path: &Path) -> Self {
        self.arg("-y").arg(path.to_string_lossy())
    }

    #[must_use]
    pub fn as_args(&self) -> &[String] {
        &self.args
    }

    /// 執行並在失敗時回傳 stderr
    pub fn run(&self) -> Result<()> {
        debug!("ffmpeg {}", self.args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&self.args)
            .output()
            .context("無法執行 ffmpeg，請確認已安裝並在 PATH 中")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg 執行失敗 ({}): {}", output.status, stderr.trim());
        }

        Ok(())
    }
}
