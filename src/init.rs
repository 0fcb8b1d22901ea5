use env_logger::Env;

/// 初始化 logger（預設等級 info，可用 `RUST_LOG` 覆寫）
pub fn init() {
    // 重複初始化（例如測試中）時忽略錯誤
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}
