//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 安装全局 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `VERBOSE_LOGGING` 选择 info/debug
pub fn init() {
    let verbose = std::env::var("VERBOSE_LOGGING")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);
    let default_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试里可能被重复调用，忽略重复安装的错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
