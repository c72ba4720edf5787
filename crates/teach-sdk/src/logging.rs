//! 日志初始化

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` 未设置时的默认过滤规则
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 安装 `tracing-subscriber` fmt 输出
///
/// 优先使用 `RUST_LOG`；重复调用时保持第一次的设置。
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // 已有全局 subscriber 时忽略
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init_logging();
        init_logging();
        tracing::info!("logging initialised");
    }
}
