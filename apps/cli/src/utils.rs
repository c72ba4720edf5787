//! CLI 辅助函数

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use teach_sdk::prelude::*;
use tracing::info;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Ctrl-C 停止标志
///
/// 进程内只能注册一次信号处理器（每条命令调用一次）。
pub fn stop_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal, stopping...");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl-C handler")?;
    Ok(flag)
}

/// 等待结束条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 达到指定时长
    Elapsed,
    /// 用户按下 Ctrl-C
    Interrupted,
    /// 会话自行结束
    Finished,
}

/// 阻塞直到时长到达、Ctrl-C 或会话结束
///
/// `duration` 为 `None` 时只等待 Ctrl-C / 会话结束。
pub fn wait_for_stop<T>(
    handle: &SessionHandle<T>,
    duration: Option<Duration>,
    stop: &AtomicBool,
) -> WaitOutcome {
    let start = Instant::now();
    loop {
        if stop.load(Ordering::SeqCst) {
            return WaitOutcome::Interrupted;
        }
        if handle.is_finished() {
            return WaitOutcome::Finished;
        }
        if duration.is_some_and(|limit| start.elapsed() >= limit) {
            return WaitOutcome::Elapsed;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// 0 表示不限时（超出 `Duration` 表示范围同样视为不限时）
pub fn duration_from_secs(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// 读取配置（文件缺失或无效时回退默认值）
pub fn load_config(path: &Path) -> TeachConfig {
    let config = TeachConfig::load_or_default(path);
    info!(
        "Config: {} arm(s), {} joints, sample interval {:.3}s",
        if config.layout.is_dual() { 2 } else { 1 },
        config.joint_count(),
        config.sample_interval
    );
    config
}

/// 读取动作库并报告被丢弃的记录
pub fn load_library(path: &Path) -> Result<ActionLibrary> {
    let report = ActionLibrary::load_from_file(path)
        .with_context(|| format!("Failed to load action library {}", path.display()))?;
    for record in &report.rejected {
        eprintln!("⚠️  Skipped malformed entry: {}", record);
    }
    Ok(report.into_library())
}
