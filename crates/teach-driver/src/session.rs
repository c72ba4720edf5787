//! 会话管理：模式控制器、取消令牌、会话句柄
//!
//! 一个前台控制线程 + 至多一个后台工作线程。
//!
//! - 取消是协作式的：工作线程每轮循环检查一次 [`CancelToken`]
//! - `stop` 发出取消后最多等待 `stop_timeout`（默认 1 秒）
//! - 超时后模式被强制复位为 Idle，并返回 [`DriverError::StopTimeout`]
//!
//! # 示例
//!
//! ```rust
//! use teach_driver::{Mode, ModeController};
//! use std::time::Duration;
//!
//! let controller = ModeController::new(Duration::from_secs(1));
//! let handle = controller
//!     .request(Mode::Mirroring, |cancel| {
//!         let mut ticks = 0u32;
//!         while !cancel.is_cancelled() {
//!             ticks += 1;
//!             std::thread::sleep(Duration::from_millis(1));
//!         }
//!         ticks
//!     })
//!     .unwrap();
//!
//! assert_eq!(controller.mode(), Mode::Mirroring);
//! let _ticks = controller.stop(handle).unwrap();
//! assert_eq!(controller.mode(), Mode::Idle);
//! ```

use crate::error::DriverError;
use crate::mode::{AtomicMode, Mode};
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 默认停止超时
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// 取消令牌
///
/// 前台调用 `cancel()`，工作线程每轮循环调用 `is_cancelled()`。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// 模式控制器
///
/// 保证系统内至多一个非 Idle 模式处于活动状态。
#[derive(Debug)]
pub struct ModeController {
    state: Arc<AtomicMode>,
    stop_timeout: Duration,
    /// 最近一次会话的取消令牌（供 `cancel_active` 使用）
    active: Mutex<Option<CancelToken>>,
}

impl ModeController {
    pub fn new(stop_timeout: Duration) -> Self {
        Self {
            state: Arc::new(AtomicMode::new()),
            stop_timeout,
            active: Mutex::new(None),
        }
    }

    /// 当前模式
    pub fn mode(&self) -> Mode {
        self.state.get()
    }

    pub fn is_idle(&self) -> bool {
        self.mode().is_idle()
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    /// 向当前会话发出取消信号（不需要句柄）
    ///
    /// 返回被取消的模式；Idle 时返回 `None`。
    pub fn cancel_active(&self) -> Option<Mode> {
        let mode = self.mode();
        if mode.is_idle() {
            return None;
        }
        if let Some(cancel) = self.active.lock().as_ref() {
            cancel.cancel();
        }
        Some(mode)
    }

    /// 轮询等待回到 Idle，超时返回 `false`
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// 请求进入 `mode`，并在专用工作线程上运行 `body`
    ///
    /// # 错误
    ///
    /// - `Busy`: 已有会话在运行（状态不变，已有会话不受影响）
    /// - `InvalidParameter`: 请求 `Idle`
    /// - `IoThread`: 线程创建失败（状态回滚为 Idle）
    pub fn request<T, F>(&self, mode: Mode, body: F) -> Result<SessionHandle<T>, DriverError>
    where
        T: Send + 'static,
        F: FnOnce(CancelToken) -> T + Send + 'static,
    {
        if mode.is_idle() {
            return Err(DriverError::InvalidParameter(
                "cannot request Idle as a session mode".to_string(),
            ));
        }

        let generation = self
            .state
            .try_enter(mode)
            .map_err(|active| DriverError::Busy { active })?;

        let cancel = CancelToken::new();
        *self.active.lock() = Some(cancel.clone());
        let (done_tx, done_rx) = bounded(1);

        let worker_cancel = cancel.clone();
        let worker_state = self.state.clone();
        let spawned = thread::Builder::new()
            .name(format!("teach-{}", mode.name().to_lowercase()))
            .spawn(move || {
                // panic 展开时同样会回到 Idle，并断开 done 通道
                let guard = ReleaseGuard {
                    state: worker_state,
                    generation,
                    mode,
                };
                let output = body(worker_cancel);
                drop(guard);
                let _ = done_tx.send(output);
            });

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.state.release(generation, mode);
                return Err(DriverError::IoThread(e.to_string()));
            },
        };

        info!("{} session #{} started", mode, generation);

        Ok(SessionHandle {
            mode,
            generation,
            cancel,
            done_rx,
            thread: Some(thread),
            started_at: Instant::now(),
        })
    }

    /// 停止会话并取回工作线程的输出
    ///
    /// # 错误
    ///
    /// - `StopTimeout`: 工作线程未在超时内退出（非致命，模式已强制复位为 Idle）
    /// - `WorkerPanicked`: 工作线程 panic
    pub fn stop<T>(&self, mut handle: SessionHandle<T>) -> Result<T, DriverError> {
        handle.cancel.cancel();

        match handle.done_rx.recv_timeout(self.stop_timeout) {
            Ok(output) => {
                handle.join_thread();
                info!(
                    "{} session #{} stopped after {:.2?}",
                    handle.mode,
                    handle.generation,
                    handle.started_at.elapsed()
                );
                Ok(output)
            },
            Err(RecvTimeoutError::Timeout) => {
                // 不再等待；线程句柄随 handle 丢弃而分离
                let forced = self.state.release(handle.generation, handle.mode);
                warn!(
                    "{} worker did not stop within {:?} (forced to Idle: {}); \
                     it may still be finishing bus IO",
                    handle.mode, self.stop_timeout, forced
                );
                Err(DriverError::StopTimeout {
                    mode: handle.mode,
                    waited: self.stop_timeout,
                })
            },
            Err(RecvTimeoutError::Disconnected) => {
                handle.join_thread();
                Err(DriverError::WorkerPanicked(handle.mode))
            },
        }
    }

    /// 等待会话自然结束（不发出取消）
    pub fn wait<T>(&self, mut handle: SessionHandle<T>) -> Result<T, DriverError> {
        match handle.done_rx.recv() {
            Ok(output) => {
                handle.join_thread();
                debug!("{} session #{} finished", handle.mode, handle.generation);
                Ok(output)
            },
            Err(_) => {
                handle.join_thread();
                Err(DriverError::WorkerPanicked(handle.mode))
            },
        }
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_TIMEOUT)
    }
}

/// 会话句柄
///
/// 由 [`ModeController::request`] 返回，交给 `stop` / `wait` 消费。
/// 直接丢弃句柄会发出取消信号，但不会等待工作线程退出。
#[must_use = "a session keeps running until it is stopped or waited on"]
pub struct SessionHandle<T> {
    mode: Mode,
    generation: u64,
    cancel: CancelToken,
    done_rx: Receiver<T>,
    thread: Option<JoinHandle<()>>,
    started_at: Instant,
}

impl<T> SessionHandle<T> {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 会话编号（每次进入非 Idle 模式递增）
    pub fn id(&self) -> u64 {
        self.generation
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// 工作线程是否已经退出
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// 只发出取消信号（不等待）
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn join_thread(&mut self) {
        if let Some(thread) = self.thread.take() {
            // 输出已经收到，线程即将退出
            let _ = thread.join();
        }
    }
}

impl<T> Drop for SessionHandle<T> {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel.cancel();
        }
    }
}

impl<T> std::fmt::Debug for SessionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("mode", &self.mode)
            .field("id", &self.generation)
            .field("elapsed", &self.started_at.elapsed())
            .finish()
    }
}

struct ReleaseGuard {
    state: Arc<AtomicMode>,
    generation: u64,
    mode: Mode,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.state.release(self.generation, self.mode);
    }
}
