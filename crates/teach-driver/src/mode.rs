//! 示教台工作模式定义
//!
//! 任一时刻恰好处于一种模式：`Idle`、`Recording`、`Mirroring`、`Playing`。
//! 非 Idle 模式之间互斥，由 [`ModeController`](crate::ModeController) 仲裁。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 示教台工作模式
///
/// # 状态转换
///
/// ```text
/// Idle --request--> {Recording | Mirroring | Playing} --stop / 自然结束--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Mode {
    /// 空闲（默认）
    #[default]
    Idle = 0,

    /// 录制：按采样间隔读取主臂位置
    Recording = 1,

    /// 镜像：主臂位置实时转发到从臂
    Mirroring = 2,

    /// 回放：从臂执行已保存的动作
    Playing = 3,
}

impl Mode {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Idle。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Recording,
            2 => Self::Mirroring,
            3 => Self::Playing,
            _ => Self::Idle,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Recording => "Recording",
            Mode::Mirroring => "Mirroring",
            Mode::Playing => "Playing",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 模式（原子版本，用于线程间共享）
///
/// 低 8 位存放 [`Mode`]，高位存放会话代数（generation）。
/// 每次进入非 Idle 模式代数加一，退出时必须携带同一代数，
/// 因此超时被强制复位后，迟到退出的旧工作线程不会覆盖新会话的状态。
#[derive(Debug, Default)]
pub struct AtomicMode {
    inner: AtomicU64,
}

impl AtomicMode {
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(pack(0, Mode::Idle)),
        }
    }

    /// 获取当前模式
    pub fn get(&self) -> Mode {
        unpack(self.inner.load(Ordering::Acquire)).1
    }

    /// 尝试从 Idle 进入 `mode`
    ///
    /// 成功返回新会话代数；非 Idle 时返回当前模式，状态不变。
    pub fn try_enter(&self, mode: Mode) -> Result<u64, Mode> {
        let mut current = self.inner.load(Ordering::Acquire);
        loop {
            let (generation, active) = unpack(current);
            if !active.is_idle() {
                return Err(active);
            }

            let next_generation = generation.wrapping_add(1) & GENERATION_MASK;
            match self.inner.compare_exchange_weak(
                current,
                pack(next_generation, mode),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(next_generation),
                Err(actual) => current = actual,
            }
        }
    }

    /// 会话 `generation` 退出，回到 Idle
    ///
    /// 只有当前会话仍是 `(generation, mode)` 时才生效，返回是否生效。
    pub fn release(&self, generation: u64, mode: Mode) -> bool {
        self.inner
            .compare_exchange(
                pack(generation, mode),
                pack(generation, Mode::Idle),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

const GENERATION_MASK: u64 = u64::MAX >> 8;

fn pack(generation: u64, mode: Mode) -> u64 {
    (generation << 8) | u64::from(mode.as_u8())
}

fn unpack(raw: u64) -> (u64, Mode) {
    (raw >> 8, Mode::from_u8((raw & 0xFF) as u8))
}
