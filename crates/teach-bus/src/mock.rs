//! Mock 舵机总线
//!
//! 用于测试和模拟器的内存总线。`MockBus` 可 `Clone`，
//! 克隆出的句柄共享同一份状态，测试可以在引擎运行时检查写入记录。
//!
//! # 读取行为
//!
//! 1. 拔出（`unplug`）后所有读写返回致命错误；注入的读取失败其次（`fail_next_reads`）
//! 2. 脚本队列非空时按顺序返回（`push_positions`）
//! 3. 设置了运动函数时按读取序号生成（`with_motion`）
//! 4. 否则返回当前位置（从臂模式下跟随 `Goal_Position`）

use crate::{BusDeviceError, BusDeviceErrorKind, BusError, ServoBus};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use teach_protocol::{JointVector, Register, RegisterValue};

type MotionFn = Box<dyn FnMut(u64) -> JointVector + Send>;

struct MockState {
    joint_count: usize,
    connected: bool,
    present: JointVector,
    script: VecDeque<JointVector>,
    motion: Option<MotionFn>,
    registers: HashMap<Register, JointVector>,
    writes: Vec<(Register, RegisterValue)>,
    read_count: u64,
    fail_reads: usize,
    fail_writes: usize,
    fail_connect: bool,
    unplugged: bool,
    io_delay: Duration,
}

/// 内存舵机总线
#[derive(Clone)]
pub struct MockBus {
    inner: Arc<Mutex<MockState>>,
}

impl MockBus {
    /// 创建新的 Mock 总线，所有舵机初始位于 `initial`
    pub fn new(joint_count: usize, initial: i32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                joint_count,
                connected: false,
                present: JointVector::splat(initial, joint_count),
                script: VecDeque::new(),
                motion: None,
                registers: HashMap::new(),
                writes: Vec::new(),
                read_count: 0,
                fail_reads: 0,
                fail_writes: 0,
                fail_connect: false,
                unplugged: false,
                io_delay: Duration::ZERO,
            })),
        }
    }

    /// 以运动函数驱动读取结果（参数为读取序号）
    pub fn with_motion<F>(self, motion: F) -> Self
    where
        F: FnMut(u64) -> JointVector + Send + 'static,
    {
        self.inner.lock().motion = Some(Box::new(motion));
        self
    }

    /// 追加脚本位置（按读取顺序返回）
    pub fn push_positions<I>(&self, positions: I)
    where
        I: IntoIterator<Item = JointVector>,
    {
        self.inner.lock().script.extend(positions);
    }

    /// 接下来 `n` 次读取返回错误
    pub fn fail_next_reads(&self, n: usize) {
        self.inner.lock().fail_reads = n;
    }

    /// 接下来 `n` 次写入返回错误
    pub fn fail_next_writes(&self, n: usize) {
        self.inner.lock().fail_writes = n;
    }

    /// 连接时返回错误
    pub fn fail_connect(&self) {
        self.inner.lock().fail_connect = true;
    }

    /// 模拟线缆拔出：之后所有读写都返回 `NoDevice`
    pub fn unplug(&self) {
        self.inner.lock().unplugged = true;
    }

    /// 重新接上线缆
    pub fn replug(&self) {
        self.inner.lock().unplugged = false;
    }

    /// 每次读写的模拟 IO 延迟
    pub fn set_io_delay(&self, delay: Duration) {
        self.inner.lock().io_delay = delay;
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    pub fn read_count(&self) -> u64 {
        self.inner.lock().read_count
    }

    /// 当前位置
    pub fn present(&self) -> JointVector {
        self.inner.lock().present.clone()
    }

    /// 所有成功写入的记录
    pub fn writes(&self) -> Vec<(Register, RegisterValue)> {
        self.inner.lock().writes.clone()
    }

    /// 所有成功写入的 `Goal_Position`
    pub fn goal_positions(&self) -> Vec<JointVector> {
        self.inner
            .lock()
            .writes
            .iter()
            .filter_map(|(register, value)| match (register, value) {
                (Register::GoalPosition, RegisterValue::PerJoint(v)) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// 寄存器最近一次写入的值（已展开为逐舵机）
    pub fn register(&self, register: Register) -> Option<JointVector> {
        self.inner.lock().registers.get(&register).cloned()
    }

    pub fn clear_writes(&self) {
        self.inner.lock().writes.clear();
    }

    fn unplugged_error() -> BusError {
        BusError::Device(BusDeviceError::new(BusDeviceErrorKind::NoDevice, "mock device unplugged"))
    }

    fn injected_error(op: &str) -> BusError {
        BusError::Device(BusDeviceError::new(
            BusDeviceErrorKind::InvalidResponse,
            format!("injected {} failure", op),
        ))
    }
}

impl ServoBus for MockBus {
    fn connect(&mut self) -> Result<(), BusError> {
        let mut state = self.inner.lock();
        if state.fail_connect {
            return Err(BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::NotFound,
                "mock port not found",
            )));
        }
        state.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BusError> {
        self.inner.lock().connected = false;
        Ok(())
    }

    fn joint_count(&self) -> usize {
        self.inner.lock().joint_count
    }

    fn read(&mut self, register: Register) -> Result<JointVector, BusError> {
        let delay = self.inner.lock().io_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut guard = self.inner.lock();
        let state = &mut *guard;
        if state.unplugged {
            return Err(Self::unplugged_error());
        }
        if state.fail_reads > 0 {
            state.fail_reads -= 1;
            return Err(Self::injected_error("read"));
        }

        if register != Register::PresentPosition {
            let joint_count = state.joint_count;
            return Ok(state
                .registers
                .get(&register)
                .cloned()
                .unwrap_or_else(|| JointVector::splat(0, joint_count)));
        }

        let index = state.read_count;
        state.read_count += 1;

        if let Some(next) = state.script.pop_front() {
            state.present = next;
        } else if let Some(motion) = state.motion.as_mut() {
            state.present = motion(index);
        }

        Ok(state.present.clone())
    }

    fn write(&mut self, register: Register, value: RegisterValue) -> Result<(), BusError> {
        let delay = self.inner.lock().io_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.inner.lock();
        if state.unplugged {
            return Err(Self::unplugged_error());
        }
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(Self::injected_error("write"));
        }

        if register.is_read_only() {
            return Err(BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::InvalidResponse,
                format!("{} is read-only", register),
            )));
        }

        let expanded = value.expand(state.joint_count)?;
        if register == Register::GoalPosition {
            // 从臂：理想跟随目标位置
            state.present = expanded.clone();
        }
        tracing::trace!("mock write {} = {}", register, expanded);
        state.registers.insert(register, expanded);
        state.writes.push((register, value));
        Ok(())
    }
}
