//! 硬件相关常量定义
//!
//! 集中定义所有硬件相关的常量，避免在代码中散落"魔法数"。

/// 12 位编码器的最小位置值
pub const POSITION_MIN: i32 = 0;

/// 12 位编码器的最大位置值
pub const POSITION_MAX: i32 = 4095;

/// 默认加速度寄存器值（回放、带镜像录制前写入从臂）
pub const DEFAULT_ACCELERATION: i32 = 30;

/// 基准速度寄存器值（回放时乘以速度倍率）
pub const BASE_GOAL_SPEED: i32 = 8000;

/// 扭矩开启
pub const TORQUE_ON: i32 = 1;

/// 扭矩关闭（机械臂可被拖动）
pub const TORQUE_OFF: i32 = 0;
