//! 滑动平均平滑
//!
//! 保留最近 k 个原始采样，缓冲区满 k 个后输出逐关节算术平均（四舍五入到整数）。
//! 窗口为 0 或 1 时直接透传，用于低延迟的镜像录制。

use crate::interpolation::round_position;
use std::collections::VecDeque;
use teach_protocol::JointVector;

/// 默认平滑窗口
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;

/// 滑动平均滤波器
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    samples: VecDeque<JointVector>,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    /// 是否启用平滑
    pub fn is_enabled(&self) -> bool {
        self.window > 1
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// 推入一个原始采样，窗口已满时返回平滑后的值
    pub fn push(&mut self, sample: JointVector) -> Option<JointVector> {
        if !self.is_enabled() {
            return Some(sample);
        }

        // 舵机数量变化时旧采样没有意义
        if self.samples.front().is_some_and(|s| s.len() != sample.len()) {
            tracing::warn!(
                "Joint count changed ({} -> {}), resetting smoothing window",
                self.samples.front().map_or(0, |s| s.len()),
                sample.len()
            );
            self.reset();
        }

        self.samples.push_back(sample);
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }

        if self.samples.len() < self.window {
            return None;
        }

        Some(mean(self.samples.iter()))
    }

    /// 清空窗口（下一次输出需要重新攒满 k 个采样）
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

/// 逐关节算术平均，四舍五入到整数
///
/// 调用方保证所有向量长度一致且至少有一个。
pub fn mean<'a, I>(samples: I) -> JointVector
where
    I: IntoIterator<Item = &'a JointVector>,
{
    let mut sums: Vec<i64> = Vec::new();
    let mut count = 0usize;

    for sample in samples {
        if sums.is_empty() {
            sums.resize(sample.len(), 0);
        }
        for (sum, &v) in sums.iter_mut().zip(sample.iter()) {
            *sum += i64::from(v);
        }
        count += 1;
    }

    if count == 0 {
        return JointVector::default();
    }

    sums.into_iter()
        .map(|sum| round_position(sum as f64 / count as f64))
        .collect()
}
