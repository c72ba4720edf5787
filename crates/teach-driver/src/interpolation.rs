//! 缓动插值
//!
//! 在两个采样点之间生成中间关节向量。
//!
//! # 算法
//!
//! 二次缓动（ease-in-out quad）：
//! ```text
//! t' = 2t²                 (t < 0.5)
//! t' = 1 - (-2t + 2)² / 2  (t ≥ 0.5)
//! ```
//!
//! 第 i 个点（i ∈ [0, steps)）取 `t = i / (steps - 1)`，
//! 输出 `round(start + (end - start) * t')`，逐关节计算。
//!
//! # 步数选择
//!
//! | 最大关节差 | 步数 |
//! |-----------|------|
//! | < 100     | 3    |
//! | < 300     | 5    |
//! | ≥ 300     | 7    |
//!
//! # 示例
//!
//! ```rust
//! use teach_driver::interpolation::EasedSegment;
//! use teach_protocol::JointVector;
//!
//! let start = JointVector::from([0, 1000]);
//! let end = JointVector::from([400, 1000]);
//!
//! let segment = EasedSegment::auto(&start, &end).unwrap();
//! assert_eq!(segment.len(), 7);
//!
//! let frames: Vec<_> = segment.collect();
//! assert_eq!(frames.first(), Some(&start));
//! assert_eq!(frames.last(), Some(&end));
//! ```

use crate::error::DriverError;
use teach_protocol::{JointVector, ProtocolError};

/// 小跨度阈值（小于此值用 3 步）
pub const SMALL_MOVE_THRESHOLD: u32 = 100;

/// 中跨度阈值（小于此值用 5 步，否则 7 步）
pub const MEDIUM_MOVE_THRESHOLD: u32 = 300;

/// 二次缓动函数
///
/// 在 [0, 1] 上单调不减，`f(0) = 0`，`f(0.5) = 0.5`，`f(1) = 1`。
pub fn ease_in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// 根据最大关节差选择插值步数
pub fn step_count(max_diff: u32) -> usize {
    if max_diff < SMALL_MOVE_THRESHOLD {
        3
    } else if max_diff < MEDIUM_MOVE_THRESHOLD {
        5
    } else {
        7
    }
}

/// 位置取整（四舍六入五成双，与采样平滑保持一致）
#[inline]
pub fn round_position(value: f64) -> i32 {
    value.round_ties_even() as i32
}

/// 两点之间的缓动插值段
///
/// 按需生成插值点（Iterator），包含起点和终点。
#[derive(Debug, Clone)]
pub struct EasedSegment {
    start: JointVector,
    end: JointVector,
    steps: usize,
    index: usize,
}

impl EasedSegment {
    /// 创建插值段
    ///
    /// # 错误
    ///
    /// - `steps < 2`（`t = i / (steps - 1)` 无定义）
    /// - 起止向量长度不一致
    pub fn new(start: &JointVector, end: &JointVector, steps: usize) -> Result<Self, DriverError> {
        if steps < 2 {
            return Err(DriverError::InvalidParameter(format!(
                "interpolation needs at least 2 steps, got {}",
                steps
            )));
        }
        if start.len() != end.len() {
            return Err(ProtocolError::JointCountMismatch {
                expected: start.len(),
                actual: end.len(),
            }
            .into());
        }

        Ok(Self {
            start: start.clone(),
            end: end.clone(),
            steps,
            index: 0,
        })
    }

    /// 按最大关节差自动选择步数
    pub fn auto(start: &JointVector, end: &JointVector) -> Result<Self, DriverError> {
        let max_diff = start.max_abs_diff(end).ok_or(ProtocolError::JointCountMismatch {
            expected: start.len(),
            actual: end.len(),
        })?;
        Self::new(start, end, step_count(max_diff))
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// 计算第 `i` 个插值点
    pub fn point(&self, i: usize) -> JointVector {
        let t = i as f64 / (self.steps - 1) as f64;
        let eased = ease_in_out_quad(t);

        self.start
            .iter()
            .zip(self.end.iter())
            .map(|(&s, &e)| {
                let s = f64::from(s);
                let e = f64::from(e);
                round_position(s + (e - s) * eased)
            })
            .collect()
    }
}

impl Iterator for EasedSegment {
    type Item = JointVector;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.steps {
            return None;
        }
        let point = self.point(self.index);
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EasedSegment {}

/// 生成两点之间的全部插值点
pub fn interpolate(
    start: &JointVector,
    end: &JointVector,
    steps: usize,
) -> Result<Vec<JointVector>, DriverError> {
    Ok(EasedSegment::new(start, end, steps)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ease_fixed_points() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert!((ease_in_out_quad(0.25) - 0.125).abs() < 1e-12);
        assert!((ease_in_out_quad(0.75) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_step_table() {
        assert_eq!(step_count(0), 3);
        assert_eq!(step_count(50), 3);
        assert_eq!(step_count(99), 3);
        assert_eq!(step_count(100), 5);
        assert_eq!(step_count(150), 5);
        assert_eq!(step_count(299), 5);
        assert_eq!(step_count(300), 7);
        assert_eq!(step_count(500), 7);
    }

    #[test]
    fn test_three_step_segment() {
        let points = interpolate(&JointVector::from([0, 100]), &JointVector::from([60, 40]), 3)
            .unwrap();
        assert_eq!(
            points,
            vec![
                JointVector::from([0, 100]),
                JointVector::from([30, 70]),
                JointVector::from([60, 40]),
            ]
        );
    }

    #[test]
    fn test_auto_step_selection() {
        let start = JointVector::from([1000, 1000]);
        assert_eq!(EasedSegment::auto(&start, &JointVector::from([1050, 1000])).unwrap().len(), 3);
        assert_eq!(EasedSegment::auto(&start, &JointVector::from([1000, 1150])).unwrap().len(), 5);
        assert_eq!(EasedSegment::auto(&start, &JointVector::from([500, 1000])).unwrap().len(), 7);
    }

    #[test]
    fn test_invalid_steps() {
        let a = JointVector::from([0]);
        assert!(matches!(
            interpolate(&a, &a, 1),
            Err(DriverError::InvalidParameter(_))
        ));
        assert!(matches!(
            interpolate(&a, &a, 0),
            Err(DriverError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let err = EasedSegment::auto(&JointVector::from([0, 0]), &JointVector::from([0])).unwrap_err();
        assert!(matches!(err, DriverError::Protocol(_)));
    }

    #[test]
    fn test_round_ties_even() {
        assert_eq!(round_position(20.5), 20);
        assert_eq!(round_position(21.5), 22);
        assert_eq!(round_position(-0.4), 0);
    }

    proptest! {
        /// 首点等于起点，末点等于终点
        #[test]
        fn endpoints_preserved(
            a in proptest::collection::vec(0..4096i32, 1..8),
            offset in -4095..4095i32,
            steps in 2usize..12,
        ) {
            let start = JointVector::from(a.clone());
            let end: JointVector = a.iter().map(|v| (v + offset).clamp(0, 4095)).collect();
            let points = interpolate(&start, &end, steps).unwrap();

            prop_assert_eq!(points.len(), steps);
            prop_assert_eq!(&points[0], &start);
            prop_assert_eq!(&points[steps - 1], &end);
        }

        /// 缓动函数在 [0, 1] 上单调不减
        #[test]
        fn ease_monotonic(t1 in 0.0..=1.0f64, t2 in 0.0..=1.0f64) {
            let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            prop_assert!(ease_in_out_quad(lo) <= ease_in_out_quad(hi) + 1e-12);
        }

        /// 缓动函数值域为 [0, 1]
        #[test]
        fn ease_in_unit_range(t in 0.0..=1.0f64) {
            let v = ease_in_out_quad(t);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        /// 插值点逐关节落在起止之间
        #[test]
        fn points_between_endpoints(s in 0..4096i32, e in 0..4096i32, steps in 2usize..10) {
            let points = interpolate(&JointVector::from([s]), &JointVector::from([e]), steps).unwrap();
            for p in points {
                prop_assert!(p[0] >= s.min(e) && p[0] <= s.max(e));
            }
        }
    }
}
