//! 关节位置向量
//!
//! `JointVector` 按舵机顺序存储一组整数位置（编码器计数），
//! 长度等于配置中的舵机数量。采样点（waypoint）即一个 `JointVector`，
//! 其身份由在序列中的下标隐式给出。
//!
//! ```rust
//! use teach_protocol::{JointVector, PositionRange};
//!
//! let a = JointVector::from([2048, 1024, 3000]);
//! let b = JointVector::from([2100, 1000, 2500]);
//!
//! assert_eq!(a.max_abs_diff(&b), Some(500));
//! assert!(a.validate(&PositionRange::default()).is_ok());
//! ```

use crate::{POSITION_MAX, POSITION_MIN, ProtocolError};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Index;

/// 关节位置向量（内联存储最多 8 个舵机，超过时退化为堆分配）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct JointVector(SmallVec<[i32; 8]>);

impl JointVector {
    /// 创建新的关节向量
    pub fn new(values: SmallVec<[i32; 8]>) -> Self {
        JointVector(values)
    }

    /// 所有舵机取同一值
    pub fn splat(value: i32, joint_count: usize) -> Self {
        JointVector(SmallVec::from_elem(value, joint_count))
    }

    /// 舵机数量
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, i32> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.0.to_vec()
    }

    /// 逐关节最大绝对差
    ///
    /// 长度不一致时返回 `None`。
    pub fn max_abs_diff(&self, other: &JointVector) -> Option<u32> {
        if self.len() != other.len() {
            return None;
        }

        Some(
            self.iter()
                .zip(other.iter())
                .map(|(&a, &b)| (i64::from(b) - i64::from(a)).unsigned_abs() as u32)
                .max()
                .unwrap_or(0),
        )
    }

    /// 校验所有关节位置都在设备有效范围内
    pub fn validate(&self, range: &PositionRange) -> Result<(), ProtocolError> {
        if self.is_empty() {
            return Err(ProtocolError::EmptyVector);
        }

        for (index, &value) in self.iter().enumerate() {
            if !range.contains(value) {
                return Err(ProtocolError::PositionOutOfRange {
                    index,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Ok(())
    }

    /// 校验舵机数量
    pub fn expect_len(&self, joint_count: usize) -> Result<(), ProtocolError> {
        if self.len() != joint_count {
            return Err(ProtocolError::JointCountMismatch {
                expected: joint_count,
                actual: self.len(),
            });
        }
        Ok(())
    }
}

impl Index<usize> for JointVector {
    type Output = i32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<i32>> for JointVector {
    fn from(values: Vec<i32>) -> Self {
        JointVector(SmallVec::from_vec(values))
    }
}

impl From<&[i32]> for JointVector {
    fn from(values: &[i32]) -> Self {
        JointVector(SmallVec::from_slice(values))
    }
}

impl<const N: usize> From<[i32; N]> for JointVector {
    fn from(values: [i32; N]) -> Self {
        JointVector(values.into_iter().collect())
    }
}

impl FromIterator<i32> for JointVector {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        JointVector(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a JointVector {
    type Item = &'a i32;
    type IntoIter = std::slice::Iter<'a, i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for JointVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

/// 设备有效位置范围（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionRange {
    pub min: i32,
    pub max: i32,
}

impl PositionRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for PositionRange {
    /// 12 位编码器：0..=4095
    fn default() -> Self {
        Self::new(POSITION_MIN, POSITION_MAX)
    }
}
