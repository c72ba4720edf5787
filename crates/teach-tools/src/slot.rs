//! # 动作槽位
//!
//! 动作库共有 10 个槽位（1..=10），持久化时以十进制字符串作为 JSON 键。

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 最小槽位号
pub const SLOT_MIN: u8 = 1;

/// 最大槽位号
pub const SLOT_MAX: u8 = 10;

/// 槽位号无效
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid slot {0:?}: expected an integer in 1..=10")]
pub struct InvalidSlot(pub String);

/// 动作槽位（保证位于 1..=10）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u8);

impl Slot {
    pub fn new(value: u8) -> Result<Self, InvalidSlot> {
        if (SLOT_MIN..=SLOT_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidSlot(value.to_string()))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// 全部槽位（升序）
    pub fn all() -> impl Iterator<Item = Slot> {
        (SLOT_MIN..=SLOT_MAX).map(Slot)
    }

    /// 默认动作名 `Action_{slot}`
    pub fn default_name(self) -> String {
        format!("Action_{}", self.0)
    }
}

impl TryFrom<u8> for Slot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Slot {
    type Error = InvalidSlot;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| InvalidSlot(value.to_string()))
            .and_then(Self::new)
    }
}

impl FromStr for Slot {
    type Err = InvalidSlot;

    /// 允许首尾空白（"3"、" 3 "），不允许小数或符号以外的字符
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map_err(|_| InvalidSlot(s.to_string()))
            .and_then(|v| Self::try_from(v).map_err(|_| InvalidSlot(s.to_string())))
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 序列化为整数；作为 JSON 对象键时由 serde_json 转成字符串
impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        assert_eq!(Slot::new(1).unwrap().get(), 1);
        assert_eq!(Slot::new(10).unwrap().get(), 10);
        assert!(Slot::new(0).is_err());
        assert!(Slot::new(11).is_err());
        assert_eq!(Slot::all().count(), 10);
    }

    #[test]
    fn test_parse() {
        assert_eq!("3".parse::<Slot>().unwrap(), Slot::new(3).unwrap());
        assert_eq!(" 7 ".parse::<Slot>().unwrap(), Slot::new(7).unwrap());
        assert!("0".parse::<Slot>().is_err());
        assert!("-1".parse::<Slot>().is_err());
        assert!("300".parse::<Slot>().is_err());
        assert!("3.5".parse::<Slot>().is_err());
        assert!("abc".parse::<Slot>().is_err());
    }

    #[test]
    fn test_from_i64() {
        assert!(Slot::try_from(5i64).is_ok());
        assert!(Slot::try_from(-5i64).is_err());
        assert!(Slot::try_from(1000i64).is_err());
    }

    #[test]
    fn test_default_name() {
        assert_eq!(Slot::new(4).unwrap().default_name(), "Action_4");
        assert_eq!(Slot::new(4).unwrap().to_string(), "4");
    }
}
