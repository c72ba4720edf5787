//! # 动作库
//!
//! 槽位（1..=10）→ 命名采样点序列的持久化映射。
//!
//! ## 文件格式
//!
//! ```json
//! {
//!     "3": {
//!         "positions": [[2048, 1024], [2050, 1030]],
//!         "name": "wave",
//!         "timestamp": "2024-05-27 14:03:09"
//!     }
//! }
//! ```
//!
//! 加载是部分成功的：单个条目损坏只会被跳过并记入 [`LoadReport::rejected`]，
//! 不会丢失其余动作。

use crate::slot::{InvalidSlot, Slot};
use crate::timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use teach_protocol::{JointVector, PositionRange, ProtocolError};
use thiserror::Error;
use tracing::{info, warn};

/// 默认动作库文件名
pub const DEFAULT_LIBRARY_FILE: &str = "recorded_actions.json";

/// 动作库错误
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    InvalidSlot(#[from] InvalidSlot),

    /// 录制为空，拒绝保存
    #[error("Cannot save an empty recording")]
    EmptyRecording,

    /// 采样点不满足关节向量约束（关节数一致、位置在有效范围内）
    #[error("Invalid waypoint {index}: {source}")]
    InvalidWaypoint {
        index: usize,
        #[source]
        source: ProtocolError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 顶层不是 JSON 对象
    #[error("Action library must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// 单个条目未通过校验（被跳过）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    /// 原始 JSON 键
    pub key: String,
    pub reason: String,
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry {:?}: {}", self.key, self.reason)
    }
}

/// 已保存的动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub positions: Vec<JointVector>,
    pub name: String,
    #[serde(
        rename = "timestamp",
        default,
        with = "timestamp::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDateTime>,
}

impl Action {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 舵机数量（空动作返回 `None`）
    pub fn joint_count(&self) -> Option<usize> {
        self.positions.first().map(JointVector::len)
    }
}

/// 加载结果
#[derive(Debug, Default)]
pub struct LoadReport {
    pub library: ActionLibrary,
    /// 被跳过的条目
    pub rejected: Vec<MalformedRecord>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn into_library(self) -> ActionLibrary {
        self.library
    }
}

/// 动作库
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLibrary {
    actions: BTreeMap<Slot, Action>,
    range: PositionRange,
}

impl ActionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义位置范围校验（默认 0..=4095）
    pub fn with_range(range: PositionRange) -> Self {
        Self {
            actions: BTreeMap::new(),
            range,
        }
    }

    /// 保存动作到槽位（覆盖已有动作）
    ///
    /// - `slot` 必须在 1..=10
    /// - 空名称使用 `Action_{slot}`
    /// - 所有采样点关节数一致且位置在 `range` 内，否则拒绝（动作库不变）
    /// - 时间戳为当前本地时间
    pub fn save(
        &mut self,
        slot: u8,
        positions: Vec<JointVector>,
        name: Option<&str>,
    ) -> Result<&Action, LibraryError> {
        let slot = Slot::new(slot)?;
        if positions.is_empty() {
            return Err(LibraryError::EmptyRecording);
        }
        check_waypoints(&positions, &self.range)
            .map_err(|(index, source)| LibraryError::InvalidWaypoint { index, source })?;

        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => slot.default_name(),
        };

        let action = Action {
            positions,
            name,
            created_at: Some(timestamp::now()),
        };

        if let Some(old) = self.actions.get(&slot) {
            info!("Overwriting action {:?} in slot {}", old.name, slot);
        }
        info!("Saved action {:?} ({} waypoints) to slot {}", action.name, action.len(), slot);

        self.actions.insert(slot, action);
        Ok(&self.actions[&slot])
    }

    pub fn get(&self, slot: Slot) -> Option<&Action> {
        self.actions.get(&slot)
    }

    /// 按槽位升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &Action)> {
        self.actions.iter().map(|(slot, action)| (*slot, action))
    }

    pub fn slots(&self) -> Vec<Slot> {
        self.actions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// 序列化为 JSON（4 空格缩进）
    pub fn to_json_string(&self) -> Result<String, LibraryError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.actions.serialize(&mut serializer)?;
        // serde_json 只输出合法 UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// 从 JSON 文本加载（部分成功）
    ///
    /// 只有整个文档不是合法 JSON 对象时才返回错误。
    pub fn load(source: &str) -> Result<LoadReport, LibraryError> {
        Self::load_with_range(source, PositionRange::default())
    }

    /// 从 JSON 文本加载，并按 `range` 校验位置
    pub fn load_with_range(source: &str, range: PositionRange) -> Result<LoadReport, LibraryError> {
        let document: Value = serde_json::from_str(source)?;
        let entries = match document {
            Value::Object(entries) => entries,
            other => return Err(LibraryError::NotAnObject(json_type(&other))),
        };

        let mut report = LoadReport {
            library: Self::with_range(range),
            rejected: Vec::new(),
        };

        for (key, value) in entries {
            match parse_entry(&key, value, &range) {
                Ok((slot, action)) => {
                    if report.library.actions.contains_key(&slot) {
                        report.rejected.push(MalformedRecord {
                            key,
                            reason: format!("duplicate slot {}", slot),
                        });
                        continue;
                    }
                    report.library.actions.insert(slot, action);
                },
                Err(reason) => report.rejected.push(MalformedRecord { key, reason }),
            }
        }

        for record in &report.rejected {
            warn!("Skipping malformed action {}", record);
        }
        Ok(report)
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LibraryError> {
        let path = path.as_ref();
        let content = self.to_json_string()?;
        fs::write(path, content).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Action library saved to {}", path.display());
        Ok(())
    }

    /// 从文件加载
    ///
    /// 文件不存在时返回空动作库。
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<LoadReport, LibraryError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No action library at {}, starting empty", path.display());
                return Ok(LoadReport::default());
            },
            Err(source) => {
                return Err(LibraryError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            },
        };

        let report = Self::load(&content)?;
        info!(
            "Loaded {} action(s) from {} ({} skipped)",
            report.library.len(),
            path.display(),
            report.rejected.len()
        );
        Ok(report)
    }
}

/// 校验单个条目
fn parse_entry(key: &str, value: Value, range: &PositionRange) -> Result<(Slot, Action), String> {
    let slot: Slot = key.parse().map_err(|e: InvalidSlot| e.to_string())?;

    let mut fields = match value {
        Value::Object(fields) => fields,
        other => return Err(format!("expected an object, found {}", json_type(&other))),
    };

    let positions = fields
        .remove("positions")
        .ok_or_else(|| "missing \"positions\"".to_string())?;
    let positions: Vec<JointVector> =
        serde_json::from_value(positions).map_err(|e| format!("invalid positions: {}", e))?;

    check_waypoints(&positions, range).map_err(|(index, e)| format!("waypoint {}: {}", index, e))?;

    let name = name_field(&mut fields).unwrap_or_else(|| slot.default_name());
    let created_at = timestamp_field(&mut fields, key);

    Ok((
        slot,
        Action {
            positions,
            name,
            created_at,
        },
    ))
}

/// 关节数与第一个采样点一致，且位置都在 `range` 内
fn check_waypoints(positions: &[JointVector], range: &PositionRange) -> Result<(), (usize, ProtocolError)> {
    let Some(first) = positions.first() else {
        return Ok(());
    };
    for (index, waypoint) in positions.iter().enumerate() {
        waypoint
            .expect_len(first.len())
            .and_then(|()| waypoint.validate(range))
            .map_err(|e| (index, e))?;
    }
    Ok(())
}

fn name_field(fields: &mut Map<String, Value>) -> Option<String> {
    match fields.remove("name")? {
        Value::String(name) if !name.trim().is_empty() => Some(name),
        _ => None,
    }
}

/// 时间戳缺失或无法解析时不拒绝条目
fn timestamp_field(fields: &mut Map<String, Value>, key: &str) -> Option<NaiveDateTime> {
    match fields.remove("timestamp")? {
        Value::String(raw) => match timestamp::parse(&raw) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!("Action {:?}: ignoring unparseable timestamp {:?}: {}", key, raw, e);
                None
            },
        },
        Value::Null => None,
        other => {
            warn!("Action {:?}: ignoring non-string timestamp {}", key, other);
            None
        },
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
