//! # 示教台配置
//!
//! 支持两种布局（JSON 或 TOML）：
//!
//! ```json
//! { "port": "COM5", "baudrate": 1000000, "motor_ids": [1, 2, 3, 4, 5, 6], "sample_interval": 0.01 }
//! ```
//!
//! ```json
//! {
//!     "master": { "port": "COM5", "baudrate": 1000000, "motor_ids": [1, 2, 3, 4, 5, 6] },
//!     "slave":  { "port": "COM6", "baudrate": 1000000, "motor_ids": [1, 2, 3, 4, 5, 6] },
//!     "sample_interval": 0.01
//! }
//! ```
//!
//! 可选的 `engine` 段覆盖引擎参数（平滑窗口、镜像频率、回放延迟等）。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use teach_protocol::{BASE_GOAL_SPEED, DEFAULT_ACCELERATION};
use thiserror::Error;
use tracing::warn;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// 默认串口
pub const DEFAULT_PORT: &str = "COM5";

/// 默认波特率
pub const DEFAULT_BAUDRATE: u32 = 1_000_000;

/// 默认采样间隔（秒）
pub const DEFAULT_SAMPLE_INTERVAL: f64 = 0.01;

const DEFAULT_SAMPLE_INTERVAL_DURATION: Duration = Duration::from_millis(10);
const DEFAULT_PLAYBACK_BASE_DELAY: Duration = Duration::from_millis(30);
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 单条舵机总线设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSettings {
    pub port: String,
    pub baudrate: u32,
    pub motor_ids: Vec<u8>,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            motor_ids: (1..=6).collect(),
        }
    }
}

impl BusSettings {
    pub fn joint_count(&self) -> usize {
        self.motor_ids.len()
    }
}

/// 机械臂布局
#[derive(Debug, Clone, PartialEq)]
pub enum ArmLayout {
    /// 单条总线（主从同一只机械臂）
    Single(BusSettings),
    /// 主臂 + 从臂
    Dual { master: BusSettings, slave: BusSettings },
}

impl ArmLayout {
    pub fn master(&self) -> &BusSettings {
        match self {
            ArmLayout::Single(bus) => bus,
            ArmLayout::Dual { master, .. } => master,
        }
    }

    /// 单臂布局返回 `None`
    pub fn slave(&self) -> Option<&BusSettings> {
        match self {
            ArmLayout::Single(_) => None,
            ArmLayout::Dual { slave, .. } => Some(slave),
        }
    }

    pub fn is_dual(&self) -> bool {
        matches!(self, ArmLayout::Dual { .. })
    }
}

/// 引擎参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// 录制平滑窗口（0 或 1 关闭）
    pub smoothing_window: usize,
    /// 镜像频率（Hz）
    pub mirror_fps: u32,
    /// 1.0 倍速下的回放帧间延迟（秒）
    pub playback_base_delay: f64,
    /// 停止等待超时（秒）
    pub stop_timeout: f64,
    pub acceleration: i32,
    pub base_speed: i32,
    /// 录制时同步驱动从臂
    pub mirror_while_recording: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            mirror_fps: 30,
            playback_base_delay: 0.03,
            stop_timeout: 1.0,
            acceleration: DEFAULT_ACCELERATION,
            base_speed: BASE_GOAL_SPEED,
            mirror_while_recording: false,
        }
    }
}

/// 示教台配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig", into = "RawConfig")]
pub struct TeachConfig {
    pub layout: ArmLayout,
    /// 采样间隔（秒）
    pub sample_interval: f64,
    pub engine: EngineSettings,
}

impl Default for TeachConfig {
    fn default() -> Self {
        Self {
            layout: ArmLayout::Single(BusSettings::default()),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            engine: EngineSettings::default(),
        }
    }
}

impl TeachConfig {
    /// 从文件加载（按扩展名选择 JSON / TOML）
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("(none)").to_string(),
            )),
        }
    }

    /// 加载失败时回退到默认配置（记录警告）
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config {}: {}; using defaults", path.display(), e);
                Self::default()
            },
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 舵机数量（主臂）
    pub fn joint_count(&self) -> usize {
        self.layout.master().joint_count()
    }

    /// 以下时长访问器不会 panic：字段被直接改成无效值时回退到默认值
    pub fn sample_interval(&self) -> Duration {
        positive_secs(self.sample_interval).unwrap_or(DEFAULT_SAMPLE_INTERVAL_DURATION)
    }

    pub fn playback_base_delay(&self) -> Duration {
        positive_secs(self.engine.playback_base_delay).unwrap_or(DEFAULT_PLAYBACK_BASE_DELAY)
    }

    pub fn stop_timeout(&self) -> Duration {
        positive_secs(self.engine.stop_timeout).unwrap_or(DEFAULT_STOP_TIMEOUT)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        let master = self.layout.master();
        check_bus("master", master)?;

        if let Some(slave) = self.layout.slave() {
            check_bus("slave", slave)?;
            if slave.joint_count() != master.joint_count() {
                return Err(ConfigError::Invalid(format!(
                    "master has {} motors but slave has {}",
                    master.joint_count(),
                    slave.joint_count()
                )));
            }
        }

        check_positive("sample_interval", self.sample_interval)?;
        check_positive("engine.playback_base_delay", self.engine.playback_base_delay)?;
        check_positive("engine.stop_timeout", self.engine.stop_timeout)?;
        if self.engine.mirror_fps == 0 {
            return Err(ConfigError::Invalid("engine.mirror_fps must be positive".to_string()));
        }
        Ok(())
    }
}

fn check_bus(role: &str, bus: &BusSettings) -> Result<(), ConfigError> {
    if bus.motor_ids.is_empty() {
        return Err(ConfigError::Invalid(format!("{} motor_ids must not be empty", role)));
    }
    if bus.port.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{} port must not be empty", role)));
    }
    Ok(())
}

/// 正的、可表示为 `Duration` 的秒数（NaN、无穷和过大的值返回 `None`）
fn positive_secs(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok().filter(|d| !d.is_zero())
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    match positive_secs(value) {
        Some(_) => Ok(()),
        None => Err(ConfigError::Invalid(format!(
            "{} must be a positive number of seconds, got {}",
            field, value
        ))),
    }
}

/// 磁盘格式（两种布局共用）
#[derive(Debug, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    baudrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    motor_ids: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    master: Option<BusSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slave: Option<BusSettings>,
    #[serde(default = "default_sample_interval")]
    sample_interval: f64,
    #[serde(default)]
    engine: EngineSettings,
}

fn default_sample_interval() -> f64 {
    DEFAULT_SAMPLE_INTERVAL
}

impl TryFrom<RawConfig> for TeachConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let layout = match (raw.master, raw.slave) {
            (Some(master), Some(slave)) => ArmLayout::Dual { master, slave },
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "dual layout needs both \"master\" and \"slave\"".to_string(),
                ));
            },
            (None, None) => {
                let defaults = BusSettings::default();
                ArmLayout::Single(BusSettings {
                    port: raw.port.unwrap_or(defaults.port),
                    baudrate: raw.baudrate.unwrap_or(defaults.baudrate),
                    motor_ids: raw.motor_ids.unwrap_or(defaults.motor_ids),
                })
            },
        };

        let config = TeachConfig {
            layout,
            sample_interval: raw.sample_interval,
            engine: raw.engine,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<TeachConfig> for RawConfig {
    fn from(config: TeachConfig) -> Self {
        let (single, master, slave) = match config.layout {
            ArmLayout::Single(bus) => (Some(bus), None, None),
            ArmLayout::Dual { master, slave } => (None, Some(master), Some(slave)),
        };
        RawConfig {
            port: single.as_ref().map(|b| b.port.clone()),
            baudrate: single.as_ref().map(|b| b.baudrate),
            motor_ids: single.map(|b| b.motor_ids),
            master,
            slave,
            sample_interval: config.sample_interval,
            engine: config.engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_single_layout_json() {
        let config = TeachConfig::from_json(
            r#"{"port": "/dev/ttyUSB0", "baudrate": 500000, "motor_ids": [1, 2, 3], "sample_interval": 0.02}"#,
        )
        .unwrap();

        assert!(!config.layout.is_dual());
        assert_eq!(config.layout.master().port, "/dev/ttyUSB0");
        assert_eq!(config.joint_count(), 3);
        assert!((config.sample_interval().as_secs_f64() - 0.02).abs() < 1e-9);
        assert_eq!(config.engine, EngineSettings::default());
    }

    #[test]
    fn test_dual_layout_toml() {
        let config = TeachConfig::from_toml(
            r#"
sample_interval = 0.01

[master]
port = "COM5"
baudrate = 1000000
motor_ids = [1, 2, 3, 4, 5, 6]

[slave]
port = "COM6"
baudrate = 1000000
motor_ids = [1, 2, 3, 4, 5, 6]

[engine]
mirror_fps = 50
mirror_while_recording = true
"#,
        )
        .unwrap();

        assert!(config.layout.is_dual());
        assert_eq!(config.layout.slave().map(|s| s.port.as_str()), Some("COM6"));
        assert_eq!(config.engine.mirror_fps, 50);
        assert!(config.engine.mirror_while_recording);
        assert_eq!(config.engine.smoothing_window, 3);
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            r#"{"motor_ids": []}"#,
            r#"{"sample_interval": 0}"#,
            r#"{"sample_interval": -0.5}"#,
            r#"{"engine": {"mirror_fps": 0}}"#,
            r#"{"engine": {"stop_timeout": 1e300}}"#,
            r#"{"engine": {"playback_base_delay": 1e20}}"#,
            r#"{"sample_interval": 1e-12}"#,
            r#"{"master": {"port": "a", "baudrate": 1, "motor_ids": [1]}}"#,
            r#"{"master": {"port": "a", "baudrate": 1, "motor_ids": [1]},
                "slave": {"port": "b", "baudrate": 1, "motor_ids": [1, 2]}}"#,
        ];
        for case in cases {
            assert!(TeachConfig::from_json(case).is_err(), "accepted {}", case);
        }
    }

    #[test]
    fn test_duration_accessors_never_panic() {
        let mut config = TeachConfig::default();
        config.sample_interval = f64::NAN;
        config.engine.playback_base_delay = -1.0;
        config.engine.stop_timeout = 1e300;

        assert!(config.validate().is_err());
        assert_eq!(config.sample_interval(), Duration::from_millis(10));
        assert_eq!(config.playback_base_delay(), Duration::from_millis(30));
        assert_eq!(config.stop_timeout(), Duration::from_secs(1));

        config.engine.stop_timeout = 2.5;
        assert_eq!(config.stop_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = TeachConfig {
            layout: ArmLayout::Dual {
                master: BusSettings::default(),
                slave: BusSettings {
                    port: "COM6".to_string(),
                    ..Default::default()
                },
            },
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(TeachConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();

        let missing = TeachConfig::load_or_default(dir.path().join("missing.json"));
        assert_eq!(missing, TeachConfig::default());
        assert_eq!(missing.layout.master().motor_ids, vec![1, 2, 3, 4, 5, 6]);

        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "port = \"COM9\"").unwrap();
        let loaded = TeachConfig::load_or_default(&path);
        assert_eq!(loaded.layout.master().port, "COM9");

        let path = dir.path().join("config.yaml");
        fs::write(&path, "port: COM9").unwrap();
        assert!(matches!(
            TeachConfig::load_from_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
