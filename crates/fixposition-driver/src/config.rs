//! 驱动参数
//!
//! 参数树与 TOML 文件一一对应：
//!
//! ```toml
//! [fp_output]
//! formats = ["ODOMETRY", "LLH", "TF"]
//! type = "tcp"
//! ip = "10.0.2.1"
//! port = "21000"
//! rate = 100
//! reconnect_delay = 5.0
//!
//! [customer_input]
//! speed_topic = "/fixposition/speed"
//! ```
//!
//! 串口模式下 `port` 为设备路径，`baudrate` 生效。

use fixposition_protocol::OutputFormat;
use fixposition_transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_IP: &str = "10.0.2.1";
pub const DEFAULT_TCP_PORT: &str = "21000";
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_RATE_HZ: f64 = 100.0;
pub const DEFAULT_RECONNECT_DELAY_S: f64 = 5.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// 传输类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Tcp,
    Serial,
}

/// `[fp_output]`：传感器输出相关参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FpOutputParams {
    /// 启用的输出格式（原样保留，校验时解析）
    pub formats: Vec<String>,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub ip: String,
    /// TCP 端口号，或串口设备路径
    pub port: String,
    pub baudrate: u32,
    /// 主循环频率（Hz）
    pub rate: f64,
    /// 重连间隔（秒）
    pub reconnect_delay: f64,
}

impl Default for FpOutputParams {
    fn default() -> Self {
        Self {
            formats: OutputFormat::ALL.iter().map(|f| f.tag().to_string()).collect(),
            input_type: InputType::Tcp,
            ip: DEFAULT_IP.to_string(),
            port: DEFAULT_TCP_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            rate: DEFAULT_RATE_HZ,
            reconnect_delay: DEFAULT_RECONNECT_DELAY_S,
        }
    }
}

/// `[customer_input]`：外部输入（轮速）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInputParams {
    /// 轮速来源名称；驱动本身不解释它
    pub speed_topic: String,
}

/// 驱动参数
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverParams {
    pub fp_output: FpOutputParams,
    pub customer_input: CustomerInputParams,
}

impl DriverParams {
    /// 从 TOML 文本解析并校验
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.formats()?;

        let out = &self.fp_output;
        if !(out.rate.is_finite() && out.rate > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "fp_output.rate",
                reason: format!("must be > 0, got {}", out.rate),
            });
        }
        if let Err(e) = Duration::try_from_secs_f64(1.0 / out.rate) {
            return Err(ConfigError::InvalidValue {
                field: "fp_output.rate",
                reason: format!("loop period of {} Hz is out of range: {e}", out.rate),
            });
        }
        if !(out.reconnect_delay.is_finite() && out.reconnect_delay >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "fp_output.reconnect_delay",
                reason: format!("must be >= 0, got {}", out.reconnect_delay),
            });
        }
        if let Err(e) = Duration::try_from_secs_f64(out.reconnect_delay) {
            return Err(ConfigError::InvalidValue {
                field: "fp_output.reconnect_delay",
                reason: format!("{} s is out of range: {e}", out.reconnect_delay),
            });
        }
        self.transport_config().map(|_| ())
    }

    /// 启用的输出格式（重复项合并）
    pub fn formats(&self) -> Result<BTreeSet<OutputFormat>, ConfigError> {
        self.fp_output
            .formats
            .iter()
            .map(|name| {
                name.parse::<OutputFormat>()
                    .map_err(|_| ConfigError::UnknownFormat(name.clone()))
            })
            .collect()
    }

    pub fn transport_config(&self) -> Result<TransportConfig, ConfigError> {
        let out = &self.fp_output;
        match out.input_type {
            InputType::Tcp => {
                let port = out.port.trim().parse::<u16>().map_err(|e| {
                    ConfigError::InvalidValue {
                        field: "fp_output.port",
                        reason: format!("{:?} is not a TCP port: {e}", out.port),
                    }
                })?;
                Ok(TransportConfig::Tcp {
                    ip: out.ip.clone(),
                    port,
                })
            },
            InputType::Serial => {
                if out.port.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "fp_output.port",
                        reason: "serial device path is empty".to_string(),
                    });
                }
                if out.baudrate == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "fp_output.baudrate",
                        reason: "must be > 0".to_string(),
                    });
                }
                Ok(TransportConfig::Serial {
                    path: out.port.clone(),
                    baud_rate: out.baudrate,
                })
            },
        }
    }

    /// 主循环周期（未经 [`validate`](Self::validate) 的越界值取 `Duration::MAX`）
    pub fn loop_period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.fp_output.rate).unwrap_or(Duration::MAX)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.fp_output.reconnect_delay).unwrap_or(Duration::MAX)
    }
}
