//! # Fixposition Protocol
//!
//! Fixposition GNSS/INS 传感器输出协议定义（无硬件依赖、无 IO）
//!
//! ## 模块
//!
//! - `ascii`: FP_A 文本语句（`$FP,...*HH`）的校验与切分
//! - `nov`: NOV_B 二进制帧（NovAtel OEM7 长帧头）与 BESTGNSSPOS 解析
//! - `messages`: 各消息类型的字段表与字段解析
//! - `types`: 工程单位下的类型化消息
//! - `geo`: WGS84 / ECEF / ENU 坐标换算
//! - `time`: GPS 周 + 周内秒时间戳
//!
//! ## 约定
//!
//! - 所有数值字段按 IEEE-754 双精度解析
//! - 四元数一律为 w, x, y, z（标量在前）
//! - 所有对外的坐标系名称统一加 [`FRAME_PREFIX`] 前缀

pub mod ascii;
pub mod geo;
pub mod messages;
pub mod nov;
pub mod time;
pub mod types;

mod fields;

// 重新导出常用类型
pub use ascii::AsciiRecord;
pub use messages::*;
pub use nov::{BestGnssPos, NovHeader, NovRecord};
pub use time::GpsTime;
pub use types::*;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 设备坐标系名称前缀
///
/// 所有转换器输出的 frame id 都以此为前缀，用于区分设备坐标系与系统中的其他坐标系。
pub const FRAME_PREFIX: &str = "FP_";

/// 给原始坐标系名称加上设备前缀
pub fn prefixed_frame(raw: &str) -> String {
    format!("{FRAME_PREFIX}{raw}")
}

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("{msg_type}: expected {expected} fields, got {actual}")]
    FieldCount {
        msg_type: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid number in field {index}: {value:?}")]
    InvalidNumber { index: usize, value: String },

    #[error("Checksum mismatch: frame says 0x{expected:02X}, computed 0x{computed:02X}")]
    Checksum { expected: u8, computed: u8 },

    #[error("CRC mismatch: frame says 0x{expected:08X}, computed 0x{computed:08X}")]
    Crc { expected: u32, computed: u32 },

    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

/// FP_A 输出格式（同时也是路由表的键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputFormat {
    #[cfg_attr(feature = "serde", serde(rename = "ODOMETRY"))]
    Odometry,
    #[cfg_attr(feature = "serde", serde(rename = "LLH"))]
    Llh,
    #[cfg_attr(feature = "serde", serde(rename = "RAWIMU"))]
    RawImu,
    #[cfg_attr(feature = "serde", serde(rename = "CORRIMU"))]
    CorrImu,
    #[cfg_attr(feature = "serde", serde(rename = "TF"))]
    Tf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Odometry,
        OutputFormat::Llh,
        OutputFormat::RawImu,
        OutputFormat::CorrImu,
        OutputFormat::Tf,
    ];

    /// 语句中的消息类型标签
    pub const fn tag(self) -> &'static str {
        match self {
            OutputFormat::Odometry => "ODOMETRY",
            OutputFormat::Llh => "LLH",
            OutputFormat::RawImu => "RAWIMU",
            OutputFormat::CorrImu => "CORRIMU",
            OutputFormat::Tf => "TF",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for OutputFormat {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::UnknownFormat(s.to_string()))
    }
}
