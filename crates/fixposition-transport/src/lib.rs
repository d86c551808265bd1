//! # Fixposition Transport Layer
//!
//! 字节流传输抽象：驱动只需要 `open / read / write / close` 语义。
//!
//! - [`ByteTransport`]：已打开的连接，读操作带有限超时，超时返回 `Ok(0)`
//! - [`Connector`]：按配置打开连接，可反复调用实现重连
//! - [`TransportConfig`]：TCP 或串口配置，本身即一个 `Connector`

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod serial;
pub mod tcp;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use serial::SerialTransport;
pub use tcp::TcpTransport;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockConnector, MockTransport};

/// 单次读操作的默认超时
///
/// 保证驱动主循环不会在读上无限阻塞。
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// TCP 建连超时
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// 对端关闭连接（EOF）
    #[error("Connection closed by peer")]
    Closed,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// 已打开的字节流连接
pub trait ByteTransport: Send {
    /// 读取可用字节
    ///
    /// 超时内没有数据返回 `Ok(0)`；对端关闭返回 `Err(TransportError::Closed)`。
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// 写入全部字节
    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// 连接描述（用于日志）
    fn peer(&self) -> String;
}

/// 连接工厂
pub trait Connector: Send {
    /// 打开一个新连接
    fn open(&mut self) -> Result<Box<dyn ByteTransport>, TransportError>;

    /// 目标描述（用于日志）
    fn describe(&self) -> String;
}

/// 传输配置
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportConfig {
    Tcp { ip: String, port: u16 },
    Serial { path: String, baud_rate: u32 },
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportConfig::Tcp { ip, port } => write!(f, "tcp://{ip}:{port}"),
            TransportConfig::Serial { path, baud_rate } => write!(f, "serial://{path}@{baud_rate}"),
        }
    }
}

impl Connector for TransportConfig {
    fn open(&mut self) -> Result<Box<dyn ByteTransport>, TransportError> {
        match self {
            TransportConfig::Tcp { ip, port } => Ok(Box::new(TcpTransport::connect(
                ip,
                *port,
                DEFAULT_CONNECT_TIMEOUT,
                DEFAULT_READ_TIMEOUT,
            )?)),
            TransportConfig::Serial { path, baud_rate } => Ok(Box::new(SerialTransport::open(
                path,
                *baud_rate,
                DEFAULT_READ_TIMEOUT,
            )?)),
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}
