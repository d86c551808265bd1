//! 驱动层错误类型定义

use crate::config::ConfigError;
use fixposition_protocol::OutputFormat;
use fixposition_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 单条记录的解析错误不会出现在这里：它们在检测到的组件内部记录日志并计数。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误（建连、读写）
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 注册观察者时对应输出格式未启用
    #[error("Output format {0} is not enabled")]
    FormatNotEnabled(OutputFormat),

    /// 无效输入（如轮速个数不对）
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
