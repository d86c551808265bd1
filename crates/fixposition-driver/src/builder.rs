//! Builder 模式实现
//!
//! 提供链式构造 `FixpositionDriver` 实例的便捷方式。

use crate::config::DriverParams;
use crate::driver::FixpositionDriver;
use crate::error::DriverError;
use fixposition_protocol::OutputFormat;
use fixposition_transport::{Connector, TransportConfig};
use std::collections::BTreeSet;
use tracing::info;

/// FixpositionDriver Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use fixposition_driver::DriverBuilder;
/// use fixposition_protocol::OutputFormat;
/// use fixposition_transport::TransportConfig;
///
/// let driver = DriverBuilder::new()
///     .transport(TransportConfig::Serial {
///         path: "/dev/ttyUSB0".to_string(),
///         baud_rate: 115_200,
///     })
///     .formats([OutputFormat::Llh, OutputFormat::RawImu])
///     .build()
///     .unwrap();
/// ```
pub struct DriverBuilder {
    transport: Option<TransportConfig>,
    connector: Option<Box<dyn Connector>>,
    formats: BTreeSet<OutputFormat>,
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverBuilder {
    /// 默认启用全部输出格式，连接默认的 TCP 地址
    pub fn new() -> Self {
        Self {
            transport: None,
            connector: None,
            formats: OutputFormat::ALL.into_iter().collect(),
        }
    }

    /// 按参数文件构造
    pub fn from_params(params: &DriverParams) -> Result<Self, DriverError> {
        params.validate()?;
        Ok(Self::new()
            .transport(params.transport_config()?)
            .formats(params.formats()?))
    }

    pub fn transport(mut self, config: TransportConfig) -> Self {
        self.transport = Some(config);
        self
    }

    /// 自定义连接工厂（优先于 [`transport`](Self::transport)），测试时传入 mock
    pub fn connector(mut self, connector: Box<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// 设置启用的输出格式（重复项合并）
    pub fn formats(mut self, formats: impl IntoIterator<Item = OutputFormat>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    /// 构建驱动（不连接）
    pub fn build(self) -> Result<FixpositionDriver, DriverError> {
        let connector: Box<dyn Connector> = match (self.connector, self.transport) {
            (Some(connector), _) => connector,
            (None, Some(config)) => Box::new(config),
            (None, None) => Box::new(DriverParams::default().transport_config()?),
        };

        let formats: Vec<_> = self.formats.into_iter().collect();
        info!(
            "Driver for {} with formats [{}]",
            connector.describe(),
            formats
                .iter()
                .map(|f| f.tag())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(FixpositionDriver::new(connector, formats))
    }
}
