//! 驱动门面
//!
//! 持有连接管理器与路由表。外部主循环负责节奏（频率、重连间隔、退出标志），
//! 驱动只提供 `connect` / `run_once` 与启动阶段的观察者注册。

use crate::connection::ConnectionManager;
use crate::converter::ConverterStats;
use crate::error::DriverError;
use crate::framer::FramerStats;
use crate::router::Router;
use crate::wheelspeed::encode_wheel_speeds;
use fixposition_protocol::{ImuData, ImuKind, NavSatFixData, OdometryMsgs, OutputFormat, TfData};
use fixposition_transport::Connector;
use std::collections::BTreeMap;
use tracing::debug;

/// 诊断统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub framer: FramerStats,
    /// 键为消息类型（含 `BESTGNSSPOS`）
    pub converters: BTreeMap<String, ConverterStats>,
    /// 未启用或未知类型被丢弃的记录
    pub dropped_records: u64,
}

/// Fixposition 驱动
///
/// # Example
///
/// ```no_run
/// use fixposition_driver::DriverBuilder;
/// use fixposition_protocol::OutputFormat;
///
/// let mut driver = DriverBuilder::new()
///     .formats([OutputFormat::Odometry, OutputFormat::Tf])
///     .build()
///     .unwrap();
///
/// driver
///     .on_tf(|tf| println!("{} -> {}", tf.frame_id, tf.child_frame_id))
///     .unwrap();
///
/// if driver.connect().is_ok() {
///     while driver.run_once() {}
/// }
/// ```
pub struct FixpositionDriver {
    connection: ConnectionManager,
    router: Router,
    /// 待发送的轮速语句（只保留最新一条）
    pending_wheel_speeds: Option<String>,
}

impl FixpositionDriver {
    pub fn new(connector: Box<dyn Connector>, formats: impl IntoIterator<Item = OutputFormat>) -> Self {
        Self {
            connection: ConnectionManager::new(connector),
            router: Router::new(formats),
            pending_wheel_speeds: None,
        }
    }

    /// 打开连接；已连接时为空操作
    pub fn connect(&mut self) -> Result<(), DriverError> {
        self.connection.connect()?;
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.connection.last_error()
    }

    /// 驱动一次读周期，返回传输是否健康
    ///
    /// 若有待发送的轮速，先写出再读。任何读写失败都会断开连接并返回 `false`，
    /// 之后由调用方等待重连间隔再调用 [`connect`](Self::connect)。
    pub fn run_once(&mut self) -> bool {
        if !self.connection.is_connected() {
            return false;
        }

        if let Some(sentence) = self.pending_wheel_speeds.take() {
            debug!("Sending wheel speeds: {}", sentence.trim_end());
            if !self.connection.write(sentence.as_bytes()) {
                return false;
            }
        }

        let router = &mut self.router;
        self.connection.read_cycle(|record| router.dispatch(record))
    }

    /// 提交轮速（mm/s）：1 个车速或 4 个轮速
    ///
    /// 下一次 [`run_once`](Self::run_once) 时写出；未发送的旧值被新值覆盖。
    pub fn set_wheel_speeds(&mut self, speeds: &[i32]) -> Result<(), DriverError> {
        self.pending_wheel_speeds = Some(encode_wheel_speeds(speeds)?);
        Ok(())
    }

    pub fn on_odometry<F>(&mut self, observer: F) -> Result<(), DriverError>
    where
        F: FnMut(&OdometryMsgs) + Send + 'static,
    {
        self.router
            .odometry_mut()
            .ok_or(DriverError::FormatNotEnabled(OutputFormat::Odometry))?
            .add_observer(observer);
        Ok(())
    }

    pub fn on_llh<F>(&mut self, observer: F) -> Result<(), DriverError>
    where
        F: FnMut(&NavSatFixData) + Send + 'static,
    {
        self.router
            .llh_mut()
            .ok_or(DriverError::FormatNotEnabled(OutputFormat::Llh))?
            .add_observer(observer);
        Ok(())
    }

    pub fn on_rawimu<F>(&mut self, observer: F) -> Result<(), DriverError>
    where
        F: FnMut(&ImuData) + Send + 'static,
    {
        self.router
            .imu_mut(ImuKind::Raw)
            .ok_or(DriverError::FormatNotEnabled(OutputFormat::RawImu))?
            .add_observer(observer);
        Ok(())
    }

    pub fn on_corrimu<F>(&mut self, observer: F) -> Result<(), DriverError>
    where
        F: FnMut(&ImuData) + Send + 'static,
    {
        self.router
            .imu_mut(ImuKind::Corrected)
            .ok_or(DriverError::FormatNotEnabled(OutputFormat::CorrImu))?
            .add_observer(observer);
        Ok(())
    }

    pub fn on_tf<F>(&mut self, observer: F) -> Result<(), DriverError>
    where
        F: FnMut(&TfData) + Send + 'static,
    {
        self.router
            .tf_mut()
            .ok_or(DriverError::FormatNotEnabled(OutputFormat::Tf))?
            .add_observer(observer);
        Ok(())
    }

    /// BESTGNSSPOS 始终启用
    pub fn on_bestgnsspos<F>(&mut self, observer: F)
    where
        F: FnMut(&NavSatFixData) + Send + 'static,
    {
        self.router.bestgnsspos_mut().add_observer(observer);
    }

    pub fn enabled_formats(&self) -> Vec<OutputFormat> {
        self.router.enabled_formats()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            framer: self.connection.framer_stats(),
            converters: self.router.converter_stats(),
            dropped_records: self.router.dropped(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixposition_transport::MockConnector;

    fn driver(formats: &[OutputFormat]) -> (FixpositionDriver, MockConnector) {
        let mock = MockConnector::new();
        let driver = FixpositionDriver::new(Box::new(mock.clone()), formats.iter().copied());
        (driver, mock)
    }

    #[test]
    fn test_register_disabled_format() {
        let (mut driver, _) = driver(&[OutputFormat::Tf]);
        assert!(driver.on_tf(|_| {}).is_ok());
        assert!(matches!(
            driver.on_odometry(|_| {}),
            Err(DriverError::FormatNotEnabled(OutputFormat::Odometry))
        ));
        assert!(matches!(
            driver.on_corrimu(|_| {}),
            Err(DriverError::FormatNotEnabled(OutputFormat::CorrImu))
        ));
    }

    #[test]
    fn test_run_once_before_connect() {
        let (mut driver, _) = driver(&[OutputFormat::Tf]);
        assert!(!driver.run_once());
    }

    #[test]
    fn test_wheel_speed_most_recent_wins() {
        let (mut driver, mock) = driver(&[OutputFormat::Tf]);
        driver.connect().unwrap();

        driver.set_wheel_speeds(&[100]).unwrap();
        driver.set_wheel_speeds(&[1, 2, 3, 4]).unwrap();
        assert!(driver.run_once());

        let written = String::from_utf8(mock.written()).unwrap();
        assert!(written.starts_with("$PVEL,1,2,3,4*"));
        assert_eq!(written.matches("$PVEL").count(), 1);

        // 已发送，不重复
        mock.clear_written();
        assert!(driver.run_once());
        assert!(mock.written().is_empty());
    }

    #[test]
    fn test_wheel_speed_write_failure_is_unhealthy() {
        let (mut driver, mock) = driver(&[OutputFormat::Tf]);
        driver.connect().unwrap();
        mock.set_fail_writes(true);

        driver.set_wheel_speeds(&[100]).unwrap();
        assert!(!driver.run_once());
        assert!(!driver.is_connected());
    }

    #[test]
    fn test_invalid_wheel_speed_count() {
        let (mut driver, _) = driver(&[]);
        assert!(matches!(
            driver.set_wheel_speeds(&[1, 2, 3]),
            Err(DriverError::InvalidInput(_))
        ));
    }
}
