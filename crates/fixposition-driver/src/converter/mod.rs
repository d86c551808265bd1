//! 转换器
//!
//! 每个转换器把一种记录转换为类型化消息，并持有该消息的观察者列表：
//!
//! - 成功：替换持有的消息，按订阅顺序通知全部观察者
//! - 失败（字段数不符、数值无法解析）：持有的消息重置为 `Default`，记录 `warn!`，不通知任何观察者
//!
//! 路由表按启用的输出格式构造 [`ConverterEntry`]，注册观察者时直接匹配变体拿到具体类型。

mod bestgnsspos;
mod imu;
mod llh;
mod odometry;
mod tf;

pub use bestgnsspos::BestGnssPosConverter;
pub use imu::ImuConverter;
pub use llh::LlhConverter;
pub use odometry::OdometryConverter;
pub use tf::{TfConverter, imu_pitch_roll};

use crate::hooks::ObserverList;
use fixposition_protocol::{OutputFormat, ProtocolError};
use tracing::warn;

/// 单个转换器的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConverterStats {
    pub successes: u64,
    pub failures: u64,
}

/// 持有的消息 + 观察者 + 统计
pub(crate) struct MessageSlot<T> {
    msg: T,
    observers: ObserverList<T>,
    stats: ConverterStats,
}

impl<T: Default> MessageSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            msg: T::default(),
            observers: ObserverList::new(),
            stats: ConverterStats::default(),
        }
    }

    pub(crate) fn publish(&mut self, msg: T) {
        self.msg = msg;
        self.stats.successes += 1;
        self.observers.trigger_all(&self.msg);
    }

    pub(crate) fn reset(&mut self, msg_type: &str, err: &ProtocolError) {
        warn!("Failed to convert {} record, message reset: {}", msg_type, err);
        self.msg = T::default();
        self.stats.failures += 1;
    }

    pub(crate) fn apply(&mut self, msg_type: &str, result: Result<T, ProtocolError>) {
        match result {
            Ok(msg) => self.publish(msg),
            Err(e) => self.reset(msg_type, &e),
        }
    }

    pub(crate) fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.observers.add_observer(observer);
    }

    pub(crate) fn msg(&self) -> &T {
        &self.msg
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn stats(&self) -> ConverterStats {
        self.stats
    }
}

/// 按 token 转换的能力
pub trait TokenConverter {
    /// 路由键（语句中的消息类型）
    fn msg_type(&self) -> &'static str;

    fn convert_tokens(&mut self, tokens: &[String]);

    fn observer_count(&self) -> usize;

    fn stats(&self) -> ConverterStats;
}

/// 路由表中的一项
pub enum ConverterEntry {
    Odometry(OdometryConverter),
    Llh(LlhConverter),
    RawImu(ImuConverter),
    CorrImu(ImuConverter),
    Tf(TfConverter),
}

impl ConverterEntry {
    pub fn for_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Odometry => ConverterEntry::Odometry(OdometryConverter::new()),
            OutputFormat::Llh => ConverterEntry::Llh(LlhConverter::new()),
            OutputFormat::RawImu => ConverterEntry::RawImu(ImuConverter::raw()),
            OutputFormat::CorrImu => ConverterEntry::CorrImu(ImuConverter::corrected()),
            OutputFormat::Tf => ConverterEntry::Tf(TfConverter::new()),
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            ConverterEntry::Odometry(_) => OutputFormat::Odometry,
            ConverterEntry::Llh(_) => OutputFormat::Llh,
            ConverterEntry::RawImu(_) => OutputFormat::RawImu,
            ConverterEntry::CorrImu(_) => OutputFormat::CorrImu,
            ConverterEntry::Tf(_) => OutputFormat::Tf,
        }
    }

    pub fn as_token_converter(&self) -> &dyn TokenConverter {
        match self {
            ConverterEntry::Odometry(c) => c,
            ConverterEntry::Llh(c) => c,
            ConverterEntry::RawImu(c) | ConverterEntry::CorrImu(c) => c,
            ConverterEntry::Tf(c) => c,
        }
    }

    pub fn as_token_converter_mut(&mut self) -> &mut dyn TokenConverter {
        match self {
            ConverterEntry::Odometry(c) => c,
            ConverterEntry::Llh(c) => c,
            ConverterEntry::RawImu(c) | ConverterEntry::CorrImu(c) => c,
            ConverterEntry::Tf(c) => c,
        }
    }
}
