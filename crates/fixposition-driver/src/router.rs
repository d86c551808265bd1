//! 消息路由
//!
//! 路由表在启动时按启用的输出格式构造一次，之后只有各转换器的观察者列表会变化，
//! 且只能在读循环开始之前注册。
//!
//! - FP_A 记录按消息类型查表；未启用或未知的类型直接丢弃（不是错误）
//! - NOV_B 记录按消息 ID 分发；BESTGNSSPOS 转换器始终存在

use crate::converter::{
    BestGnssPosConverter, ConverterEntry, ConverterStats, ImuConverter, LlhConverter,
    OdometryConverter, TfConverter,
};
use crate::framer::RawRecord;
use fixposition_protocol::nov::BESTGNSSPOS_ID;
use fixposition_protocol::{AsciiRecord, ImuKind, NovRecord, OutputFormat};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

pub struct Router {
    converters: HashMap<String, ConverterEntry>,
    bestgnsspos: BestGnssPosConverter,
    dropped: u64,
}

impl Router {
    pub fn new(formats: impl IntoIterator<Item = OutputFormat>) -> Self {
        let converters = formats
            .into_iter()
            .map(|format| (format.tag().to_string(), ConverterEntry::for_format(format)))
            .collect();

        Self {
            converters,
            bestgnsspos: BestGnssPosConverter::new(),
            dropped: 0,
        }
    }

    pub fn dispatch(&mut self, record: RawRecord) {
        match record {
            RawRecord::Ascii(record) => self.dispatch_ascii(&record),
            RawRecord::NovB(record) => self.dispatch_nov(&record),
        }
    }

    fn dispatch_ascii(&mut self, record: &AsciiRecord) {
        match self.converters.get_mut(record.message_type()) {
            Some(entry) => entry.as_token_converter_mut().convert_tokens(record.tokens()),
            None => {
                trace!("No converter for {:?}, dropping", record.message_type());
                self.dropped += 1;
            },
        }
    }

    fn dispatch_nov(&mut self, record: &NovRecord) {
        match record.message_id() {
            BESTGNSSPOS_ID => self.bestgnsspos.convert_bytes(record),
            id => {
                trace!("No converter for NOV_B message id {}, dropping", id);
                self.dropped += 1;
            },
        }
    }

    pub fn is_enabled(&self, format: OutputFormat) -> bool {
        self.converters.contains_key(format.tag())
    }

    pub fn enabled_formats(&self) -> Vec<OutputFormat> {
        let mut formats: Vec<_> = self.converters.values().map(ConverterEntry::format).collect();
        formats.sort();
        formats
    }

    fn entry_mut(&mut self, format: OutputFormat) -> Option<&mut ConverterEntry> {
        self.converters.get_mut(format.tag())
    }

    pub fn odometry_mut(&mut self) -> Option<&mut OdometryConverter> {
        match self.entry_mut(OutputFormat::Odometry) {
            Some(ConverterEntry::Odometry(c)) => Some(c),
            _ => None,
        }
    }

    pub fn llh_mut(&mut self) -> Option<&mut LlhConverter> {
        match self.entry_mut(OutputFormat::Llh) {
            Some(ConverterEntry::Llh(c)) => Some(c),
            _ => None,
        }
    }

    pub fn imu_mut(&mut self, kind: ImuKind) -> Option<&mut ImuConverter> {
        let format = match kind {
            ImuKind::Raw => OutputFormat::RawImu,
            ImuKind::Corrected => OutputFormat::CorrImu,
        };
        match self.entry_mut(format) {
            Some(ConverterEntry::RawImu(c) | ConverterEntry::CorrImu(c)) => Some(c),
            _ => None,
        }
    }

    pub fn tf_mut(&mut self) -> Option<&mut TfConverter> {
        match self.entry_mut(OutputFormat::Tf) {
            Some(ConverterEntry::Tf(c)) => Some(c),
            _ => None,
        }
    }

    pub fn bestgnsspos_mut(&mut self) -> &mut BestGnssPosConverter {
        &mut self.bestgnsspos
    }

    pub fn tf(&self) -> Option<&TfConverter> {
        match self.converters.get(OutputFormat::Tf.tag()) {
            Some(ConverterEntry::Tf(c)) => Some(c),
            _ => None,
        }
    }

    /// 丢弃的记录数（未启用或未知类型）
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// 各转换器的统计，键为消息类型
    pub fn converter_stats(&self) -> BTreeMap<String, ConverterStats> {
        let mut stats: BTreeMap<_, _> = self
            .converters
            .iter()
            .map(|(tag, entry)| (tag.clone(), entry.as_token_converter().stats()))
            .collect();
        stats.insert(
            BestGnssPosConverter::MSG_TYPE.to_string(),
            self.bestgnsspos.stats(),
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixposition_protocol::AsciiRecord;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn tf_record() -> RawRecord {
        RawRecord::Ascii(AsciiRecord::from_tokens([
            "FP", "TF", "1", "POI", "ENU0", "1.0", "2.0", "3.0", "1.0", "0.0", "0.0", "0.0",
        ]))
    }

    #[test]
    fn test_registry_from_formats() {
        let router = Router::new([OutputFormat::Tf, OutputFormat::Llh, OutputFormat::Tf]);
        assert!(router.is_enabled(OutputFormat::Tf));
        assert!(!router.is_enabled(OutputFormat::Odometry));
        assert_eq!(
            router.enabled_formats(),
            vec![OutputFormat::Llh, OutputFormat::Tf]
        );
    }

    #[test]
    fn test_dispatch_to_tf() {
        let mut router = Router::new([OutputFormat::Tf]);
        let count = Arc::new(AtomicU64::new(0));
        let c = count.clone();
        router.tf_mut().unwrap().add_observer(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        });

        router.dispatch(tf_record());
        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(router.tf().unwrap().msg().frame_id, "FP_POI");
    }

    #[test]
    fn test_unknown_type_dropped() {
        let mut router = Router::new([OutputFormat::Tf]);
        router.dispatch(RawRecord::Ascii(AsciiRecord::from_tokens(["FP", "XYZ", "1"])));
        router.dispatch(RawRecord::Ascii(AsciiRecord::from_tokens(["GPGGA", "1"])));

        assert_eq!(router.dropped(), 2);
        let stats = router.converter_stats();
        assert_eq!(stats["TF"], ConverterStats::default());
    }

    #[test]
    fn test_disabled_format_dropped() {
        let mut router = Router::new([OutputFormat::Llh]);
        router.dispatch(tf_record());
        assert_eq!(router.dropped(), 1);
        assert!(router.tf_mut().is_none());
    }

    #[test]
    fn test_imu_entries_are_independent() {
        let mut router = Router::new([OutputFormat::RawImu, OutputFormat::CorrImu]);
        assert_eq!(router.imu_mut(ImuKind::Raw).unwrap().kind(), ImuKind::Raw);
        assert_eq!(
            router.imu_mut(ImuKind::Corrected).unwrap().kind(),
            ImuKind::Corrected
        );
    }

    #[test]
    fn test_converter_stats_include_bestgnsspos() {
        let router = Router::new(OutputFormat::ALL);
        let stats = router.converter_stats();
        assert_eq!(stats.len(), 6);
        assert!(stats.contains_key("BESTGNSSPOS"));
    }
}
