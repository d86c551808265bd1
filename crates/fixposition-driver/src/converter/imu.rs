use super::{ConverterStats, MessageSlot, TokenConverter};
use fixposition_protocol::{ImuData, ImuKind, parse_imu};

/// RAWIMU / CORRIMU
///
/// 两者解析逻辑相同，但在路由表里是两个独立条目，分别订阅。
pub struct ImuConverter {
    kind: ImuKind,
    slot: MessageSlot<ImuData>,
}

impl ImuConverter {
    pub fn new(kind: ImuKind) -> Self {
        Self {
            kind,
            slot: MessageSlot::new(),
        }
    }

    pub fn raw() -> Self {
        Self::new(ImuKind::Raw)
    }

    pub fn corrected() -> Self {
        Self::new(ImuKind::Corrected)
    }

    pub fn kind(&self) -> ImuKind {
        self.kind
    }

    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&ImuData) + Send + 'static,
    {
        self.slot.add_observer(observer);
    }

    pub fn msg(&self) -> &ImuData {
        self.slot.msg()
    }
}

impl TokenConverter for ImuConverter {
    fn msg_type(&self) -> &'static str {
        self.kind.tag()
    }

    fn convert_tokens(&mut self, tokens: &[String]) {
        self.slot.apply(self.msg_type(), parse_imu(tokens, self.kind));
    }

    fn observer_count(&self) -> usize {
        self.slot.observer_count()
    }

    fn stats(&self) -> ConverterStats {
        self.slot.stats()
    }
}
