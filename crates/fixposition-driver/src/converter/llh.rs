use super::{ConverterStats, MessageSlot, TokenConverter};
use fixposition_protocol::{NavSatFixData, OutputFormat, parse_llh};

/// LLH → 仅位置的大地坐标定位结果
pub struct LlhConverter {
    slot: MessageSlot<NavSatFixData>,
}

impl Default for LlhConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl LlhConverter {
    pub fn new() -> Self {
        Self {
            slot: MessageSlot::new(),
        }
    }

    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&NavSatFixData) + Send + 'static,
    {
        self.slot.add_observer(observer);
    }

    pub fn msg(&self) -> &NavSatFixData {
        self.slot.msg()
    }
}

impl TokenConverter for LlhConverter {
    fn msg_type(&self) -> &'static str {
        OutputFormat::Llh.tag()
    }

    fn convert_tokens(&mut self, tokens: &[String]) {
        self.slot.apply(self.msg_type(), parse_llh(tokens));
    }

    fn observer_count(&self) -> usize {
        self.slot.observer_count()
    }

    fn stats(&self) -> ConverterStats {
        self.slot.stats()
    }
}
