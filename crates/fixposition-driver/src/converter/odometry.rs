use super::{ConverterStats, MessageSlot, TokenConverter};
use fixposition_protocol::geo::EnuOrigin;
use fixposition_protocol::{OdometryMsgs, OutputFormat, parse_odometry};
use tracing::info;

/// ODOMETRY → [`OdometryMsgs`]
///
/// ENU0 原点锚定在第一条融合状态有效（`fusion_status > 0`）的记录上，之后保持不变。
/// 原点属于转换器状态，断线重连不会清除。
pub struct OdometryConverter {
    slot: MessageSlot<OdometryMsgs>,
    enu0_origin: Option<EnuOrigin>,
}

impl Default for OdometryConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl OdometryConverter {
    pub fn new() -> Self {
        Self {
            slot: MessageSlot::new(),
            enu0_origin: None,
        }
    }

    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&OdometryMsgs) + Send + 'static,
    {
        self.slot.add_observer(observer);
    }

    pub fn msg(&self) -> &OdometryMsgs {
        self.slot.msg()
    }

    pub fn enu0_origin(&self) -> Option<&EnuOrigin> {
        self.enu0_origin.as_ref()
    }

    /// 清除 ENU0 原点，下一条有效记录重新锚定
    pub fn reset_enu0_origin(&mut self) {
        self.enu0_origin = None;
    }
}

impl TokenConverter for OdometryConverter {
    fn msg_type(&self) -> &'static str {
        OutputFormat::Odometry.tag()
    }

    fn convert_tokens(&mut self, tokens: &[String]) {
        let record = match parse_odometry(tokens) {
            Ok(record) => record,
            Err(e) => {
                self.slot.reset(self.msg_type(), &e);
                return;
            },
        };

        if self.enu0_origin.is_none() && record.is_fusion_valid() {
            let origin = EnuOrigin::from_ecef(record.position);
            info!(
                "ENU0 origin anchored at lat {:.7} lon {:.7} height {:.3}",
                origin.llh.x.to_degrees(),
                origin.llh.y.to_degrees(),
                origin.llh.z
            );
            self.enu0_origin = Some(origin);
        }

        let msgs = record.to_msgs(self.enu0_origin.as_ref());
        self.slot.publish(msgs);
    }

    fn observer_count(&self) -> usize {
        self.slot.observer_count()
    }

    fn stats(&self) -> ConverterStats {
        self.slot.stats()
    }
}
