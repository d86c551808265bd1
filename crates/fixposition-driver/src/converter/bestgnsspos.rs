use super::{ConverterStats, MessageSlot};
use fixposition_protocol::nov::BESTGNSSPOS_ID;
use fixposition_protocol::{BestGnssPos, NavSatFixData, NovRecord, ProtocolError};

/// NOV_B BESTGNSSPOS → `NavSatFixData`
///
/// 每条记录只产生一个结果；天线（GNSS1 / GNSS2 / GNSS）由帧头端口地址决定，
/// 写入 `frame_id` 和 `antenna`。按天线分流由消费方用 `GnssAntenna::output` 完成。
pub struct BestGnssPosConverter {
    slot: MessageSlot<NavSatFixData>,
}

impl Default for BestGnssPosConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl BestGnssPosConverter {
    pub const MSG_TYPE: &'static str = "BESTGNSSPOS";

    pub fn new() -> Self {
        Self {
            slot: MessageSlot::new(),
        }
    }

    pub fn convert_bytes(&mut self, record: &NovRecord) {
        let result = if record.message_id() == BESTGNSSPOS_ID {
            BestGnssPos::parse(&record.payload).map(|pos| pos.to_nav_sat_fix(&record.header))
        } else {
            Err(ProtocolError::Malformed(format!(
                "message id {} is not BESTGNSSPOS",
                record.message_id()
            )))
        };
        self.slot.apply(Self::MSG_TYPE, result);
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

    pub fn observer_count(&self) -> usize {
        self.slot.observer_count()
    }

    pub fn stats(&self) -> ConverterStats {
        self.slot.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use fixposition_protocol::nov::BESTGNSSPOS_LEN;
    use fixposition_protocol::{FixStatus, GnssAntenna, GnssOutput, NovHeader};

    fn record(port_address: u8, payload: &[u8]) -> NovRecord {
        let header = NovHeader {
            message_id: BESTGNSSPOS_ID,
            port_address,
            week: 2231,
            milliseconds: 5000,
            ..Default::default()
        };
        NovRecord::parse(&NovRecord::encode(header, payload)).unwrap()
    }

    fn payload() -> Vec<u8> {
        let mut payload = vec![0u8; BESTGNSSPOS_LEN];
        // position type = SINGLE (16)
        payload[4] = 16;
        payload[8..16].copy_from_slice(&47.0_f64.to_le_bytes());
        payload[16..24].copy_from_slice(&8.0_f64.to_le_bytes());
        payload
    }

    #[test]
    fn test_antenna_routing() {
        let mut converter = BestGnssPosConverter::new();
        let (tx, rx) = bounded::<NavSatFixData>(8);
        converter.add_observer(move |fix| {
            let _ = tx.try_send(fix.clone());
        });

        for port in [0x20, 0x40, 0x00] {
            converter.convert_bytes(&record(port, &payload()));
        }

        let fixes: Vec<_> = rx.try_iter().collect();
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[0].frame_id, "GNSS1");
        assert_eq!(fixes[1].frame_id, "GNSS2");
        assert_eq!(fixes[2].frame_id, "GNSS");
        assert_eq!(fixes[2].antenna, Some(GnssAntenna::Generic));
        assert_eq!(fixes[2].antenna.map(GnssAntenna::output), Some(GnssOutput::Gnss1));
        assert_eq!(fixes[0].status, FixStatus::Fix);
        assert_eq!(fixes[0].latitude, 47.0);
    }

    #[test]
    fn test_short_payload_resets() {
        let mut converter = BestGnssPosConverter::new();
        converter.convert_bytes(&record(0x20, &payload()));
        converter.convert_bytes(&record(0x20, &payload()[..40]));
        assert_eq!(converter.msg(), &NavSatFixData::default());
        assert_eq!(
            converter.stats(),
            ConverterStats {
                successes: 1,
                failures: 1
            }
        );
    }

    #[test]
    fn test_oversized_payload_resets_without_notify() {
        let mut converter = BestGnssPosConverter::new();
        let (tx, rx) = bounded::<NavSatFixData>(4);
        converter.add_observer(move |fix| {
            let _ = tx.try_send(fix.clone());
        });

        converter.convert_bytes(&record(0x20, &payload()));
        assert_eq!(rx.try_iter().count(), 1);

        let mut oversized = payload();
        oversized.extend([0u8; 8]);
        converter.convert_bytes(&record(0x20, &oversized));

        assert!(rx.try_recv().is_err());
        assert_eq!(converter.msg(), &NavSatFixData::default());
        assert_eq!(converter.stats().failures, 1);
    }
}
