use super::{ConverterStats, MessageSlot, TokenConverter};
use fixposition_protocol::geo::quat_to_ypr;
use fixposition_protocol::{OutputFormat, TfData, parse_tf, prefixed_frame};
use nalgebra::{UnitQuaternion, Vector3};

pub struct TfConverter {
    slot: MessageSlot<TfData>,
}

impl Default for TfConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TfConverter {
    pub fn new() -> Self {
        Self {
            slot: MessageSlot::new(),
        }
    }

    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&TfData) + Send + 'static,
    {
        self.slot.add_observer(observer);
    }

    /// 最近一次转换结果（失败后为默认值）
    pub fn msg(&self) -> &TfData {
        self.slot.msg()
    }
}

impl TokenConverter for TfConverter {
    fn msg_type(&self) -> &'static str {
        OutputFormat::Tf.tag()
    }

    fn convert_tokens(&mut self, tokens: &[String]) {
        self.slot.apply(self.msg_type(), parse_tf(tokens));
    }

    fn observer_count(&self) -> usize {
        self.slot.observer_count()
    }

    fn stats(&self) -> ConverterStats {
        self.slot.stats()
    }
}

/// `FP_POI → FP_IMUH` 的俯仰/横滚
///
/// 返回 (yaw, pitch, roll)，yaw 固定为 0（仅凭 IMU 不可观）。其它坐标系对返回 `None`。
pub fn imu_pitch_roll(tf: &TfData) -> Option<Vector3<f64>> {
    if tf.frame_id != prefixed_frame("POI") || tf.child_frame_id != prefixed_frame("IMUH") {
        return None;
    }
    let q = UnitQuaternion::try_new(tf.rotation, f64::EPSILON)?;
    let ypr = quat_to_ypr(&q);
    Some(Vector3::new(0.0, ypr.y, ypr.z))
}
