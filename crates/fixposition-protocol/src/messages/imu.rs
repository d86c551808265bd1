//! RAWIMU / CORRIMU 语句
//!
//! `$FP,<RAWIMU|CORRIMU>,1,<week>,<tow>,<ax>,<ay>,<az>,<wx>,<wy>,<wz>*HH`
//!
//! 两种消息字段表相同，但在协议中是独立的消息类型，需要分别订阅。

use crate::fields::{expect_len, gps_time_at, vec3_at};
use crate::types::ImuData;
use crate::{ProtocolError, prefixed_frame};

pub const IMU_FIELD_COUNT: usize = 11;

const GPS_WEEK_IDX: usize = 3;
const GPS_TOW_IDX: usize = 4;
const ACC_IDX: usize = 5;
const ROT_IDX: usize = 8;

/// IMU 消息种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImuKind {
    /// 原始 IMU 数据
    Raw,
    /// 零偏补偿后的 IMU 数据
    Corrected,
}

impl ImuKind {
    pub const fn tag(self) -> &'static str {
        match self {
            ImuKind::Raw => "RAWIMU",
            ImuKind::Corrected => "CORRIMU",
        }
    }
}

pub fn parse_imu<S: AsRef<str>>(tokens: &[S], kind: ImuKind) -> Result<ImuData, ProtocolError> {
    expect_len(tokens, kind.tag(), IMU_FIELD_COUNT)?;

    Ok(ImuData {
        stamp: gps_time_at(tokens, GPS_WEEK_IDX, GPS_TOW_IDX)?,
        frame_id: prefixed_frame("VRTK"),
        linear_acc: vec3_at(tokens, ACC_IDX)?,
        angular_vel: vec3_at(tokens, ROT_IDX)?,
        bias_comp: kind == ImuKind::Corrected,
        imu_status: 0,
    })
}
