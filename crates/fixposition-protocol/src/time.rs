//! GPS 时间戳
//!
//! 设备输出 GPS 周 + 周内秒，驱动只做透传与换算，不做时间同步。

/// GPS 纪元（1980-01-06）相对 Unix 纪元的秒数
pub const GPS_UNIX_OFFSET_S: f64 = 315_964_800.0;
/// GPS 时间领先 UTC 的闰秒数
pub const GPS_LEAP_SECONDS: f64 = 18.0;
/// 一周的秒数
pub const SECONDS_PER_WEEK: f64 = 604_800.0;

/// GPS 时间（周 + 周内秒）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsTime {
    /// GPS 周
    pub week: u16,
    /// 周内秒
    pub tow: f64,
}

impl GpsTime {
    pub const fn new(week: u16, tow: f64) -> Self {
        Self { week, tow }
    }

    /// 由 NOV_B 帧头的周 + 周内毫秒构造
    pub fn from_week_ms(week: u16, milliseconds: u32) -> Self {
        Self {
            week,
            tow: f64::from(milliseconds) * 1e-3,
        }
    }

    /// 自 GPS 纪元起的秒数
    pub fn to_gps_seconds(&self) -> f64 {
        f64::from(self.week) * SECONDS_PER_WEEK + self.tow
    }

    /// Unix 时间（秒，UTC）
    pub fn to_unix_seconds(&self) -> f64 {
        self.to_gps_seconds() + GPS_UNIX_OFFSET_S - GPS_LEAP_SECONDS
    }

    pub fn is_zero(&self) -> bool {
        self.week == 0 && self.tow == 0.0
    }
}
