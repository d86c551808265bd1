//! LLH 语句
//!
//! `$FP,LLH,1,<week>,<tow>,<lat>,<lon>,<height>,<cov_ee>,<cov_nn>,<cov_uu>,<cov_en>,<cov_nu>,<cov_eu>*HH`

use crate::fields::{cov3_at, expect_len, f64_at, gps_time_at};
use crate::types::{CovarianceType, FixStatus, NavSatFixData};
use crate::{ProtocolError, prefixed_frame};

pub const LLH_FIELD_COUNT: usize = 14;

const GPS_WEEK_IDX: usize = 3;
const GPS_TOW_IDX: usize = 4;
const LATITUDE_IDX: usize = 5;
const LONGITUDE_IDX: usize = 6;
const HEIGHT_IDX: usize = 7;
const COV_IDX: usize = 8;

/// 解析 LLH 语句为仅含位置的 `NavSatFixData`
pub fn parse_llh<S: AsRef<str>>(tokens: &[S]) -> Result<NavSatFixData, ProtocolError> {
    expect_len(tokens, "LLH", LLH_FIELD_COUNT)?;

    Ok(NavSatFixData {
        stamp: gps_time_at(tokens, GPS_WEEK_IDX, GPS_TOW_IDX)?,
        frame_id: prefixed_frame("POI"),
        antenna: None,
        latitude: f64_at(tokens, LATITUDE_IDX)?,
        longitude: f64_at(tokens, LONGITUDE_IDX)?,
        altitude: f64_at(tokens, HEIGHT_IDX)?,
        cov: cov3_at(tokens, COV_IDX)?,
        position_covariance_type: CovarianceType::Known,
        status: FixStatus::Fix,
    })
}
