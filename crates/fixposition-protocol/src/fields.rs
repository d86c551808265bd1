//! token 字段解析工具
//!
//! 非数字字段与字段数不符同等对待：都返回 `ProtocolError`，由上层执行“重置为默认值”策略。

use crate::ProtocolError;
use crate::time::GpsTime;
use nalgebra::{Matrix3, Quaternion, Vector3};

pub(crate) fn expect_len<S: AsRef<str>>(
    tokens: &[S],
    msg_type: &'static str,
    expected: usize,
) -> Result<(), ProtocolError> {
    if tokens.len() != expected {
        return Err(ProtocolError::FieldCount {
            msg_type,
            expected,
            actual: tokens.len(),
        });
    }
    Ok(())
}

fn token<S: AsRef<str>>(tokens: &[S], index: usize) -> &str {
    tokens.get(index).map(AsRef::as_ref).unwrap_or_default()
}

fn invalid(tokens: &[impl AsRef<str>], index: usize) -> ProtocolError {
    ProtocolError::InvalidNumber {
        index,
        value: token(tokens, index).to_string(),
    }
}

pub(crate) fn f64_at<S: AsRef<str>>(tokens: &[S], index: usize) -> Result<f64, ProtocolError> {
    token(tokens, index)
        .parse::<f64>()
        .map_err(|_| invalid(tokens, index))
}

pub(crate) fn i32_at<S: AsRef<str>>(tokens: &[S], index: usize) -> Result<i32, ProtocolError> {
    token(tokens, index)
        .parse::<i32>()
        .map_err(|_| invalid(tokens, index))
}

/// 连续三个字段 → x, y, z
pub(crate) fn vec3_at<S: AsRef<str>>(
    tokens: &[S],
    start: usize,
) -> Result<Vector3<f64>, ProtocolError> {
    Ok(Vector3::new(
        f64_at(tokens, start)?,
        f64_at(tokens, start + 1)?,
        f64_at(tokens, start + 2)?,
    ))
}

/// 连续四个字段 → w, x, y, z
///
/// 四个分量全部可解析才返回，不做归一化。
pub(crate) fn quat_wxyz_at<S: AsRef<str>>(
    tokens: &[S],
    start: usize,
) -> Result<Quaternion<f64>, ProtocolError> {
    let w = f64_at(tokens, start)?;
    let xyz = vec3_at(tokens, start + 1)?;
    Ok(Quaternion::new(w, xyz.x, xyz.y, xyz.z))
}

/// 连续六个字段 xx, yy, zz, xy, yz, xz → 对称 3x3 协方差
pub(crate) fn cov3_at<S: AsRef<str>>(
    tokens: &[S],
    start: usize,
) -> Result<Matrix3<f64>, ProtocolError> {
    let [xx, yy, zz, xy, yz, xz] = [0, 1, 2, 3, 4, 5].map(|i| f64_at(tokens, start + i));
    let (xx, yy, zz, xy, yz, xz) = (xx?, yy?, zz?, xy?, yz?, xz?);
    Ok(Matrix3::new(
        xx, xy, xz, //
        xy, yy, yz, //
        xz, yz, zz,
    ))
}

pub(crate) fn gps_time_at<S: AsRef<str>>(
    tokens: &[S],
    week_index: usize,
    tow_index: usize,
) -> Result<GpsTime, ProtocolError> {
    let week = token(tokens, week_index)
        .parse::<u16>()
        .map_err(|_| invalid(tokens, week_index))?;
    let tow = f64_at(tokens, tow_index)?;
    Ok(GpsTime::new(week, tow))
}
