//! TF 语句
//!
//! `$FP,TF,1,<from>,<to>,<tx>,<ty>,<tz>,<qw>,<qx>,<qy>,<qz>*HH`

use crate::fields::{expect_len, quat_wxyz_at, vec3_at};
use crate::types::TfData;
use crate::{ProtocolError, prefixed_frame};

pub const TF_FIELD_COUNT: usize = 12;

const FROM_FRAME_IDX: usize = 3;
const TO_FRAME_IDX: usize = 4;
const TRANSLATION_IDX: usize = 5;
const ORIENTATION_IDX: usize = 8;

/// 解析 TF 语句
///
/// 字段数必须恰为 12，且七个数值字段都能解析为 f64。
pub fn parse_tf<S: AsRef<str>>(tokens: &[S]) -> Result<TfData, ProtocolError> {
    expect_len(tokens, "TF", TF_FIELD_COUNT)?;

    Ok(TfData {
        frame_id: prefixed_frame(tokens[FROM_FRAME_IDX].as_ref()),
        child_frame_id: prefixed_frame(tokens[TO_FRAME_IDX].as_ref()),
        translation: vec3_at(tokens, TRANSLATION_IDX)?,
        rotation: quat_wxyz_at(tokens, ORIENTATION_IDX)?,
    })
}
