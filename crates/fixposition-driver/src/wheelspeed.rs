//! 轮速输入
//!
//! 外部给出的车速（mm/s，整数）以 `$PVEL` 语句写回传感器：
//!
//! ```text
//! $PVEL,<v>*HH\r\n                  单一车速
//! $PVEL,<fl>,<fr>,<rl>,<rr>*HH\r\n  四轮轮速
//! ```

use crate::error::DriverError;
use fixposition_protocol::ascii::encode_sentence;

pub const PVEL_TALKER: &str = "PVEL";

/// 把轮速编码为 `$PVEL` 语句
pub fn encode_wheel_speeds(speeds: &[i32]) -> Result<String, DriverError> {
    if !matches!(speeds.len(), 1 | 4) {
        return Err(DriverError::InvalidInput(format!(
            "expected 1 or 4 wheel speeds, got {}",
            speeds.len()
        )));
    }

    let mut body = PVEL_TALKER.to_string();
    for speed in speeds {
        body.push(',');
        body.push_str(&speed.to_string());
    }
    Ok(encode_sentence(&body))
}
