//! JSON Lines 输出
//!
//! 每条消息一行：`{"topic":"...","msg":{...}}`，方便用 `jq` 过滤。

use serde::Serialize;
use std::io::Write;
use tracing::warn;

#[derive(Serialize)]
struct JsonLine<'a, T: Serialize> {
    topic: &'a str,
    msg: &'a T,
}

/// 编码一行（不含换行符）
pub fn to_json_line<T: Serialize>(topic: &str, msg: &T) -> serde_json::Result<String> {
    serde_json::to_string(&JsonLine { topic, msg })
}

/// 写到标准输出；失败只记日志，不中断主循环
pub fn emit<T: Serialize>(topic: &str, msg: &T) {
    match to_json_line(topic, msg) {
        Ok(line) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{line}") {
                warn!("Failed to write {} to stdout: {}", topic, e);
            }
        },
        Err(e) => warn!("Failed to serialize {}: {}", topic, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixposition_protocol::{GnssAntenna, NavSatFixData, TfData};

    #[test]
    fn test_json_line_shape() {
        let tf = TfData {
            frame_id: "FP_POI".to_string(),
            child_frame_id: "FP_ENU0".to_string(),
            ..Default::default()
        };
        let line = to_json_line("tf", &tf).unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["topic"], "tf");
        assert_eq!(value["msg"]["frame_id"], "FP_POI");
        assert_eq!(value["msg"]["child_frame_id"], "FP_ENU0");
    }

    #[test]
    fn test_json_line_nav_sat_fix() {
        let fix = NavSatFixData {
            frame_id: GnssAntenna::Gnss2.frame_id().to_string(),
            antenna: Some(GnssAntenna::Gnss2),
            ..Default::default()
        };
        let value: serde_json::Value =
            serde_json::from_str(&to_json_line("gnss2", &fix).unwrap()).unwrap();
        assert_eq!(value["msg"]["frame_id"], "GNSS2");
        assert_eq!(value["msg"]["antenna"], "Gnss2");
    }
}
