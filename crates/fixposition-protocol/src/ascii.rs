//! FP_A 文本语句
//!
//! 格式：`$FP,<TYPE>,<VERSION>,<fields...>*HH\r\n`
//!
//! - `HH`：`$` 与 `*` 之间所有字节异或后的两位十六进制
//! - 字段以 `,` 分隔，逐个去除首尾空白
//! - token 0 为 talker（`FP`），token 1 为消息类型，token 2 为版本号

use crate::ProtocolError;

/// 语句起始符
pub const SENTENCE_START: u8 = b'$';
/// 校验和标记
pub const CHECKSUM_MARKER: u8 = b'*';
/// 字段分隔符
pub const FIELD_SEPARATOR: char = ',';
/// Fixposition 语句的 talker
pub const FP_TALKER: &str = "FP";
/// 单条语句的最大长度（含 `$` 与 `\r\n`）
pub const MAX_SENTENCE_LEN: usize = 1024;

/// 计算 NMEA 风格的异或校验和
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc ^ b)
}

/// 把语句主体封装为完整语句（`$` + 主体 + `*HH\r\n`）
///
/// ```
/// use fixposition_protocol::ascii::encode_sentence;
///
/// let line = encode_sentence("FP,TF,1,POI,ENU0,1.0,2.0,3.0,1.0,0.0,0.0,0.0");
/// assert!(line.ends_with("*0E\r\n"));
/// ```
pub fn encode_sentence(body: &str) -> String {
    format!("${body}*{:02X}\r\n", checksum(body.as_bytes()))
}

/// 一条通过校验的 FP_A 语句
///
/// 解析后即被路由消费，不做保留。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiRecord {
    tokens: Vec<String>,
}

impl AsciiRecord {
    /// 解析并校验一行语句
    ///
    /// `line` 以 `$` 开头，可带或不带结尾的 `\r\n`。
    ///
    /// # Errors
    /// - `ProtocolError::Malformed`: 缺少 `$`/`*`、校验和不是两位十六进制、非 UTF-8
    /// - `ProtocolError::Checksum`: 校验和不一致
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let line = line.trim_ascii_end();

        let Some((&SENTENCE_START, rest)) = line.split_first() else {
            return Err(ProtocolError::Malformed("sentence must start with '$'".into()));
        };

        let marker = rest
            .iter()
            .rposition(|&b| b == CHECKSUM_MARKER)
            .ok_or_else(|| ProtocolError::Malformed("missing checksum marker".into()))?;
        let (body, trailer) = (&rest[..marker], &rest[marker + 1..]);

        let expected = parse_checksum(trailer)?;
        let computed = checksum(body);
        if expected != computed {
            return Err(ProtocolError::Checksum { expected, computed });
        }

        let body = std::str::from_utf8(body)
            .map_err(|_| ProtocolError::Malformed("sentence is not valid UTF-8".into()))?;
        let tokens: Vec<String> = body
            .split(FIELD_SEPARATOR)
            .map(|token| token.trim().to_string())
            .collect();

        if tokens[0] == FP_TALKER && tokens.len() < 3 {
            return Err(ProtocolError::Malformed(format!(
                "FP sentence with only {} fields",
                tokens.len()
            )));
        }

        Ok(Self { tokens })
    }

    /// 直接由 token 构造（测试与回放使用）
    pub fn from_tokens<S: Into<String>>(tokens: impl IntoIterator<Item = S>) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    pub fn talker(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    /// 路由键
    ///
    /// `FP` 语句返回 token 1（如 `ODOMETRY`），其他 talker（如 NMEA `GPGGA`）返回 talker 本身。
    pub fn message_type(&self) -> &str {
        if self.talker() == FP_TALKER {
            self.tokens.get(1).map(String::as_str).unwrap_or_default()
        } else {
            self.talker()
        }
    }

    /// 消息版本（仅 `FP` 语句）
    pub fn version(&self) -> Option<&str> {
        if self.talker() == FP_TALKER {
            self.tokens.get(2).map(String::as_str)
        } else {
            None
        }
    }
}

fn parse_checksum(trailer: &[u8]) -> Result<u8, ProtocolError> {
    let malformed = || {
        ProtocolError::Malformed(format!(
            "checksum field {:?} is not two hex digits",
            String::from_utf8_lossy(trailer)
        ))
    };

    if trailer.len() != 2 {
        return Err(malformed());
    }
    let text = std::str::from_utf8(trailer).map_err(|_| malformed())?;
    u8::from_str_radix(text, 16).map_err(|_| malformed())
}
