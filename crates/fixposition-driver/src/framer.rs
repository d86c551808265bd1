//! 帧提取（Tokenizer / Frame Extractor）
//!
//! 输入是只追加的字节缓冲，输出是完整的 [`RawRecord`]；不完整的尾部留在缓冲里等下一次读。
//! 两种帧可以在同一条流里交错出现：
//!
//! - FP_A：`$` 开头、`\n` 结尾的文本语句，XOR 校验
//! - NOV_B：`AA 44 12` 同步头的二进制帧，CRC-32 校验
//!
//! 校验失败的帧被丢弃并计入 `corrupt_frames`，然后从下一个字节继续同步。
//! 本模块不认识转换器。

use bytes::{Buf, BytesMut};
use fixposition_protocol::ascii::{MAX_SENTENCE_LEN, SENTENCE_START};
use fixposition_protocol::nov::{NOV_CRC_LEN, NOV_HEADER_LEN, NOV_MAX_MESSAGE_LEN, NOV_SYNC};
use fixposition_protocol::{AsciiRecord, NovRecord};
use tracing::{trace, warn};

/// 一个通过校验的完整帧
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Ascii(AsciiRecord),
    NovB(NovRecord),
}

/// 帧提取统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    pub ascii_frames: u64,
    pub nov_frames: u64,
    /// 校验失败、截断或超长的帧
    pub corrupt_frames: u64,
    /// 同步过程中跳过的字节
    pub discarded_bytes: u64,
}

#[derive(Debug, Default)]
pub struct Framer {
    buf: BytesMut,
    stats: FramerStats,
}

fn is_frame_start(byte: u8) -> bool {
    byte == SENTENCE_START || byte == NOV_SYNC[0]
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// 丢弃缓冲中的所有字节（重连时调用，旧连接的半帧不能和新连接拼接）
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// 取出下一个完整帧；数据不足时返回 `None`
    pub fn next_record(&mut self) -> Option<RawRecord> {
        loop {
            let start = match self.buf.iter().position(|&b| is_frame_start(b)) {
                Some(start) => start,
                None => {
                    self.discard(self.buf.len());
                    return None;
                },
            };
            self.discard(start);

            let step = if self.buf[0] == SENTENCE_START {
                self.next_ascii()
            } else {
                self.next_nov()
            };

            match step {
                Step::Record(record) => return Some(record),
                Step::NeedMore => return None,
                Step::Resync => continue,
            }
        }
    }

    fn discard(&mut self, n: usize) {
        if n > 0 {
            trace!("Discarding {} bytes while searching for sync", n);
            self.buf.advance(n);
            self.stats.discarded_bytes += n as u64;
        }
    }

    fn corrupt(&mut self, skip: usize, reason: std::fmt::Arguments<'_>) {
        warn!("Dropping corrupt frame: {}", reason);
        self.stats.corrupt_frames += 1;
        self.discard(skip);
    }

    fn next_ascii(&mut self) -> Step {
        // 语句在 `\n` 处结束；在此之前遇到新的帧头说明当前语句被截断
        let end = self
            .buf
            .iter()
            .take(MAX_SENTENCE_LEN)
            .enumerate()
            .skip(1)
            .find(|&(_, &b)| b == b'\n' || is_frame_start(b));

        match end {
            Some((end, &b'\n')) => {
                let line = self.buf.split_to(end + 1);
                match AsciiRecord::parse(&line) {
                    Ok(record) => {
                        self.stats.ascii_frames += 1;
                        Step::Record(RawRecord::Ascii(record))
                    },
                    Err(e) => {
                        warn!("Dropping corrupt frame: {}", e);
                        self.stats.corrupt_frames += 1;
                        Step::Resync
                    },
                }
            },
            Some((end, _)) => {
                self.corrupt(end, format_args!("truncated sentence ({end} bytes)"));
                Step::Resync
            },
            None if self.buf.len() >= MAX_SENTENCE_LEN => {
                self.corrupt(
                    1,
                    format_args!("sentence exceeds {MAX_SENTENCE_LEN} bytes"),
                );
                Step::Resync
            },
            None => Step::NeedMore,
        }
    }

    fn next_nov(&mut self) -> Step {
        let sync_len = self.buf.len().min(NOV_SYNC.len());
        if self.buf[..sync_len] != NOV_SYNC[..sync_len] {
            self.discard(1);
            return Step::Resync;
        }
        if self.buf.len() < NOV_HEADER_LEN {
            return Step::NeedMore;
        }

        let header_len = usize::from(self.buf[3]);
        let message_len = usize::from(u16::from_le_bytes([self.buf[8], self.buf[9]]));
        if header_len < NOV_HEADER_LEN || message_len > NOV_MAX_MESSAGE_LEN {
            // 假同步
            self.discard(1);
            return Step::Resync;
        }

        let frame_len = header_len + message_len + NOV_CRC_LEN;
        if self.buf.len() < frame_len {
            return Step::NeedMore;
        }

        match NovRecord::parse(&self.buf[..frame_len]) {
            Ok(record) => {
                self.buf.advance(frame_len);
                self.stats.nov_frames += 1;
                Step::Record(RawRecord::NovB(record))
            },
            Err(e) => {
                self.corrupt(1, format_args!("{e}"));
                Step::Resync
            },
        }
    }
}

enum Step {
    Record(RawRecord),
    NeedMore,
    Resync,
}
