//! 连接管理
//!
//! 状态只有两个：`Disconnected`（初始）与 `Connected`。重连等待由调用方负责：
//! 本模块只提供“尝试连接”和“一次读周期”，不自己安排定时器，保持单线程协作式。
//!
//! 一次读周期：有限超时地读一次 → 送入帧提取 → 对每个完整帧调用回调 → 返回传输是否健康。

use crate::framer::{Framer, FramerStats, RawRecord};
use fixposition_transport::{ByteTransport, Connector, TransportError};
use tracing::{error, info, warn};

/// 单次读的缓冲大小
pub const READ_CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn ByteTransport>>,
    framer: Framer,
    last_error: Option<String>,
    read_buf: Box<[u8]>,
}

impl ConnectionManager {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            transport: None,
            framer: Framer::new(),
            last_error: None,
            read_buf: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        if self.transport.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// 最近一次传输错误的描述
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 打开连接；已连接时为空操作
    pub fn connect(&mut self) -> Result<(), TransportError> {
        if self.transport.is_some() {
            return Ok(());
        }

        match self.connector.open() {
            Ok(transport) => {
                info!("Connected to {}", transport.peer());
                // 旧连接残留的半帧不能与新连接的数据拼接
                self.framer.clear();
                self.transport = Some(transport);
                self.last_error = None;
                Ok(())
            },
            Err(e) => {
                warn!("Failed to connect to {}: {}", self.connector.describe(), e);
                self.last_error = Some(e.to_string());
                Err(e)
            },
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(transport) = self.transport.take() {
            info!("Disconnected from {}", transport.peer());
        }
    }

    fn mark_failed(&mut self, what: &str, e: TransportError) {
        if let Some(transport) = self.transport.take() {
            error!("{} failed on {}: {}", what, transport.peer(), e);
        }
        self.last_error = Some(e.to_string());
    }

    /// 一次读周期，返回传输是否健康
    ///
    /// 读失败（含 EOF）会断开连接并返回 `false`；未连接时直接返回 `false`。
    pub fn read_cycle(&mut self, mut on_record: impl FnMut(RawRecord)) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };

        match transport.read(&mut self.read_buf) {
            Ok(n) => {
                self.framer.extend(&self.read_buf[..n]);
                while let Some(record) = self.framer.next_record() {
                    on_record(record);
                }
                true
            },
            Err(e) => {
                self.mark_failed("Read", e);
                false
            },
        }
    }

    /// 写入设备；失败与读失败同等对待
    pub fn write(&mut self, data: &[u8]) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };

        match transport.write_all(data) {
            Ok(()) => true,
            Err(e) => {
                self.mark_failed("Write", e);
                false
            },
        }
    }

    pub fn framer_stats(&self) -> FramerStats {
        self.framer.stats()
    }
}
