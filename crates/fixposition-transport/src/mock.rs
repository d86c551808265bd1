//! Mock 传输（测试用）
//!
//! [`MockConnector`] 与它打开的所有 [`MockTransport`] 共享同一份状态，
//! 测试代码通过 connector 的克隆注入字节、模拟断线和建连失败。

use crate::{ByteTransport, Connector, TransportError};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct MockState {
    connected: bool,
    /// 当前连接代号；旧连接在重连后失效
    generation: u64,
    refuse_connects: usize,
    connect_attempts: usize,
    read_buffer: VecDeque<u8>,
    fail_next_read: bool,
    fail_writes: bool,
    written: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 注入待读取的数据
    pub fn inject_read(&self, data: &[u8]) {
        self.lock().read_buffer.extend(data);
    }

    /// 下一次读返回 IO 错误并断开连接
    pub fn fail_next_read(&self) {
        self.lock().fail_next_read = true;
    }

    /// 接下来 `count` 次建连被拒绝
    pub fn refuse_connects(&self, count: usize) {
        self.lock().refuse_connects = count;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// 已写入设备的全部字节
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    pub fn clear_written(&self) {
        self.lock().written.clear();
    }

    pub fn connect_attempts(&self) -> usize {
        self.lock().connect_attempts
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

impl Connector for MockConnector {
    fn open(&mut self) -> Result<Box<dyn ByteTransport>, TransportError> {
        let mut state = self.lock();
        state.connect_attempts += 1;
        if state.refuse_connects > 0 {
            state.refuse_connects -= 1;
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "mock refused").into());
        }

        state.connected = true;
        state.generation += 1;
        Ok(Box::new(MockTransport {
            state: Arc::clone(&self.state),
            generation: state.generation,
        }))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    generation: u64,
}

impl MockTransport {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ByteTransport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.lock();
        if !state.connected || state.generation != self.generation {
            return Err(TransportError::Closed);
        }
        if state.fail_next_read {
            state.fail_next_read = false;
            state.connected = false;
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "mock reset").into());
        }

        let n = state.read_buffer.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.read_buffer.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.connected || state.generation != self.generation {
            return Err(TransportError::Closed);
        }
        if state.fail_writes {
            state.connected = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure").into());
        }
        state.written.extend_from_slice(data);
        Ok(())
    }

    fn peer(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_write() {
        let mut connector = MockConnector::new();
        let mut transport = connector.open().unwrap();

        connector.inject_read(b"hello");
        let mut buf = [0u8; 3];
        assert_eq!(transport.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(transport.read(&mut buf).unwrap(), 0);

        transport.write_all(b"abc").unwrap();
        assert_eq!(connector.written(), b"abc");
    }

    #[test]
    fn test_mock_read_failure_disconnects() {
        let mut connector = MockConnector::new();
        let mut transport = connector.open().unwrap();

        connector.fail_next_read();
        let mut buf = [0u8; 8];
        assert!(matches!(transport.read(&mut buf), Err(TransportError::Io(_))));
        assert!(!connector.is_connected());
        assert!(matches!(transport.read(&mut buf), Err(TransportError::Closed)));
    }

    #[test]
    fn test_mock_refused_then_reconnect() {
        let mut connector = MockConnector::new();
        connector.refuse_connects(2);
        assert!(connector.open().is_err());
        assert!(connector.open().is_err());
        let old = connector.open();
        assert!(old.is_ok());
        assert_eq!(connector.connect_attempts(), 3);

        // 重连后旧连接失效
        let mut stale = old.unwrap();
        let _fresh = connector.open().unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(stale.read(&mut buf), Err(TransportError::Closed)));
    }

    #[test]
    fn test_mock_write_failure() {
        let mut connector = MockConnector::new();
        let mut transport = connector.open().unwrap();
        connector.set_fail_writes(true);
        assert!(transport.write_all(b"x").is_err());
        assert!(!connector.is_connected());
    }
}
