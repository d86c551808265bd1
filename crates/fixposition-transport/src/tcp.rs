//! TCP 传输
//!
//! 传感器在固定端口（默认 21000）上以 TCP 服务端身份输出数据流。

use crate::{ByteTransport, TransportError};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

pub struct TcpTransport {
    stream: TcpStream,
    peer: String,
}

impl TcpTransport {
    /// 连接传感器
    ///
    /// 依次尝试解析出的每个地址，返回第一个成功的连接。
    pub fn connect(
        ip: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let addrs: Vec<_> = (ip, port)
            .to_socket_addrs()
            .map_err(|e| TransportError::InvalidAddress(format!("{ip}:{port}: {e}")))?
            .collect();

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(read_timeout))?;
                    stream.set_nodelay(true)?;
                    let peer = addr.to_string();
                    debug!("TCP stream open to {}", peer);
                    return Ok(Self { stream, peer });
                },
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                },
            }
        }

        Err(match last_err {
            Some(e) => TransportError::Io(e),
            None => TransportError::InvalidAddress(format!("{ip}:{port}: no address resolved")),
        })
    }
}

impl ByteTransport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.stream.read(buf) {
            Ok(0) if !buf.is_empty() => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            },
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(data)?;
        Ok(())
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}
