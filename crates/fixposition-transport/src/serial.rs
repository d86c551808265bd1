//! 串口传输（8N1，无流控）

use crate::{ByteTransport, TransportError};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::debug;

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialTransport {
    /// 打开串口
    ///
    /// * `path` - 设备路径（如 "/dev/ttyUSB0"）
    /// * `baud_rate` - 波特率（如 115200）
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()?;

        debug!("Opened serial port {} at {} baud", path, baud_rate);

        Ok(Self {
            port,
            path: path.to_string(),
        })
    }
}

impl ByteTransport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn peer(&self) -> String {
        self.path.clone()
    }
}
