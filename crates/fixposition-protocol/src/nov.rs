//! NOV_B 二进制帧（NovAtel OEM7 长帧头）
//!
//! ```text
//! | sync AA 44 12 | header (25 B) | payload (message_len B) | CRC-32 (4 B, LE) |
//! ```
//!
//! 所有多字节字段均为小端序。CRC 覆盖帧头 + 负载。

use crate::ProtocolError;
use crate::time::GpsTime;
use crate::types::{CovarianceType, FixStatus, GnssAntenna, NavSatFixData};
use bytes::{Buf, BufMut};
use crc::{Algorithm, Crc};
use nalgebra::Matrix3;
use num_enum::TryFromPrimitive;

/// 帧同步字节
pub const NOV_SYNC: [u8; 3] = [0xAA, 0x44, 0x12];
/// 长帧头长度
pub const NOV_HEADER_LEN: usize = 28;
/// CRC 长度
pub const NOV_CRC_LEN: usize = 4;
/// 负载长度上限，超过视为假同步
pub const NOV_MAX_MESSAGE_LEN: usize = 4096;

/// BESTGNSSPOS 消息 ID
pub const BESTGNSSPOS_ID: u16 = 1429;
/// BESTGNSSPOS 负载长度
pub const BESTGNSSPOS_LEN: usize = 72;

/// NovAtel CRC-32：反射多项式 0xEDB88320，初值 0，无输出异或
pub const NOVATEL_CRC_32: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04c1_1db7,
    init: 0x0000_0000,
    refin: true,
    refout: true,
    xorout: 0x0000_0000,
    check: 0x2dfd_2d88,
    residue: 0x0000_0000,
};

const NOV_CRC: Crc<u32> = Crc::<u32>::new(&NOVATEL_CRC_32);

pub fn nov_crc32(data: &[u8]) -> u32 {
    NOV_CRC.checksum(data)
}

/// NOV_B 长帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NovHeader {
    pub header_len: u8,
    pub message_id: u16,
    pub message_type: u8,
    /// 端口地址（区分 GNSS1/GNSS2）
    pub port_address: u8,
    /// 负载长度（不含帧头与 CRC）
    pub message_len: u16,
    pub sequence: u16,
    pub idle_time: u8,
    pub time_status: u8,
    pub week: u16,
    /// 周内毫秒
    pub milliseconds: u32,
    pub receiver_status: u32,
    pub reserved: u16,
    pub sw_version: u16,
}

impl Default for NovHeader {
    /// 其余字段为 0，帧头长度取标准长度
    fn default() -> Self {
        Self {
            header_len: NOV_HEADER_LEN as u8,
            message_id: 0,
            message_type: 0,
            port_address: 0,
            message_len: 0,
            sequence: 0,
            idle_time: 0,
            time_status: 0,
            week: 0,
            milliseconds: 0,
            receiver_status: 0,
            reserved: 0,
            sw_version: 0,
        }
    }
}

impl NovHeader {
    /// 解析帧头（`bytes` 从同步字节开始，至少 28 字节）
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < NOV_HEADER_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: NOV_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[..3] != NOV_SYNC {
            return Err(ProtocolError::Malformed("missing NOV_B sync bytes".into()));
        }

        let mut buf = &bytes[3..NOV_HEADER_LEN];
        let header = Self {
            header_len: buf.get_u8(),
            message_id: buf.get_u16_le(),
            message_type: buf.get_u8(),
            port_address: buf.get_u8(),
            message_len: buf.get_u16_le(),
            sequence: buf.get_u16_le(),
            idle_time: buf.get_u8(),
            time_status: buf.get_u8(),
            week: buf.get_u16_le(),
            milliseconds: buf.get_u32_le(),
            receiver_status: buf.get_u32_le(),
            reserved: buf.get_u16_le(),
            sw_version: buf.get_u16_le(),
        };

        if usize::from(header.header_len) < NOV_HEADER_LEN {
            return Err(ProtocolError::Malformed(format!(
                "NOV_B header length {} below {NOV_HEADER_LEN}",
                header.header_len
            )));
        }
        Ok(header)
    }

    /// 帧头（含同步字节）序列化
    pub fn to_bytes(&self) -> [u8; NOV_HEADER_LEN] {
        let mut out = [0u8; NOV_HEADER_LEN];
        let mut buf = &mut out[..];
        buf.put_slice(&NOV_SYNC);
        buf.put_u8(self.header_len);
        buf.put_u16_le(self.message_id);
        buf.put_u8(self.message_type);
        buf.put_u8(self.port_address);
        buf.put_u16_le(self.message_len);
        buf.put_u16_le(self.sequence);
        buf.put_u8(self.idle_time);
        buf.put_u8(self.time_status);
        buf.put_u16_le(self.week);
        buf.put_u32_le(self.milliseconds);
        buf.put_u32_le(self.receiver_status);
        buf.put_u16_le(self.reserved);
        buf.put_u16_le(self.sw_version);
        out
    }

    /// 完整帧长度（帧头 + 负载 + CRC）
    pub fn frame_len(&self) -> usize {
        usize::from(self.header_len) + usize::from(self.message_len) + NOV_CRC_LEN
    }

    pub fn stamp(&self) -> GpsTime {
        GpsTime::from_week_ms(self.week, self.milliseconds)
    }

    pub fn antenna(&self) -> GnssAntenna {
        GnssAntenna::from_port_address(self.port_address)
    }
}

/// 一个通过 CRC 校验的 NOV_B 帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovRecord {
    pub header: NovHeader,
    pub payload: Vec<u8>,
}

impl NovRecord {
    /// 解析并校验完整帧
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let header = NovHeader::parse(frame)?;
        let frame_len = header.frame_len();
        if frame.len() != frame_len {
            return Err(ProtocolError::InvalidLength {
                expected: frame_len,
                actual: frame.len(),
            });
        }

        let crc_start = frame_len - NOV_CRC_LEN;
        let computed = nov_crc32(&frame[..crc_start]);
        let expected = (&frame[crc_start..]).get_u32_le();
        if expected != computed {
            return Err(ProtocolError::Crc { expected, computed });
        }

        Ok(Self {
            header,
            payload: frame[usize::from(header.header_len)..crc_start].to_vec(),
        })
    }

    /// 按帧头字段编码为完整帧（`message_len` 与 `header_len` 会被重写）
    pub fn encode(header: NovHeader, payload: &[u8]) -> Vec<u8> {
        let header = NovHeader {
            header_len: NOV_HEADER_LEN as u8,
            message_len: payload.len() as u16,
            ..header
        };
        let mut frame = Vec::with_capacity(header.frame_len());
        frame.extend_from_slice(&header.to_bytes());
        frame.extend_from_slice(payload);
        let crc = nov_crc32(&frame);
        frame.put_u32_le(crc);
        frame
    }

    pub fn message_id(&self) -> u16 {
        self.header.message_id
    }
}

/// 解算状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum SolutionStatus {
    SolComputed = 0,
    InsufficientObs = 1,
    NoConvergence = 2,
    Singularity = 3,
    CovTrace = 4,
    TestDist = 5,
    ColdStart = 6,
    VHLimit = 7,
    Variance = 8,
    Residuals = 9,
    IntegrityWarning = 13,
    Pending = 18,
    InvalidFix = 19,
    Unauthorized = 20,
    InvalidRate = 22,
}

/// 定位类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum PositionType {
    None = 0,
    FixedPos = 1,
    FixedHeight = 2,
    DopplerVelocity = 8,
    Single = 16,
    Psrdiff = 17,
    Waas = 18,
    Propagated = 19,
    L1Float = 32,
    NarrowFloat = 34,
    L1Int = 48,
    WideInt = 49,
    NarrowInt = 50,
    RtkDirectIns = 51,
    InsSbas = 52,
    InsPsrsp = 53,
    InsPsrdiff = 54,
    InsRtkFloat = 55,
    InsRtkFixed = 56,
    PppConverging = 68,
    Ppp = 69,
    Operational = 70,
    Warning = 71,
    OutOfBounds = 72,
    InsPppConverging = 73,
    InsPpp = 74,
    PppBasicConverging = 77,
    PppBasic = 78,
    InsPppBasicConverging = 79,
    InsPppBasic = 80,
}

impl PositionType {
    fn fix_status(self) -> FixStatus {
        use PositionType::*;
        match self {
            None | Operational | Warning | OutOfBounds => FixStatus::NoFix,
            FixedPos | FixedHeight | DopplerVelocity | Single | Propagated => FixStatus::Fix,
            Psrdiff | Waas | InsSbas | InsPsrsp | InsPsrdiff | PppConverging | Ppp
            | InsPppConverging | InsPpp | PppBasicConverging | PppBasic
            | InsPppBasicConverging | InsPppBasic => FixStatus::SbasFix,
            L1Float | NarrowFloat | L1Int | WideInt | NarrowInt | RtkDirectIns | InsRtkFloat
            | InsRtkFixed => FixStatus::GbasFix,
        }
    }
}

/// BESTGNSSPOS 负载
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestGnssPos {
    /// 原始解算状态（未知取值保留原值）
    pub solution_status: u32,
    /// 原始定位类型（未知取值保留原值）
    pub position_type: u32,
    /// 纬度（度）
    pub lat: f64,
    /// 经度（度）
    pub lon: f64,
    /// 海拔高（米，相对大地水准面）
    pub hgt: f64,
    /// 大地水准面起伏（米）
    pub undulation: f32,
    pub datum_id: u32,
    pub lat_stdev: f32,
    pub lon_stdev: f32,
    pub hgt_stdev: f32,
    pub station_id: [u8; 4],
    pub diff_age: f32,
    pub sol_age: f32,
    pub num_svs: u8,
    pub num_sol_svs: u8,
    pub num_sol_l1_svs: u8,
    pub num_sol_multi_svs: u8,
    pub reserved: u8,
    pub ext_sol_status: u8,
    pub galileo_beidou_sig_mask: u8,
    pub gps_glonass_sig_mask: u8,
}

impl BestGnssPos {
    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() != BESTGNSSPOS_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: BESTGNSSPOS_LEN,
                actual: payload.len(),
            });
        }

        let mut buf = payload;
        Ok(Self {
            solution_status: buf.get_u32_le(),
            position_type: buf.get_u32_le(),
            lat: buf.get_f64_le(),
            lon: buf.get_f64_le(),
            hgt: buf.get_f64_le(),
            undulation: buf.get_f32_le(),
            datum_id: buf.get_u32_le(),
            lat_stdev: buf.get_f32_le(),
            lon_stdev: buf.get_f32_le(),
            hgt_stdev: buf.get_f32_le(),
            station_id: {
                let mut id = [0u8; 4];
                buf.copy_to_slice(&mut id);
                id
            },
            diff_age: buf.get_f32_le(),
            sol_age: buf.get_f32_le(),
            num_svs: buf.get_u8(),
            num_sol_svs: buf.get_u8(),
            num_sol_l1_svs: buf.get_u8(),
            num_sol_multi_svs: buf.get_u8(),
            reserved: buf.get_u8(),
            ext_sol_status: buf.get_u8(),
            galileo_beidou_sig_mask: buf.get_u8(),
            gps_glonass_sig_mask: buf.get_u8(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BESTGNSSPOS_LEN);
        out.put_u32_le(self.solution_status);
        out.put_u32_le(self.position_type);
        out.put_f64_le(self.lat);
        out.put_f64_le(self.lon);
        out.put_f64_le(self.hgt);
        out.put_f32_le(self.undulation);
        out.put_u32_le(self.datum_id);
        out.put_f32_le(self.lat_stdev);
        out.put_f32_le(self.lon_stdev);
        out.put_f32_le(self.hgt_stdev);
        out.put_slice(&self.station_id);
        out.put_f32_le(self.diff_age);
        out.put_f32_le(self.sol_age);
        out.put_slice(&[
            self.num_svs,
            self.num_sol_svs,
            self.num_sol_l1_svs,
            self.num_sol_multi_svs,
            self.reserved,
            self.ext_sol_status,
            self.galileo_beidou_sig_mask,
            self.gps_glonass_sig_mask,
        ]);
        out
    }

    pub fn solution_status(&self) -> Option<SolutionStatus> {
        SolutionStatus::try_from(self.solution_status).ok()
    }

    pub fn position_type(&self) -> Option<PositionType> {
        PositionType::try_from(self.position_type).ok()
    }

    /// 定位状态：未解算或未知定位类型一律视为无定位
    pub fn fix_status(&self) -> FixStatus {
        match (self.solution_status(), self.position_type()) {
            (Some(SolutionStatus::SolComputed), Some(pos_type)) => pos_type.fix_status(),
            _ => FixStatus::NoFix,
        }
    }

    /// 转为通用 `NavSatFixData`，天线由帧头端口地址决定
    pub fn to_nav_sat_fix(&self, header: &NovHeader) -> NavSatFixData {
        let antenna = header.antenna();
        let (e, n, u) = (
            f64::from(self.lon_stdev),
            f64::from(self.lat_stdev),
            f64::from(self.hgt_stdev),
        );

        NavSatFixData {
            stamp: header.stamp(),
            frame_id: antenna.frame_id().to_string(),
            antenna: Some(antenna),
            latitude: self.lat,
            longitude: self.lon,
            altitude: self.hgt + f64::from(self.undulation),
            cov: Matrix3::from_diagonal(&nalgebra::Vector3::new(e * e, n * n, u * u)),
            position_covariance_type: CovarianceType::DiagonalKnown,
            status: self.fix_status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(port_address: u8) -> NovHeader {
        NovHeader {
            message_id: BESTGNSSPOS_ID,
            port_address,
            sequence: 7,
            time_status: 180,
            week: 2231,
            milliseconds: 227_610_750,
            ..Default::default()
        }
    }

    fn sample_payload() -> BestGnssPos {
        BestGnssPos {
            solution_status: 0,
            position_type: 50,
            lat: 47.392,
            lon: 8.448,
            hgt: 425.0,
            undulation: 48.5,
            datum_id: 61,
            lat_stdev: 0.02,
            lon_stdev: 0.01,
            hgt_stdev: 0.04,
            station_id: *b"0000",
            diff_age: 1.0,
            sol_age: 0.0,
            num_svs: 30,
            num_sol_svs: 25,
            num_sol_l1_svs: 25,
            num_sol_multi_svs: 20,
            reserved: 0,
            ext_sol_status: 0,
            galileo_beidou_sig_mask: 0,
            gps_glonass_sig_mask: 0,
        }
    }

    #[test]
    fn test_crc_check_value() {
        assert_eq!(nov_crc32(b"123456789"), NOVATEL_CRC_32.check);
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample_header(0x20).to_bytes();
        assert_eq!(&bytes[..3], &NOV_SYNC);
        // message id 1429 = 0x0595，小端
        assert_eq!(bytes[4..6], [0x95, 0x05]);
        assert_eq!(bytes[7], 0x20);

        let header = NovHeader::parse(&bytes).unwrap();
        assert_eq!(header.week, 2231);
        assert_eq!(header.milliseconds, 227_610_750);
    }

    #[test]
    fn test_header_too_short() {
        assert_eq!(
            NovHeader::parse(&NOV_SYNC),
            Err(ProtocolError::InvalidLength {
                expected: 28,
                actual: 3
            })
        );
    }

    #[test]
    fn test_record_encode_parse() {
        let payload = sample_payload().to_bytes();
        assert_eq!(payload.len(), BESTGNSSPOS_LEN);

        let frame = NovRecord::encode(sample_header(0x40), &payload);
        assert_eq!(frame.len(), NOV_HEADER_LEN + BESTGNSSPOS_LEN + NOV_CRC_LEN);

        let record = NovRecord::parse(&frame).unwrap();
        assert_eq!(record.message_id(), BESTGNSSPOS_ID);
        assert_eq!(record.header.message_len as usize, BESTGNSSPOS_LEN);
        assert_eq!(record.payload, payload);
    }

    #[test]
    fn test_record_crc_mismatch() {
        let mut frame = NovRecord::encode(sample_header(0x20), &sample_payload().to_bytes());
        frame[40] ^= 0xFF;
        assert!(matches!(
            NovRecord::parse(&frame),
            Err(ProtocolError::Crc { .. })
        ));
    }

    #[test]
    fn test_bestgnsspos_to_nav_sat_fix() {
        let pos = BestGnssPos::parse(&sample_payload().to_bytes()).unwrap();
        let fix = pos.to_nav_sat_fix(&sample_header(0x40));

        assert_eq!(fix.frame_id, "GNSS2");
        assert_eq!(fix.antenna, Some(GnssAntenna::Gnss2));
        assert_eq!(fix.latitude, 47.392);
        assert_eq!(fix.altitude, 425.0 + 48.5);
        assert_eq!(fix.status, FixStatus::GbasFix);
        assert_eq!(fix.stamp, GpsTime::from_week_ms(2231, 227_610_750));
        assert!((fix.cov[(0, 0)] - 0.0001).abs() < 1e-9);
        assert!((fix.cov[(1, 1)] - 0.0004).abs() < 1e-9);
        assert_eq!(fix.cov[(0, 1)], 0.0);
    }

    #[test]
    fn test_fix_status_mapping() {
        let mut pos = sample_payload();
        pos.position_type = PositionType::Single as u32;
        assert_eq!(pos.fix_status(), FixStatus::Fix);

        pos.position_type = PositionType::Waas as u32;
        assert_eq!(pos.fix_status(), FixStatus::SbasFix);

        pos.position_type = 999;
        assert_eq!(pos.fix_status(), FixStatus::NoFix);

        pos.position_type = PositionType::NarrowInt as u32;
        pos.solution_status = SolutionStatus::InsufficientObs as u32;
        assert_eq!(pos.fix_status(), FixStatus::NoFix);
    }

    #[test]
    fn test_payload_too_short() {
        assert!(matches!(
            BestGnssPos::parse(&[0u8; 10]),
            Err(ProtocolError::InvalidLength { expected: 72, .. })
        ));
    }

    #[test]
    fn test_payload_too_long() {
        let mut payload = sample_payload().to_bytes().to_vec();
        payload.extend([0u8; 8]);
        assert_eq!(
            BestGnssPos::parse(&payload),
            Err(ProtocolError::InvalidLength {
                expected: 72,
                actual: 80
            })
        );
    }

    #[test]
    fn test_default_header_is_valid() {
        let header = NovHeader::default();
        assert_eq!(usize::from(header.header_len), NOV_HEADER_LEN);
        assert_eq!(NovHeader::parse(&header.to_bytes()), Ok(header));
    }
}
