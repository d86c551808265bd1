//! 类型化消息（工程单位）
//!
//! 每次解码成功构造一次；解码失败时转换器把持有的消息重置为 `Default`
//! （全零向量、空 frame id），避免陈旧数据被误用。

use crate::time::GpsTime;
use nalgebra::{Matrix3, Matrix6, Quaternion, Vector3};

/// 全零四元数（默认值，明确表示“无效”）
pub(crate) fn zero_quaternion() -> Quaternion<f64> {
    Quaternion::new(0.0, 0.0, 0.0, 0.0)
}

// ============================================================================
// TF
// ============================================================================

/// 坐标变换 `frame_id` → `child_frame_id`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TfData {
    pub frame_id: String,
    pub child_frame_id: String,
    /// 平移（米）
    pub translation: Vector3<f64>,
    /// 旋转（w, x, y, z）
    pub rotation: Quaternion<f64>,
}

impl Default for TfData {
    fn default() -> Self {
        Self {
            frame_id: String::new(),
            child_frame_id: String::new(),
            translation: Vector3::zeros(),
            rotation: zero_quaternion(),
        }
    }
}

// ============================================================================
// IMU
// ============================================================================

/// IMU 采样
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuData {
    pub stamp: GpsTime,
    pub frame_id: String,
    /// 线加速度（m/s²）
    pub linear_acc: Vector3<f64>,
    /// 角速度（rad/s）
    pub angular_vel: Vector3<f64>,
    /// 是否已做零偏补偿
    pub bias_comp: bool,
    /// IMU 零偏状态
    pub imu_status: i32,
}

impl Default for ImuData {
    fn default() -> Self {
        Self {
            stamp: GpsTime::default(),
            frame_id: String::new(),
            linear_acc: Vector3::zeros(),
            angular_vel: Vector3::zeros(),
            bias_comp: false,
            imu_status: 0,
        }
    }
}

// ============================================================================
// NavSatFix
// ============================================================================

/// 定位状态（与 ROS `NavSatStatus` 数值一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixStatus {
    #[default]
    NoFix = -1,
    Fix = 0,
    SbasFix = 1,
    GbasFix = 2,
}

/// 位置协方差类型（与 ROS `NavSatFix` 数值一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CovarianceType {
    #[default]
    Unknown = 0,
    Approximated = 1,
    DiagonalKnown = 2,
    Known = 3,
}

/// BESTGNSSPOS 的来源天线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GnssAntenna {
    Gnss1,
    Gnss2,
    /// 端口地址无法区分天线
    Generic,
}

/// 天线对应的输出通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GnssOutput {
    Gnss1,
    Gnss2,
}

impl GnssAntenna {
    /// NOV_B 帧头中 COM1 的端口地址
    pub const COM1_PORT_ADDRESS: u8 = 0x20;
    /// NOV_B 帧头中 COM2 的端口地址
    pub const COM2_PORT_ADDRESS: u8 = 0x40;

    pub fn from_port_address(port_address: u8) -> Self {
        match port_address {
            Self::COM1_PORT_ADDRESS => GnssAntenna::Gnss1,
            Self::COM2_PORT_ADDRESS => GnssAntenna::Gnss2,
            _ => GnssAntenna::Generic,
        }
    }

    pub const fn frame_id(self) -> &'static str {
        match self {
            GnssAntenna::Gnss1 => "GNSS1",
            GnssAntenna::Gnss2 => "GNSS2",
            GnssAntenna::Generic => "GNSS",
        }
    }

    /// 消费侧路由：GNSS1 与未区分的 GNSS 走通道 1，GNSS2 走通道 2
    pub const fn output(self) -> GnssOutput {
        match self {
            GnssAntenna::Gnss1 | GnssAntenna::Generic => GnssOutput::Gnss1,
            GnssAntenna::Gnss2 => GnssOutput::Gnss2,
        }
    }
}

/// 大地坐标定位结果
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavSatFixData {
    pub stamp: GpsTime,
    pub frame_id: String,
    /// 仅 NOV_B 结果携带
    pub antenna: Option<GnssAntenna>,
    /// 纬度（度）
    pub latitude: f64,
    /// 经度（度）
    pub longitude: f64,
    /// 椭球高（米）
    pub altitude: f64,
    /// ENU 顺序的位置协方差（m²）
    pub cov: Matrix3<f64>,
    pub position_covariance_type: CovarianceType,
    pub status: FixStatus,
}

impl Default for NavSatFixData {
    fn default() -> Self {
        Self {
            stamp: GpsTime::default(),
            frame_id: String::new(),
            antenna: None,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            cov: Matrix3::zeros(),
            position_covariance_type: CovarianceType::Unknown,
            status: FixStatus::NoFix,
        }
    }
}

// ============================================================================
// Odometry
// ============================================================================

/// 带协方差的位姿（协方差 6x6：位置块在左上，姿态块在右下）
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoseWithCov {
    pub position: Vector3<f64>,
    pub orientation: Quaternion<f64>,
    pub cov: Matrix6<f64>,
}

impl Default for PoseWithCov {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: zero_quaternion(),
            cov: Matrix6::zeros(),
        }
    }
}

/// 带协方差的速度（协方差 6x6：线速度块在左上）
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TwistWithCov {
    pub linear: Vector3<f64>,
    pub angular: Vector3<f64>,
    pub cov: Matrix6<f64>,
}

impl Default for TwistWithCov {
    fn default() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
            cov: Matrix6::zeros(),
        }
    }
}

/// 里程计
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdometryData {
    pub stamp: GpsTime,
    pub frame_id: String,
    pub child_frame_id: String,
    pub pose: PoseWithCov,
    /// 在 `child_frame_id` 坐标系中表示
    pub twist: TwistWithCov,
}

/// VRTK 状态汇总
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VrtkData {
    pub stamp: GpsTime,
    pub frame_id: String,
    pub pose_frame: String,
    pub kin_frame: String,
    pub pose: PoseWithCov,
    pub velocity: TwistWithCov,
    pub acceleration: Vector3<f64>,
    pub fusion_status: i32,
    pub imu_bias_status: i32,
    pub gnss1_status: i32,
    pub gnss2_status: i32,
    pub wheelspeed_status: i32,
    pub version: String,
}

impl Default for VrtkData {
    fn default() -> Self {
        Self {
            stamp: GpsTime::default(),
            frame_id: String::new(),
            pose_frame: String::new(),
            kin_frame: String::new(),
            pose: PoseWithCov::default(),
            velocity: TwistWithCov::default(),
            acceleration: Vector3::zeros(),
            fusion_status: 0,
            imu_bias_status: 0,
            gnss1_status: 0,
            gnss2_status: 0,
            wheelspeed_status: 0,
            version: String::new(),
        }
    }
}

/// 一条 ODOMETRY 语句派生出的全部输出
///
/// 所有字段共享同一个时间戳，必须由同一条记录构造。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdometryMsgs {
    /// ECEF 下的位姿
    pub odometry: OdometryData,
    /// 以首次定位为原点的 ENU0 局部位姿
    pub odometry_enu0: OdometryData,
    pub vrtk: VrtkData,
    /// ENU0 下的 yaw, pitch, roll（弧度）
    pub eul: Vector3<f64>,
    /// 零偏补偿后的 IMU
    pub imu: ImuData,
    pub tf_ecef_poi: TfData,
    pub tf_ecef_enu: TfData,
    pub tf_ecef_enu0: TfData,
}

impl Default for OdometryMsgs {
    fn default() -> Self {
        Self {
            odometry: OdometryData::default(),
            odometry_enu0: OdometryData::default(),
            vrtk: VrtkData::default(),
            eul: Vector3::zeros(),
            imu: ImuData::default(),
            tf_ecef_poi: TfData::default(),
            tf_ecef_enu: TfData::default(),
            tf_ecef_enu0: TfData::default(),
        }
    }
}
