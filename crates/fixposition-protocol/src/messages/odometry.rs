//! ODOMETRY 语句
//!
//! 45 个字段，下标见常量表。位置/姿态在 ECEF 中，速度/角速度/加速度在 POI 机体系中。
//!
//! 一条 ODOMETRY 派生出 ECEF 里程计、ENU0 里程计、VRTK、欧拉角、IMU 与三个 TF，
//! 见 [`OdometryRecord::to_msgs`]。

use crate::fields::{cov3_at, expect_len, gps_time_at, i32_at, quat_wxyz_at, vec3_at};
use crate::geo::{EnuOrigin, quat_to_ypr};
use crate::time::GpsTime;
use crate::types::*;
use crate::{ProtocolError, prefixed_frame};
use nalgebra::{Matrix3, Matrix6, Quaternion, UnitQuaternion, Vector3};

pub const ODOMETRY_FIELD_COUNT: usize = 45;

const GPS_WEEK_IDX: usize = 3;
const GPS_TOW_IDX: usize = 4;
const POSITION_IDX: usize = 5;
const ORIENTATION_IDX: usize = 8;
const VELOCITY_IDX: usize = 12;
const ANGULAR_VELOCITY_IDX: usize = 15;
const ACCELERATION_IDX: usize = 18;
const FUSION_STATUS_IDX: usize = 21;
const IMU_BIAS_STATUS_IDX: usize = 22;
const GNSS1_FIX_IDX: usize = 23;
const GNSS2_FIX_IDX: usize = 24;
const WHEELSPEED_STATUS_IDX: usize = 25;
const POSITION_COV_IDX: usize = 26;
const ORIENTATION_COV_IDX: usize = 32;
const VELOCITY_COV_IDX: usize = 38;
const VERSION_IDX: usize = 44;

/// ODOMETRY 语句的原始字段（已转为工程单位）
#[derive(Debug, Clone, PartialEq)]
pub struct OdometryRecord {
    pub stamp: GpsTime,
    /// POI 在 ECEF 中的位置（米）
    pub position: Vector3<f64>,
    /// ECEF → POI 姿态（w, x, y, z）
    pub orientation: Quaternion<f64>,
    pub velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    pub fusion_status: i32,
    pub imu_bias_status: i32,
    pub gnss1_fix: i32,
    pub gnss2_fix: i32,
    pub wheelspeed_status: i32,
    pub position_cov: Matrix3<f64>,
    pub orientation_cov: Matrix3<f64>,
    pub velocity_cov: Matrix3<f64>,
    pub version: String,
}

pub fn parse_odometry<S: AsRef<str>>(tokens: &[S]) -> Result<OdometryRecord, ProtocolError> {
    expect_len(tokens, "ODOMETRY", ODOMETRY_FIELD_COUNT)?;

    Ok(OdometryRecord {
        stamp: gps_time_at(tokens, GPS_WEEK_IDX, GPS_TOW_IDX)?,
        position: vec3_at(tokens, POSITION_IDX)?,
        orientation: quat_wxyz_at(tokens, ORIENTATION_IDX)?,
        velocity: vec3_at(tokens, VELOCITY_IDX)?,
        angular_velocity: vec3_at(tokens, ANGULAR_VELOCITY_IDX)?,
        acceleration: vec3_at(tokens, ACCELERATION_IDX)?,
        fusion_status: i32_at(tokens, FUSION_STATUS_IDX)?,
        imu_bias_status: i32_at(tokens, IMU_BIAS_STATUS_IDX)?,
        gnss1_fix: i32_at(tokens, GNSS1_FIX_IDX)?,
        gnss2_fix: i32_at(tokens, GNSS2_FIX_IDX)?,
        wheelspeed_status: i32_at(tokens, WHEELSPEED_STATUS_IDX)?,
        position_cov: cov3_at(tokens, POSITION_COV_IDX)?,
        orientation_cov: cov3_at(tokens, ORIENTATION_COV_IDX)?,
        velocity_cov: cov3_at(tokens, VELOCITY_COV_IDX)?,
        version: tokens[VERSION_IDX].as_ref().to_string(),
    })
}

fn block_cov(top_left: &Matrix3<f64>, bottom_right: &Matrix3<f64>) -> Matrix6<f64> {
    let mut cov = Matrix6::zeros();
    cov.fixed_view_mut::<3, 3>(0, 0).copy_from(top_left);
    cov.fixed_view_mut::<3, 3>(3, 3).copy_from(bottom_right);
    cov
}

impl OdometryRecord {
    /// 融合状态有效（可作为 ENU0 原点）
    pub fn is_fusion_valid(&self) -> bool {
        self.fusion_status > 0
    }

    /// 归一化后的 ECEF → POI 姿态，零四元数返回 `None`
    pub fn unit_orientation(&self) -> Option<UnitQuaternion<f64>> {
        UnitQuaternion::try_new(self.orientation, f64::EPSILON)
    }

    fn pose(&self) -> PoseWithCov {
        PoseWithCov {
            position: self.position,
            orientation: self.orientation,
            cov: block_cov(&self.position_cov, &self.orientation_cov),
        }
    }

    fn twist(&self) -> TwistWithCov {
        TwistWithCov {
            linear: self.velocity,
            angular: self.angular_velocity,
            cov: block_cov(&self.velocity_cov, &Matrix3::zeros()),
        }
    }

    /// ECEF 下的里程计（`FP_ECEF` → `FP_POI`）
    pub fn to_odometry(&self) -> OdometryData {
        OdometryData {
            stamp: self.stamp,
            frame_id: prefixed_frame("ECEF"),
            child_frame_id: prefixed_frame("POI"),
            pose: self.pose(),
            twist: self.twist(),
        }
    }

    /// 以 `origin` 为原点的 ENU 局部里程计（`FP_ENU0` → `FP_POI`）
    ///
    /// 位置与位置协方差旋转到 ENU；速度保持在机体系不变。
    pub fn to_odometry_enu(&self, origin: &EnuOrigin) -> OdometryData {
        let rot = origin.rot_enu_ecef.matrix();
        let position_cov = rot * self.position_cov * rot.transpose();
        let orientation = self
            .unit_orientation()
            .map(|q| (UnitQuaternion::from_rotation_matrix(&origin.rot_enu_ecef) * q).into_inner())
            .unwrap_or_else(zero_quaternion);

        OdometryData {
            stamp: self.stamp,
            frame_id: prefixed_frame("ENU0"),
            child_frame_id: prefixed_frame("POI"),
            pose: PoseWithCov {
                position: origin.ecef_to_enu(&self.position),
                orientation,
                cov: block_cov(&position_cov, &self.orientation_cov),
            },
            twist: self.twist(),
        }
    }

    pub fn to_vrtk(&self) -> VrtkData {
        VrtkData {
            stamp: self.stamp,
            frame_id: prefixed_frame("ECEF"),
            pose_frame: prefixed_frame("POI"),
            kin_frame: prefixed_frame("POI"),
            pose: self.pose(),
            velocity: self.twist(),
            acceleration: self.acceleration,
            fusion_status: self.fusion_status,
            imu_bias_status: self.imu_bias_status,
            gnss1_status: self.gnss1_fix,
            gnss2_status: self.gnss2_fix,
            wheelspeed_status: self.wheelspeed_status,
            version: self.version.clone(),
        }
    }

    /// 零偏补偿后的 IMU（POI 系）
    pub fn to_imu(&self) -> ImuData {
        ImuData {
            stamp: self.stamp,
            frame_id: prefixed_frame("POI"),
            linear_acc: self.acceleration,
            angular_vel: self.angular_velocity,
            bias_comp: true,
            imu_status: self.imu_bias_status,
        }
    }

    pub fn tf_ecef_poi(&self) -> TfData {
        TfData {
            frame_id: prefixed_frame("ECEF"),
            child_frame_id: prefixed_frame("POI"),
            translation: self.position,
            rotation: self.orientation,
        }
    }

    /// 构造全部派生输出
    ///
    /// `enu0_origin` 为 `None`（尚未锚定首次定位）时，ENU0 相关输出保持默认值。
    pub fn to_msgs(&self, enu0_origin: Option<&EnuOrigin>) -> OdometryMsgs {
        let local = EnuOrigin::from_ecef(self.position);
        let tf_ecef_enu = enu_tf(&local, "ENU");

        let (odometry_enu0, tf_ecef_enu0, eul) = match enu0_origin {
            Some(origin) => {
                let odometry_enu0 = self.to_odometry_enu(origin);
                let eul = UnitQuaternion::try_new(odometry_enu0.pose.orientation, f64::EPSILON)
                    .map(|q| quat_to_ypr(&q))
                    .unwrap_or_else(Vector3::zeros);
                (odometry_enu0, enu_tf(origin, "ENU0"), eul)
            },
            None => (OdometryData::default(), TfData::default(), Vector3::zeros()),
        };

        OdometryMsgs {
            odometry: self.to_odometry(),
            odometry_enu0,
            vrtk: self.to_vrtk(),
            eul,
            imu: self.to_imu(),
            tf_ecef_poi: self.tf_ecef_poi(),
            tf_ecef_enu,
            tf_ecef_enu0,
        }
    }
}

/// `FP_ECEF` → `FP_<child>` 的切平面 TF
fn enu_tf(origin: &EnuOrigin, child: &str) -> TfData {
    TfData {
        frame_id: prefixed_frame("ECEF"),
        child_frame_id: prefixed_frame(child),
        translation: origin.ecef,
        rotation: origin.q_ecef_enu().into_inner(),
    }
}
