//! WGS84 大地测量工具
//!
//! ECEF ↔ LLH 换算、ENU 切平面旋转、四元数 → 欧拉角。

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

/// WGS84 长半轴（米）
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 扁率
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 第一偏心率平方
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// ECEF（米）→ 纬度、经度（弧度）、椭球高（米）
pub fn ecef_to_llh(ecef: &Vector3<f64>) -> Vector3<f64> {
    let (x, y, z) = (ecef.x, ecef.y, ecef.z);
    let p = x.hypot(y);
    let lon = y.atan2(x);

    if p < 1e-9 {
        let b = WGS84_A * (1.0 - WGS84_F);
        let lat = std::f64::consts::FRAC_PI_2.copysign(z);
        return Vector3::new(lat, lon, z.abs() - b);
    }

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut height = 0.0;
    for _ in 0..8 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        height = p / lat.cos() - n;
        lat = z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
    }

    Vector3::new(lat, lon, height)
}

/// 纬度、经度（弧度）、椭球高（米）→ ECEF（米）
pub fn llh_to_ecef(llh: &Vector3<f64>) -> Vector3<f64> {
    let (lat, lon, height) = (llh.x, llh.y, llh.z);
    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    Vector3::new(
        (n + height) * lat.cos() * lon.cos(),
        (n + height) * lat.cos() * lon.sin(),
        (n * (1.0 - WGS84_E2) + height) * sin_lat,
    )
}

/// ECEF → ENU 的旋转（把 ECEF 向量表示到 (lat, lon) 处的 ENU 切平面）
pub fn rot_enu_ecef(lat: f64, lon: f64) -> Rotation3<f64> {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Rotation3::from_matrix_unchecked(Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    ))
}

/// 四元数 → (yaw, pitch, roll)，ZYX 顺序，弧度
pub fn quat_to_ypr(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = q.euler_angles();
    Vector3::new(yaw, pitch, roll)
}

/// ENU 切平面原点
#[derive(Debug, Clone, PartialEq)]
pub struct EnuOrigin {
    /// 原点 ECEF 坐标（米）
    pub ecef: Vector3<f64>,
    /// 原点 LLH（弧度、弧度、米）
    pub llh: Vector3<f64>,
    /// ECEF → ENU 旋转
    pub rot_enu_ecef: Rotation3<f64>,
}

impl EnuOrigin {
    pub fn from_ecef(ecef: Vector3<f64>) -> Self {
        let llh = ecef_to_llh(&ecef);
        Self {
            ecef,
            llh,
            rot_enu_ecef: rot_enu_ecef(llh.x, llh.y),
        }
    }

    /// ECEF 点 → 以本原点为基准的 ENU 坐标
    pub fn ecef_to_enu(&self, ecef: &Vector3<f64>) -> Vector3<f64> {
        self.rot_enu_ecef * (ecef - self.ecef)
    }

    /// ENU → ECEF 的旋转四元数（即 TF `ECEF → ENU` 的姿态）
    pub fn q_ecef_enu(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&self.rot_enu_ecef.inverse())
    }
}
