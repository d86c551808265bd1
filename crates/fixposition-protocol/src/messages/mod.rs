//! FP_A 消息字段表与解析
//!
//! 字段数与下标是与设备固件的约定，必须逐位一致。下标从 token 0（`FP`）开始计数。

pub mod imu;
pub mod llh;
pub mod odometry;
pub mod tf;

pub use imu::{IMU_FIELD_COUNT, ImuKind, parse_imu};
pub use llh::{LLH_FIELD_COUNT, parse_llh};
pub use odometry::{ODOMETRY_FIELD_COUNT, OdometryRecord, parse_odometry};
pub use tf::{TF_FIELD_COUNT, parse_tf};
