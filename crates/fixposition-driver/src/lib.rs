//! # Fixposition Driver
//!
//! Fixposition GNSS/INS 传感器驱动核心：解码 → 转换 → 分发，以及喂数据的连接生命周期。
//!
//! - 帧提取：FP_A 文本语句与 NOV_B 二进制帧，校验失败的帧丢弃
//! - 路由：按消息类型查表，未启用的类型静默丢弃
//! - 转换器：ODOMETRY / LLH / RAWIMU / CORRIMU / TF / BESTGNSSPOS → 类型化消息
//! - 观察者：每个转换器一个有序回调列表，同步调用
//! - 连接管理：建连、有限超时读、断线即不健康，重连节奏由调用方决定
//!
//! 全部在调用方的单个线程上协作式运行，内部没有锁也没有后台线程。
//! 观察者必须在读循环开始前注册完毕。

mod builder;
pub mod config;
pub mod connection;
pub mod converter;
mod driver;
mod error;
pub mod framer;
pub mod hooks;
pub mod router;
pub mod wheelspeed;

pub use builder::DriverBuilder;
pub use config::{ConfigError, DriverParams};
pub use connection::{ConnectionManager, ConnectionState};
pub use converter::{ConverterStats, imu_pitch_roll};
pub use driver::{DriverStats, FixpositionDriver};
pub use error::DriverError;
pub use framer::{Framer, FramerStats, RawRecord};
pub use hooks::ObserverList;
pub use router::Router;
