//! # Fixposition CLI
//!
//! 连接 Fixposition 传感器，把启用的输出以 JSON Lines 打印到标准输出，日志走标准错误。
//!
//! ```bash
//! # 默认参数：TCP 10.0.2.1:21000，全部输出格式，100 Hz
//! fixposition-cli
//!
//! # 参数文件 + 命令行覆盖
//! fixposition-cli --config fixposition.toml --serial /dev/ttyUSB0 --baud 460800
//!
//! # 只要 TF 和 LLH，同时回写四轮轮速（mm/s）
//! fixposition-cli --formats TF,LLH --wheel-speeds 100,100,98,98 | jq .
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，默认 `fixposition=info`。

use anyhow::{Context, Result, bail};
use clap::Parser;
use fixposition_driver::config::InputType;
use fixposition_driver::wheelspeed::encode_wheel_speeds;
use fixposition_driver::{DriverBuilder, DriverParams, FixpositionDriver, imu_pitch_roll};
use fixposition_protocol::{GnssAntenna, GnssOutput, OdometryMsgs, OutputFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod output;

use output::emit;

/// 重连等待期间检查退出标志的粒度
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Fixposition CLI - 传感器输出流
#[derive(Parser, Debug)]
#[command(name = "fixposition-cli")]
#[command(about = "Stream Fixposition GNSS/INS output as JSON lines", long_about = None)]
#[command(version)]
struct Cli {
    /// 参数文件（TOML），其余选项覆盖其中的值
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TCP 地址，如 `10.0.2.1:21000`
    #[arg(long, conflicts_with = "serial")]
    tcp: Option<String>,

    /// 串口设备路径
    #[arg(long)]
    serial: Option<String>,

    /// 串口波特率
    #[arg(long)]
    baud: Option<u32>,

    /// 启用的输出格式，逗号分隔（ODOMETRY,LLH,RAWIMU,CORRIMU,TF）
    #[arg(long, value_delimiter = ',')]
    formats: Vec<String>,

    /// 主循环频率（Hz）
    #[arg(long)]
    rate: Option<f64>,

    /// 重连间隔（秒）
    #[arg(long)]
    reconnect_delay: Option<f64>,

    /// 每个周期回写的轮速（mm/s）：1 个车速或 4 个轮速
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    wheel_speeds: Vec<i32>,

    /// 统计日志间隔（秒），0 关闭
    #[arg(long, default_value_t = 10)]
    stats_interval: u64,
}

impl Cli {
    /// 加载参数文件并应用命令行覆盖
    fn params(&self) -> Result<DriverParams> {
        let mut params = match &self.config {
            Some(path) => DriverParams::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => DriverParams::default(),
        };

        let out = &mut params.fp_output;
        if let Some(addr) = &self.tcp {
            let Some((ip, port)) = addr.rsplit_once(':') else {
                bail!("--tcp expects <ip>:<port>, got {addr:?}");
            };
            out.input_type = InputType::Tcp;
            out.ip = ip.to_string();
            out.port = port.to_string();
        }
        if let Some(path) = &self.serial {
            out.input_type = InputType::Serial;
            out.port = path.clone();
        }
        if let Some(baud) = self.baud {
            out.baudrate = baud;
        }
        if !self.formats.is_empty() {
            out.formats = self.formats.clone();
        }
        if let Some(rate) = self.rate {
            out.rate = rate;
        }
        if let Some(delay) = self.reconnect_delay {
            out.reconnect_delay = delay;
        }

        params.validate()?;
        Ok(params)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fixposition=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let params = cli.params()?;
    if !cli.wheel_speeds.is_empty() {
        encode_wheel_speeds(&cli.wheel_speeds)?;
    }

    let mut driver = DriverBuilder::from_params(&params)?.build()?;
    register_observers(&mut driver)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    run(&mut driver, &params, &cli, &running)?;

    driver.disconnect();
    info!("Shut down");
    Ok(())
}

/// 每个启用的格式挂一个打印观察者；BESTGNSSPOS 始终挂上
fn register_observers(driver: &mut FixpositionDriver) -> Result<()> {
    for format in driver.enabled_formats() {
        match format {
            OutputFormat::Odometry => driver.on_odometry(|msgs| {
                emit("odometry", &msgs.odometry);
                emit("navsatstatus", &msgs.vrtk);
                emit("poiimu", &msgs.imu);
                // 融合未初始化时 ENU0 原点与姿态都无意义
                if fusion_initialized(msgs) {
                    emit("odometry_enu", &msgs.odometry_enu0);
                    emit("ypr", &msgs.eul);
                    for tf in [&msgs.tf_ecef_poi, &msgs.tf_ecef_enu, &msgs.tf_ecef_enu0] {
                        emit("tf", tf);
                    }
                }
            })?,
            OutputFormat::Llh => driver.on_llh(|fix| emit("llh", fix))?,
            OutputFormat::RawImu => driver.on_rawimu(|imu| emit("rawimu", imu))?,
            OutputFormat::CorrImu => driver.on_corrimu(|imu| emit("corrimu", imu))?,
            OutputFormat::Tf => driver.on_tf(|tf| {
                emit("tf", tf);
                if let Some(pitch_roll) = imu_pitch_roll(tf) {
                    emit("imu_ypr", &pitch_roll);
                }
            })?,
        }
    }

    driver.on_bestgnsspos(|fix| {
        let topic = match fix.antenna.unwrap_or(GnssAntenna::Generic).output() {
            GnssOutput::Gnss1 => "gnss1",
            GnssOutput::Gnss2 => "gnss2",
        };
        emit(topic, fix);
    });
    Ok(())
}

fn fusion_initialized(msgs: &OdometryMsgs) -> bool {
    msgs.vrtk.fusion_status > 0
}

/// 主循环：按频率调用 `run_once`，传输失败后等待重连间隔再建连
fn run(
    driver: &mut FixpositionDriver,
    params: &DriverParams,
    cli: &Cli,
    running: &AtomicBool,
) -> Result<()> {
    let period = params.loop_period();
    let reconnect_delay = params.reconnect_delay();
    let stats_interval = Duration::from_secs(cli.stats_interval);
    let mut last_stats = Instant::now();

    info!(
        "Running at {:.1} Hz, reconnect delay {:?}",
        params.fp_output.rate, reconnect_delay
    );

    while running.load(Ordering::SeqCst) {
        if !driver.is_connected() && driver.connect().is_err() {
            warn!("Retrying connection in {:?}", reconnect_delay);
            sleep_while_running(running, reconnect_delay);
            continue;
        }

        let cycle_start = Instant::now();
        if !cli.wheel_speeds.is_empty() {
            driver.set_wheel_speeds(&cli.wheel_speeds)?;
        }

        if !driver.run_once() {
            warn!(
                "Connection lost ({}), reconnecting in {:?}",
                driver.last_error().unwrap_or("unknown error"),
                reconnect_delay
            );
            sleep_while_running(running, reconnect_delay);
            continue;
        }

        if !stats_interval.is_zero() && last_stats.elapsed() >= stats_interval {
            let stats = driver.stats();
            info!(
                "Frames: {} ascii, {} binary, {} corrupt, {} bytes discarded, {} dropped",
                stats.framer.ascii_frames,
                stats.framer.nov_frames,
                stats.framer.corrupt_frames,
                stats.framer.discarded_bytes,
                stats.dropped_records
            );
            for (msg_type, converter) in &stats.converters {
                debug!(
                    "{}: {} ok, {} failed",
                    msg_type, converter.successes, converter.failures
                );
            }
            last_stats = Instant::now();
        }

        sleep_while_running(running, period.saturating_sub(cycle_start.elapsed()));
    }
    Ok(())
}

/// 可被 Ctrl+C 打断的等待
fn sleep_while_running(running: &AtomicBool, duration: Duration) {
    // 超出 `Instant` 表示范围的等待视为无限期，直到退出
    let deadline = Instant::now().checked_add(duration);
    while running.load(Ordering::SeqCst) {
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => SHUTDOWN_POLL,
        };
        if remaining.is_zero() {
            break;
        }
        spin_sleep::sleep(remaining.min(SHUTDOWN_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixposition_transport::TransportConfig;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fixposition-cli").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let params = parse(&[]).params().unwrap();
        assert_eq!(params, DriverParams::default());
        assert_eq!(
            params.transport_config().unwrap(),
            TransportConfig::Tcp {
                ip: "10.0.2.1".to_string(),
                port: 21000
            }
        );
    }

    #[test]
    fn test_tcp_override() {
        let params = parse(&["--tcp", "192.168.1.5:2000", "--formats", "TF,LLH"])
            .params()
            .unwrap();
        assert_eq!(
            params.transport_config().unwrap(),
            TransportConfig::Tcp {
                ip: "192.168.1.5".to_string(),
                port: 2000
            }
        );
        assert_eq!(
            params.formats().unwrap().into_iter().collect::<Vec<_>>(),
            vec![OutputFormat::Llh, OutputFormat::Tf]
        );
    }

    #[test]
    fn test_serial_override() {
        let params = parse(&["--serial", "/dev/ttyUSB0", "--baud", "460800"])
            .params()
            .unwrap();
        assert_eq!(
            params.transport_config().unwrap(),
            TransportConfig::Serial {
                path: "/dev/ttyUSB0".to_string(),
                baud_rate: 460_800
            }
        );
    }

    #[test]
    fn test_invalid_overrides() {
        assert!(parse(&["--tcp", "no-port"]).params().is_err());
        assert!(parse(&["--formats", "XYZ"]).params().is_err());
        assert!(parse(&["--rate", "0"]).params().is_err());
        assert!(
            Cli::try_parse_from(["fixposition-cli", "--tcp", "a:1", "--serial", "/dev/x"]).is_err()
        );
    }

    #[test]
    fn test_fusion_gate() {
        let mut msgs = OdometryMsgs::default();
        assert!(!fusion_initialized(&msgs));

        msgs.vrtk.fusion_status = 1;
        assert!(fusion_initialized(&msgs));
    }

    #[test]
    fn test_sleep_returns_when_stopped() {
        let running = AtomicBool::new(false);
        let start = Instant::now();
        sleep_while_running(&running, Duration::MAX);
        assert!(start.elapsed() < SHUTDOWN_POLL);
    }

    #[test]
    fn test_sleep_short_duration() {
        let running = AtomicBool::new(true);
        let start = Instant::now();
        sleep_while_running(&running, Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_negative_wheel_speeds() {
        let cli = parse(&["--wheel-speeds", "-100,100,-50,50"]);
        assert_eq!(cli.wheel_speeds, vec![-100, 100, -50, 50]);
    }
}
