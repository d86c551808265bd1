//! 端到端：字节流 → 帧提取 → 路由 → 转换 → 观察者

use crossbeam_channel::{Receiver, bounded};
use fixposition_driver::{DriverBuilder, FixpositionDriver};
use fixposition_protocol::ascii::encode_sentence;
use fixposition_protocol::nov::{BESTGNSSPOS_ID, BESTGNSSPOS_LEN};
use fixposition_protocol::{
    BestGnssPos, GnssAntenna, NavSatFixData, NovHeader, NovRecord, OutputFormat, TfData,
};
use fixposition_transport::MockConnector;
use nalgebra::{Quaternion, Vector3};

const TF_LINE: &[u8] = b"$FP,TF,1,POI,ENU0,1.0,2.0,3.0,1.0,0.0,0.0,0.0*0E\r\n";
/// 少一个字段，校验和相应重算
const TF_LINE_SHORT: &[u8] = b"$FP,TF,1,POI,ENU0,1.0,2.0,3.0,1.0,0.0,0.0*0C\r\n";

fn connected_driver(formats: &[OutputFormat]) -> (FixpositionDriver, MockConnector) {
    let mock = MockConnector::new();
    let mut driver = DriverBuilder::new()
        .connector(Box::new(mock.clone()))
        .formats(formats.iter().copied())
        .build()
        .unwrap();
    driver.connect().unwrap();
    (driver, mock)
}

fn tf_channel(driver: &mut FixpositionDriver) -> Receiver<TfData> {
    let (tx, rx) = bounded(16);
    driver
        .on_tf(move |tf| {
            let _ = tx.try_send(tf.clone());
        })
        .unwrap();
    rx
}

#[test]
fn tf_sentence_end_to_end() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Tf]);
    let rx = tf_channel(&mut driver);

    mock.inject_read(TF_LINE);
    assert!(driver.run_once());

    let tf = rx.try_recv().unwrap();
    assert_eq!(tf.frame_id, "FP_POI");
    assert_eq!(tf.child_frame_id, "FP_ENU0");
    assert_eq!(tf.translation, Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(tf.rotation, Quaternion::identity());
    assert!(rx.try_recv().is_err());
}

#[test]
fn tf_sentence_missing_field_resets_and_notifies_nobody() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Tf]);
    let rx = tf_channel(&mut driver);

    mock.inject_read(TF_LINE);
    assert!(driver.run_once());
    assert!(rx.try_recv().is_ok());

    mock.inject_read(TF_LINE_SHORT);
    assert!(driver.run_once());

    assert!(rx.try_recv().is_err());
    let held = driver.router().tf().unwrap().msg();
    assert_eq!(held, &TfData::default());
    assert!(held.frame_id.is_empty());
    assert_eq!(held.translation, Vector3::zeros());

    let stats = driver.stats();
    assert_eq!(stats.converters["TF"].successes, 1);
    assert_eq!(stats.converters["TF"].failures, 1);
    assert_eq!(stats.framer.corrupt_frames, 0);
}

#[test]
fn bad_checksum_reaches_no_converter() {
    let (mut driver, mock) = connected_driver(&OutputFormat::ALL);
    let rx = tf_channel(&mut driver);

    let mut bad = TF_LINE.to_vec();
    let star = bad.iter().position(|&b| b == b'*').unwrap();
    bad[star + 2] = b'F';
    mock.inject_read(&bad);
    assert!(driver.run_once());

    assert!(rx.try_recv().is_err());
    let stats = driver.stats();
    assert_eq!(stats.framer.corrupt_frames, 1);
    assert!(
        stats
            .converters
            .values()
            .all(|s| s.successes == 0 && s.failures == 0)
    );
}

#[test]
fn unknown_type_is_silently_dropped() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Tf]);
    let rx = tf_channel(&mut driver);

    mock.inject_read(encode_sentence("FP,XYZ,1,a,b,c").as_bytes());
    assert!(driver.run_once());

    assert!(rx.try_recv().is_err());
    let stats = driver.stats();
    assert_eq!(stats.dropped_records, 1);
    assert_eq!(stats.converters["TF"].failures, 0);
    assert!(driver.is_connected());
}

#[test]
fn observers_called_once_each_in_subscription_order() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Tf]);
    let (tx, rx) = bounded::<usize>(16);
    for id in 0..4 {
        let tx = tx.clone();
        driver
            .on_tf(move |_| {
                let _ = tx.try_send(id);
            })
            .unwrap();
    }

    mock.inject_read(TF_LINE);
    assert!(driver.run_once());

    let order: Vec<_> = rx.try_iter().collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
}

#[test]
fn reconnect_resumes_without_reregistration() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Tf]);
    let rx = tf_channel(&mut driver);

    mock.fail_next_read();
    assert!(!driver.run_once());
    assert!(!driver.is_connected());
    assert!(!driver.run_once());

    // 第一次重连被拒绝
    mock.refuse_connects(1);
    assert!(driver.connect().is_err());
    assert!(driver.last_error().is_some());
    assert!(!driver.run_once());

    driver.connect().unwrap();
    mock.inject_read(TF_LINE);
    assert!(driver.run_once());
    assert_eq!(rx.try_recv().unwrap().frame_id, "FP_POI");
    assert_eq!(mock.connect_attempts(), 3);
}

#[test]
fn sentence_split_across_reads() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Tf]);
    let rx = tf_channel(&mut driver);

    for chunk in TF_LINE.chunks(7) {
        mock.inject_read(chunk);
        assert!(driver.run_once());
    }
    assert_eq!(rx.try_iter().count(), 1);
}

#[test]
fn mixed_ascii_and_binary_stream() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Tf, OutputFormat::RawImu]);
    let tf_rx = tf_channel(&mut driver);

    let (imu_tx, imu_rx) = bounded(4);
    driver
        .on_rawimu(move |imu| {
            let _ = imu_tx.try_send(imu.clone());
        })
        .unwrap();

    let (gnss_tx, gnss_rx) = bounded::<NavSatFixData>(4);
    driver.on_bestgnsspos(move |fix| {
        let _ = gnss_tx.try_send(fix.clone());
    });

    let mut payload = vec![0u8; BESTGNSSPOS_LEN];
    payload[4] = 50; // NARROW_INT
    let pos = BestGnssPos::parse(&payload).unwrap();
    let frame = NovRecord::encode(
        NovHeader {
            message_id: BESTGNSSPOS_ID,
            port_address: GnssAntenna::COM2_PORT_ADDRESS,
            week: 2231,
            milliseconds: 1_000,
            ..Default::default()
        },
        &pos.to_bytes(),
    );

    let mut stream = Vec::new();
    stream.extend_from_slice(TF_LINE);
    stream.extend_from_slice(&frame);
    stream.extend_from_slice(
        encode_sentence("FP,RAWIMU,1,2231,1.000000,0.1,0.2,9.81,0.0,0.0,0.1").as_bytes(),
    );
    // 其它 NOV_B 消息 ID 被丢弃
    stream.extend_from_slice(&NovRecord::encode(
        NovHeader {
            message_id: 42,
            ..Default::default()
        },
        &[0u8; 16],
    ));
    mock.inject_read(&stream);
    assert!(driver.run_once());

    assert_eq!(tf_rx.try_iter().count(), 1);
    let imu = imu_rx.try_recv().unwrap();
    assert_eq!(imu.linear_acc.z, 9.81);

    let fix = gnss_rx.try_recv().unwrap();
    assert_eq!(fix.frame_id, "GNSS2");
    assert_eq!(fix.antenna, Some(GnssAntenna::Gnss2));

    let stats = driver.stats();
    assert_eq!(stats.framer.ascii_frames, 2);
    assert_eq!(stats.framer.nov_frames, 2);
    assert_eq!(stats.dropped_records, 1);
}

fn odometry_sentence(height_offset: f64, fusion_status: i32) -> String {
    // 苏黎世附近的 ECEF 坐标，沿当地天顶方向平移 `height_offset`
    let llh = Vector3::new(47.4_f64.to_radians(), 8.5_f64.to_radians(), 450.0 + height_offset);
    let ecef = fixposition_protocol::geo::llh_to_ecef(&llh);

    let mut fields = vec![
        "FP".to_string(),
        "ODOMETRY".to_string(),
        "1".to_string(),
        "2231".to_string(),
        "227610.750000".to_string(),
    ];
    fields.extend([ecef.x, ecef.y, ecef.z].map(|v| format!("{v:.4}")));
    fields.extend(["1.0", "0.0", "0.0", "0.0"].map(String::from));
    fields.extend(std::iter::repeat_n("0.0".to_string(), 9));
    fields.push(fusion_status.to_string());
    fields.extend(["1", "8", "8", "0"].map(String::from));
    fields.extend(std::iter::repeat_n("0.01".to_string(), 18));
    fields.push("fp_release_vr2_2.54.0_160".to_string());
    encode_sentence(&fields.join(","))
}

#[test]
fn odometry_enu0_origin_survives_reconnect() {
    let (mut driver, mock) = connected_driver(&[OutputFormat::Odometry]);
    let (tx, rx) = bounded(8);
    driver
        .on_odometry(move |msgs| {
            let _ = tx.try_send(msgs.clone());
        })
        .unwrap();

    mock.inject_read(odometry_sentence(0.0, 1).as_bytes());
    assert!(driver.run_once());
    let first = rx.try_recv().unwrap();
    assert_eq!(first.odometry.frame_id, "FP_ECEF");
    assert_eq!(first.odometry_enu0.frame_id, "FP_ENU0");
    assert!(first.odometry_enu0.pose.position.norm() < 1e-3);

    mock.fail_next_read();
    assert!(!driver.run_once());
    driver.connect().unwrap();

    mock.inject_read(odometry_sentence(5.0, 1).as_bytes());
    assert!(driver.run_once());
    let second = rx.try_recv().unwrap();
    let up = second.odometry_enu0.pose.position;
    assert!((up.z - 5.0).abs() < 1e-3, "ENU0 position {up:?}");
    assert!(up.x.abs() < 1e-3 && up.y.abs() < 1e-3);
}
