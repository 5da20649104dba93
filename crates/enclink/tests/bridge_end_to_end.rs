#![cfg(unix)]

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use enclink::bridge::{Bridge, BridgeConfig, BridgeError, ReadMode, StatusAttribute};
use enclink::frame::{encode_frame, STATE_UPDATE};
use enclink::transport::SerialStream;

#[test]
fn enclave_frames_reach_consumer_and_writes_reach_enclave() {
    let (host, mut enclave) = UnixStream::pair().expect("socket pair should open");
    let mut serial = SerialStream::from_unix(host);
    let writer = serial.try_clone().expect("stream should clone");

    let (mut ingestor, endpoint) = Bridge::new(writer, BridgeConfig::default()).split();
    let status = endpoint.status();
    let pump = thread::spawn(move || {
        let running = AtomicBool::new(true);
        ingestor.pump(&mut serial, &running)
    });

    let mut wire = BytesMut::from(&[0x00, 0xFF][..]);
    encode_frame(STATE_UPDATE, &[3, 9], &mut wire).expect("state update should encode");
    encode_frame(0x0120, b"attestation", &mut wire).expect("opaque frame should encode");
    for chunk in wire.chunks(3) {
        enclave.write_all(chunk).expect("enclave write should succeed");
    }

    let mut expected = BytesMut::new();
    encode_frame(0x0120, b"attestation", &mut expected).expect("opaque frame should encode");

    let mut received = Vec::new();
    let mut buf = [0u8; 16];
    while received.len() < expected.len() {
        let n = endpoint.read(&mut buf).expect("read should succeed");
        received.extend_from_slice(&buf[..n]);
    }
    assert_eq!(received, expected.to_vec());
    assert_eq!(status.render(StatusAttribute::RootState), "3\n");
    assert_eq!(status.render(StatusAttribute::Version), "9\n");

    assert_eq!(endpoint.write(b"unlock").expect("write should succeed"), 6);
    let mut echoed = [0u8; 6];
    enclave
        .read_exact(&mut echoed)
        .expect("enclave should receive the write");
    assert_eq!(&echoed, b"unlock");

    enclave
        .shutdown(Shutdown::Write)
        .expect("shutdown should succeed");
    let total = pump
        .join()
        .expect("pump should not panic")
        .expect("pump should end cleanly");
    assert_eq!(total, wire.len() as u64);

    let mut buf = [0u8; 4];
    assert!(matches!(
        endpoint.read_with(&mut buf, ReadMode::NonBlocking),
        Err(BridgeError::WouldBlock)
    ));
}

#[test]
fn queue_overflow_keeps_newest_frames() {
    let (host, mut enclave) = UnixStream::pair().expect("socket pair should open");
    let mut serial = SerialStream::from_unix(host);
    let writer = serial.try_clone().expect("stream should clone");

    let config = BridgeConfig {
        queue_capacity: 22,
        read_timeout: Some(Duration::from_secs(5)),
        ..BridgeConfig::default()
    };
    let (mut ingestor, endpoint) = Bridge::new(writer, config).split();

    let mut wire = BytesMut::new();
    for i in 0..4u8 {
        encode_frame(0x0200 + u16::from(i), &[i; 3], &mut wire).expect("frame should encode");
    }
    enclave.write_all(&wire).expect("enclave write should succeed");
    enclave
        .shutdown(Shutdown::Write)
        .expect("shutdown should succeed");

    let running = AtomicBool::new(true);
    ingestor
        .pump(&mut serial, &running)
        .expect("pump should end cleanly");

    let mut buf = [0u8; 64];
    let n = endpoint.read(&mut buf).expect("read should succeed");
    assert_eq!(&buf[..n], &wire[22..]);
}
