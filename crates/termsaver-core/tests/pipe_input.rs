//! Keystroke detection over socket pairs standing in for a terminal.

#![cfg(unix)]

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use termsaver_core::{InputSource, InputWatcher, InterruptFlag};

/// Create a (watched_end, writer_end) pair.
fn pipe_pair() -> (UnixStream, UnixStream) {
    UnixStream::pair().expect("socket pair")
}

#[test]
fn idle_pipe_reports_no_input() {
    let (reader, _writer) = pipe_pair();
    let mut watcher = InputWatcher::from_fd(reader);
    assert!(watcher.is_attached());
    assert!(!watcher.has_input(Duration::ZERO));
}

#[test]
fn pending_byte_is_detected() {
    let (reader, mut writer) = pipe_pair();
    let mut watcher = InputWatcher::from_fd(reader);
    writer.write_all(b"q").unwrap();
    assert!(watcher.has_input(Duration::from_millis(100)));
}

#[test]
fn detection_does_not_consume_the_byte() {
    let (reader, mut writer) = pipe_pair();
    let mut probe = reader.try_clone().unwrap();
    let mut watcher = InputWatcher::from_fd(reader);
    writer.write_all(b"x").unwrap();

    assert!(watcher.has_input(Duration::from_millis(100)));
    assert!(watcher.has_input(Duration::ZERO), "byte must still be pending");

    let mut buf = [0u8; 1];
    probe.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"x");
    assert!(!watcher.has_input(Duration::ZERO));
}

#[test]
fn zero_timeout_returns_immediately() {
    let (reader, _writer) = pipe_pair();
    let mut watcher = InputWatcher::from_fd(reader);
    let start = Instant::now();
    assert!(!watcher.has_input(Duration::ZERO));
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn timeout_waits_for_late_byte() {
    let (reader, mut writer) = pipe_pair();
    let mut watcher = InputWatcher::from_fd(reader);
    let sender = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        writer.write_all(b"k").unwrap();
        writer
    });
    assert!(watcher.has_input(Duration::from_millis(2000)));
    drop(sender.join());
}

#[test]
fn interrupt_wins_over_idle_pipe() {
    let (reader, _writer) = pipe_pair();
    let flag = InterruptFlag::new();
    let mut watcher = InputWatcher::from_fd(reader).with_interrupt(flag.clone());
    assert!(!watcher.has_input(Duration::ZERO));
    flag.raise();
    assert!(watcher.has_input(Duration::ZERO));
}
