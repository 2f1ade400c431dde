//! Illustrative wiring of a [`PortAdapter`] over an in-memory line, with `tracing_subscriber::fmt`
//! installed so the crate's `tracing` output is visible. Not a packaged service — see SPEC_FULL.md
//! §1 ("no daemon, no CLI service wrapper is shipped").

use std::time::{Duration, Instant};

use alp_core::alarm::UplinkAlarm;
use alp_core::config::Profile;
use alp_core::port::{AlarmSink, LineSink, PortAdapter, TimerSource};
use alp_core::snap::SnapMessage;

struct StdoutLine;

impl LineSink for StdoutLine {
    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        println!("-> wire: {bytes:02x?}");
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// No reactor is driving this demo, so the diagnostics timer is never actually rescheduled; a real
/// embedder wires `add_interval`/`remove` to its own event loop.
struct ManualTimer;

impl TimerSource for ManualTimer {
    type Handle = ();

    fn add_interval(&mut self, interval: Duration) -> Self::Handle {
        println!("(would register a {interval:?} diagnostics timer here)");
    }

    fn remove(&mut self, _handle: Self::Handle) {}
}

struct LoggingAlarmSink;

impl AlarmSink for LoggingAlarmSink {
    fn uplink(&mut self, content: &str, alarm: &UplinkAlarm) {
        tracing::info!(content, ?alarm, "uplink alarm");
    }

    fn fault_detected(&mut self, tag: &str, reason: &str) {
        tracing::warn!(tag, reason, "line fault detected");
    }

    fn fault_over(&mut self, reason: &str) {
        tracing::info!(reason, "line fault cleared");
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut port = PortAdapter::new(
        "demo0",
        StdoutLine,
        Profile::Hhl,
        ManualTimer,
        LoggingAlarmSink,
        Instant::now(),
    );

    let alarm = SnapMessage {
        more: false,
        message_counter: 1,
        service_class: 1,
        message_type: 1,
        system_id: 1,
        terminal_id: 1,
        loop_id: 0,
        event_time: 0,
        data: b"demo".to_vec(),
        empty: false,
    };
    port.transmit(Instant::now(), &alarm).expect("write to StdoutLine never fails");

    let uplink_frame = alp_core::codec::write(&alarm.encode());
    port.on_bytes(Instant::now(), &uplink_frame).expect("write to StdoutLine never fails");
}
