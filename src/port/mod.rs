//! `PortAdapter`: glues [`crate::session::Session`] to a real transport, a timer source, and an
//! alarm sink.
//!
//! This is the only module in the crate that touches I/O. Everything it carries out was decided
//! by `Session`, which stays pure and unit-testable on its own.

mod builder;

pub use builder::{Init, PortAdapterBuilder, Serial};

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{
    alarm::{generic_alarm_message, AlarmContents},
    config::{Profile, DIAGNOSTICS_INTERVAL, DOWNLINK_SILENCE_THRESHOLD, UPLINK_SILENCE_THRESHOLD},
    profile::{Classifier, HhlClassifier, ProdexClassifier},
    session::{PortEffect, Session},
    snap::SnapMessage,
    AlpResult,
};

/// The byte-stream transport a [`PortAdapter`] writes frames and control bytes to. Implemented
/// for [`serial2::SerialPort`]; test doubles can implement it directly.
pub trait LineSink {
    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()>;
    fn flush(&mut self) -> std::io::Result<()>;
}

impl LineSink for serial2::SerialPort {
    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        std::io::Write::write_all(self, bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::Write::flush(self)
    }
}

/// Registers and deregisters the recurring diagnostics timer. The embedding reactor owns the
/// actual clock; this trait only hands back an opaque handle to cancel with later.
pub trait TimerSource {
    type Handle;

    fn add_interval(&mut self, interval: std::time::Duration) -> Self::Handle;
    fn remove(&mut self, handle: Self::Handle);
}

/// Where classified uplink traffic and line-fault transitions get forwarded.
pub trait AlarmSink {
    fn uplink(&mut self, content: &str, alarm: &crate::alarm::UplinkAlarm);
    fn fault_detected(&mut self, tag: &str, reason: &str);
    fn fault_over(&mut self, reason: &str);
}

enum ClassifierImpl {
    Hhl(HhlClassifier),
    Prodex(ProdexClassifier),
}

impl ClassifierImpl {
    fn new(profile: Profile) -> Self {
        match profile {
            Profile::Hhl => Self::Hhl(HhlClassifier),
            Profile::Prodex => Self::Prodex(ProdexClassifier),
        }
    }

    fn classify(&self, msg: SnapMessage) -> Option<(String, crate::alarm::UplinkAlarm)> {
        match self {
            Self::Hhl(c) => c.classify(msg),
            Self::Prodex(c) => c.classify(msg),
        }
    }
}

/// Owns the session, the serial transport, the diagnostics timer registration, the alarm sink,
/// and the profile classifier for one serial port.
pub struct PortAdapter<W, T: TimerSource, A> {
    name: String,
    line: W,
    session: Session,
    timer: T,
    timer_handle: Option<T::Handle>,
    alarm_sink: A,
    classifier: ClassifierImpl,
    open: bool,
}

impl<W, T, A> PortAdapter<W, T, A>
where
    W: LineSink,
    T: TimerSource,
    A: AlarmSink,
{
    /// Builds a `PortAdapter` around an already-constructed `LineSink`, registering the
    /// diagnostics timer immediately (mirrors the reference port opening its diagnostics timer as
    /// soon as the underlying connection is live).
    pub fn new(name: impl Into<String>, line: W, profile: Profile, mut timer: T, alarm_sink: A, now: Instant) -> Self {
        let timer_handle = Some(timer.add_interval(DIAGNOSTICS_INTERVAL));
        Self {
            name: name.into(),
            line,
            session: Session::new(now),
            timer,
            timer_handle,
            alarm_sink,
            classifier: ClassifierImpl::new(profile),
            open: true,
        }
    }

    /// Ingress entry point: feeds a freshly-received chunk to the session and carries out the
    /// resulting effects.
    pub fn on_bytes(&mut self, now: Instant, chunk: &[u8]) -> AlpResult<()> {
        if !self.open {
            debug!(port = %self.name, "on_bytes(): port not open, exiting");
            return Ok(());
        }
        debug!(port = %self.name, len = chunk.len(), "received data");
        let effects = self.session.on_receive(now, chunk);
        self.apply_effects(effects)
    }

    /// Called by the embedding reactor each time the registered diagnostics timer fires. Returns
    /// `false` once the port has closed, at which point the caller should deregister the timer.
    pub fn diagnostics_tick(&mut self, now: Instant) -> bool {
        if !self.open {
            debug!(port = %self.name, "diagnostics_tick(): port not open, exiting");
            if let Some(handle) = self.timer_handle.take() {
                self.timer.remove(handle);
            }
            return false;
        }

        let effects = self.session.diagnostics_tick(
            now,
            DOWNLINK_SILENCE_THRESHOLD,
            UPLINK_SILENCE_THRESHOLD,
        );
        let _ = self.apply_effects(effects);
        true
    }

    /// Frames and transmits a SNAP message, starting a master session if idle.
    pub fn transmit(&mut self, now: Instant, msg: &SnapMessage) -> AlpResult<()> {
        if !self.open {
            debug!(port = %self.name, "transmit(): port not open, exiting");
            return Ok(());
        }
        debug!(port = %self.name, "transmitting SNAP message: {msg:?}");
        let effects = self.session.transmit(now, msg);
        self.apply_effects(effects)
    }

    /// Sends a generic alarm on/off event, addressed at `(system_id, terminal_id, loop_id)`
    /// (default `(1, 1, 0)`).
    pub fn send_generic_alarm(
        &mut self,
        now: Instant,
        on_off: bool,
        alrm_src: Option<(u16, u16, u16)>,
        contents: Option<AlarmContents>,
    ) -> AlpResult<()> {
        if !self.open {
            debug!(port = %self.name, "send_generic_alarm(): port not open");
            return Ok(());
        }
        if self.session.has_line_fault() {
            warn!(port = %self.name, "line fault in the port, may not be able to deliver the alarm message");
        }
        let msg = generic_alarm_message(on_off, alrm_src, contents);
        self.transmit(now, &msg)
    }

    /// Marks the port closed. The next `diagnostics_tick` deregisters the timer; any outstanding
    /// downlink slot is discarded silently.
    pub fn close(&mut self) {
        self.open = false;
    }

    fn apply_effects(&mut self, effects: Vec<PortEffect>) -> AlpResult<()> {
        for effect in effects {
            match effect {
                PortEffect::WriteFrame(bytes) => {
                    self.line.write_all(&bytes)?;
                }
                PortEffect::WriteControl(c) => {
                    self.line.write_all(&[c])?;
                    self.line.flush()?;
                }
                PortEffect::Deliver(msg) => {
                    if let Some((content, alarm)) = self.classifier.classify(msg) {
                        self.alarm_sink.uplink(&content, &alarm);
                    }
                }
                PortEffect::FaultDetected { tag, reason } => {
                    info!(port = %self.name, tag, %reason, "LINE ALARM");
                    self.alarm_sink.fault_detected(tag, &reason);
                }
                PortEffect::FaultOver { reason } => {
                    info!(port = %self.name, %reason, "linefault over");
                    self.alarm_sink.fault_over(&reason);
                }
            }
        }
        Ok(())
    }
}
