//! The half-duplex link-layer session state machine.
//!
//! `Session` holds the single downlink slot, retransmit accounting, and fault-latch state, and
//! drives all of that purely: every public method returns the [`PortEffect`]s the caller (normally
//! [`crate::port::PortAdapter`]) must carry out. This keeps retransmit-bound and line-fault
//! properties testable without a mock transport.

use std::time::Instant;

use crate::{
    codec,
    config::{RESEND_LIMIT, RESEND_LIMIT_NAK},
    rx_buffer::{RxBuffer, RX_BUFFER_MAX_LEN},
    snap::SnapMessage,
};

pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;
pub const ENQ: u8 = 0x05;
pub const EOT: u8 = 0x04;

const LINEFAULT: &str = "linefault";

/// Which side the downlink slot thinks it's talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SessionState {
    Idle,
    ActiveMaster,
    ActiveClient,
    Finished,
}

impl SessionState {
    fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Finished)
    }
}

/// The reason a re-transmit was requested; governs which resend limit applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Nacked,
    NoReply,
}

impl Cause {
    fn limit(self) -> u32 {
        match self {
            Self::Nacked => RESEND_LIMIT_NAK,
            Self::NoReply => RESEND_LIMIT,
        }
    }
}

/// A side effect `Session` wants its caller to carry out. `Session` never touches I/O itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PortEffect {
    WriteFrame(Vec<u8>),
    WriteControl(u8),
    Deliver(SnapMessage),
    FaultDetected { tag: &'static str, reason: String },
    FaultOver { reason: String },
}

#[derive(Debug, Clone)]
enum DownlinkSlot {
    Empty,
    Frame(Vec<u8>),
    Control(u8),
}

impl DownlinkSlot {
    fn effect(&self) -> Option<PortEffect> {
        match self {
            Self::Empty => None,
            Self::Frame(bytes) => Some(PortEffect::WriteFrame(bytes.clone())),
            Self::Control(c) => Some(PortEffect::WriteControl(*c)),
        }
    }
}

/// The half-duplex session: tracks who holds the line, the outstanding downlink slot, and
/// line-fault latching, independent of any transport.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    downlink_slot: DownlinkSlot,
    retransmit_count: u32,
    message_counter: u8,
    latest_downlink_event_time: Instant,
    latest_uplink_event_time: Instant,
    active_faults: Vec<&'static str>,
    fault_over_sent_once: bool,
    rx: RxBuffer,
}

impl Session {
    pub fn new(now: Instant) -> Self {
        Self {
            state: SessionState::Idle,
            downlink_slot: DownlinkSlot::Empty,
            retransmit_count: 0,
            message_counter: 0,
            latest_downlink_event_time: now,
            latest_uplink_event_time: now,
            active_faults: Vec::new(),
            fault_over_sent_once: false,
            rx: RxBuffer::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn has_line_fault(&self) -> bool {
        self.active_faults.contains(&LINEFAULT)
    }

    fn begin(&mut self, state: SessionState) {
        self.state = state;
        self.downlink_slot = DownlinkSlot::Empty;
    }

    fn finish(&mut self) {
        self.retransmit_count = 0;
        self.downlink_slot = DownlinkSlot::Empty;
        self.state = SessionState::Finished;
    }

    /// Frames `snap_msg` and hands it to the downlink slot, starting a master session if idle.
    pub fn transmit(&mut self, now: Instant, snap_msg: &SnapMessage) -> Vec<PortEffect> {
        if !self.is_active() {
            self.begin(SessionState::ActiveMaster);
        }
        let frame = codec::write(&snap_msg.encode());
        self.downlink_slot = DownlinkSlot::Frame(frame.clone());
        self.latest_downlink_event_time = now;
        self.message_counter = self.message_counter.wrapping_add(1);
        vec![PortEffect::WriteFrame(frame)]
    }

    /// Puts a single control byte in the downlink slot, starting a master session if idle.
    pub fn transmit_control_char(&mut self, now: Instant, c: u8) -> Vec<PortEffect> {
        if !self.is_active() {
            self.begin(SessionState::ActiveMaster);
        }
        self.downlink_slot = DownlinkSlot::Control(c);
        self.latest_downlink_event_time = now;
        vec![PortEffect::WriteControl(c)]
    }

    /// Re-sends the current downlink slot, or latches a line fault once the cause's resend limit
    /// is reached. A no-op once the fault has already latched for this slot.
    pub fn re_transmit(&mut self, now: Instant, cause: Cause) -> Vec<PortEffect> {
        let limit = cause.limit();
        if self.retransmit_count < limit {
            self.retransmit_count += 1;
            self.latest_downlink_event_time = now;
            self.downlink_slot.effect().into_iter().collect()
        } else if self.retransmit_count == limit {
            self.retransmit_count += 1;
            self.finish();
            if !self.active_faults.contains(&LINEFAULT) {
                self.active_faults.push(LINEFAULT);
                vec![PortEffect::FaultDetected {
                    tag: LINEFAULT,
                    reason: "no reply within retransmit count limit".to_string(),
                }]
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        }
    }

    /// Called by the embedder on each diagnostics timer tick; `port_open` reports whether the
    /// owning transport is still open (this state machine cannot observe that on its own).
    pub fn diagnostics_tick(
        &mut self,
        now: Instant,
        downlink_silence: std::time::Duration,
        uplink_silence: std::time::Duration,
    ) -> Vec<PortEffect> {
        if self.is_active() {
            if now.duration_since(self.latest_downlink_event_time) >= downlink_silence {
                return self.re_transmit(now, Cause::NoReply);
            }
            Vec::new()
        } else {
            self.state = SessionState::Idle;
            if now.duration_since(self.latest_uplink_event_time) >= uplink_silence {
                self.transmit_control_char(now, ENQ)
            } else {
                Vec::new()
            }
        }
    }

    fn check_control_char(&mut self, now: Instant, byte: u8) -> Option<Vec<PortEffect>> {
        match byte {
            ACK => {
                self.finish();
                Some(Vec::new())
            }
            NAK => Some(self.re_transmit(now, Cause::Nacked)),
            EOT => {
                self.finish();
                Some(Vec::new())
            }
            ENQ => {
                let effects = self.transmit_control_char(now, EOT);
                self.finish();
                Some(effects)
            }
            _ => None,
        }
    }

    /// Feeds a freshly-received chunk through the receive buffer, returning every effect produced
    /// while draining it.
    pub fn on_receive(&mut self, now: Instant, chunk: &[u8]) -> Vec<PortEffect> {
        self.rx.append(chunk);
        let mut effects = Vec::new();
        let mut valid_msg_parsed = false;

        loop {
            if self.rx.is_empty() {
                break;
            }

            let first = self.rx.as_slice()[0];
            if let Some(cc_effects) = self.check_control_char(now, first) {
                self.rx.consume(1);
                effects.extend(cc_effects);
                valid_msg_parsed = true;
                continue;
            }

            let outcome = codec::parse(self.rx.as_slice());
            let consumed = outcome.consumed;
            if consumed > 0 {
                self.rx.consume(consumed);
            }

            if outcome.nack {
                effects.push(PortEffect::WriteControl(NAK));
            } else if let Some(payload) = outcome.frame {
                if !self.is_active() {
                    self.begin(SessionState::ActiveClient);
                }
                let msg = SnapMessage::decode(&payload);
                if !msg.empty {
                    effects.push(PortEffect::Deliver(msg));
                    valid_msg_parsed = true;
                }
                effects.push(PortEffect::WriteControl(ACK));
            } else if consumed == 0 {
                if self.rx.len() >= RX_BUFFER_MAX_LEN {
                    self.rx.clear();
                    effects.push(PortEffect::WriteControl(NAK));
                    self.finish();
                }
                break;
            }
        }

        if self.rx.is_empty() {
            self.finish();
        }

        if valid_msg_parsed {
            self.latest_uplink_event_time = now;
            if self.has_line_fault() || !self.fault_over_sent_once {
                self.active_faults.retain(|f| *f != LINEFAULT);
                self.fault_over_sent_once = true;
                effects.push(PortEffect::FaultOver {
                    reason: "linefault over".to_string(),
                });
            }
        }

        effects
    }
}
