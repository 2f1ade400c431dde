//! Tunable constants, serial line settings, and the SNAP profile tag.

use std::{fmt::Display, ops::RangeInclusive, str::FromStr, time::Duration};

use serial2::IntoSettings;

use crate::Error;

pub(crate) const BAUD_BOUNDS: RangeInclusive<u32> = 1200..=1_000_000;

/// How often `PortAdapter::diagnostics_tick` is expected to be called by the embedding reactor.
pub const DIAGNOSTICS_INTERVAL: Duration = Duration::from_secs(5);
/// Downlink silence threshold: retransmit if no downlink activity for this long while active.
pub const DOWNLINK_SILENCE_THRESHOLD: Duration = Duration::from_millis(4_500);
/// Uplink silence threshold: send an unsolicited ENQ poll if idle this long without uplink traffic.
pub const UPLINK_SILENCE_THRESHOLD: Duration = Duration::from_millis(19_500);
/// Retransmit limit after a timer-detected silence (`Cause::NoReply`).
pub const RESEND_LIMIT: u32 = 10;
/// Retransmit limit after an explicit NAK (`Cause::Nacked`).
pub const RESEND_LIMIT_NAK: u32 = 5;

/// Which SNAP message classifier a port uses to turn uplink `SnapMessage`s into alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Profile {
    Hhl,
    Prodex,
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hhl" => Ok(Self::Hhl),
            "prodex" => Ok(Self::Prodex),
            _ => Err(Error::InvalidParams(format!(
                "Invalid serial_snap_proto, only 'hhl' or 'prodex' supported, got {s}"
            ))),
        }
    }
}

/// Serial line settings, overridable per port; defaults match the reference implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: serial2::CharSize,
    pub parity: serial2::Parity,
    pub stop_bits: serial2::StopBits,
    pub flow_control: serial2::FlowControl,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: serial2::CharSize::Bits8,
            parity: serial2::Parity::None,
            stop_bits: serial2::StopBits::One,
            flow_control: serial2::FlowControl::None,
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
        }
    }
}

impl SerialSettings {
    /// Overrides the baud rate, range-checked against [`BAUD_BOUNDS`].
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Result<Self, Error> {
        if !BAUD_BOUNDS.contains(&baud_rate) {
            return Err(Error::InvalidParams(format!(
                "baud rate {} out of supported range {}..={}",
                baud_rate,
                BAUD_BOUNDS.start(),
                BAUD_BOUNDS.end()
            )));
        }
        self.baud_rate = baud_rate;
        Ok(self)
    }
}

impl IntoSettings for SerialSettings {
    fn apply_to_settings(self, settings: &mut serial2::Settings) -> std::io::Result<()> {
        settings.set_raw();
        settings.set_baud_rate(self.baud_rate)?;
        settings.set_char_size(self.data_bits);
        settings.set_stop_bits(self.stop_bits);
        settings.set_parity(self.parity);
        settings.set_flow_control(self.flow_control);
        Ok(())
    }
}

impl Display for SerialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} baud, {:?}/{:?}", self.baud_rate, self.data_bits, self.stop_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_from_str() {
        assert_eq!("hhl".parse::<Profile>().unwrap(), Profile::Hhl);
        assert_eq!("PRODEX".parse::<Profile>().unwrap(), Profile::Prodex);
        assert!("nope".parse::<Profile>().is_err());
    }

    #[test]
    fn baud_rate_bounds_checked() {
        assert!(SerialSettings::default().with_baud_rate(9600).is_ok());
        assert!(SerialSettings::default().with_baud_rate(1_000_001).is_err());
        assert!(SerialSettings::default().with_baud_rate(100).is_err());
    }
}
