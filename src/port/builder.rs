//! Type-state builder for [`super::PortAdapter`], in the same style as the reference transport
//! layer's own connection builder: `.with_serial(path)` then tunable setters then `.build(...)`.

use std::marker::PhantomData;
use std::time::Instant;

use crate::config::{Profile, SerialSettings};
use crate::{AlpResult, Error};

use super::{AlarmSink, PortAdapter, TimerSource};

pub struct Init;
pub struct Serial;

/// Type-state builder for [`PortAdapter`] over a real [`serial2::SerialPort`].
pub struct PortAdapterBuilder<S> {
    path: Option<String>,
    settings: SerialSettings,
    profile: Profile,
    _marker: PhantomData<S>,
}

impl Default for PortAdapterBuilder<Init> {
    fn default() -> Self {
        Self::new()
    }
}

impl PortAdapterBuilder<Init> {
    pub fn new() -> Self {
        Self {
            path: None,
            settings: SerialSettings::default(),
            profile: Profile::Hhl,
            _marker: PhantomData,
        }
    }

    /// Continues the builder down the serial path.
    pub fn with_serial(self, path: &str) -> PortAdapterBuilder<Serial> {
        PortAdapterBuilder {
            path: Some(path.to_string()),
            settings: self.settings,
            profile: self.profile,
            _marker: PhantomData,
        }
    }
}

impl PortAdapterBuilder<Serial> {
    pub fn baud(mut self, baud: u32) -> AlpResult<Self> {
        self.settings = self.settings.with_baud_rate(baud)?;
        Ok(self)
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Opens the serial port and builds the adapter, registering the diagnostics timer.
    pub fn build<T, A>(
        self,
        timer: T,
        alarm_sink: A,
    ) -> AlpResult<PortAdapter<serial2::SerialPort, T, A>>
    where
        T: TimerSource,
        A: AlarmSink,
    {
        let path = self
            .path
            .ok_or_else(|| Error::InvalidParams("serial path required to build a port".to_string()))?;
        let line = serial2::SerialPort::open(&path, self.settings)?;
        Ok(PortAdapter::new(
            path,
            line,
            self.profile,
            timer,
            alarm_sink,
            Instant::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_baud() {
        let result = PortAdapterBuilder::new().with_serial("/dev/null").baud(1);
        assert!(result.is_err());
    }

    #[test]
    fn build_without_serial_path_is_unreachable_by_type_state() {
        // PortAdapterBuilder<Serial> always carries a path, set by with_serial; this is
        // enforced at compile time by the type-state transition rather than at runtime.
        let builder = PortAdapterBuilder::new().with_serial("/dev/null");
        assert!(builder.path.is_some());
    }
}
