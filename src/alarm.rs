//! Uplink/downlink alarm records carried between the SNAP layer and the alarm sink.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::snap::SnapMessage;

/// A decoded uplink message, flattened into string fields for forwarding to an alarm sink.
/// `BTreeMap` over `HashMap` for deterministic iteration order in logs and tests.
pub type UplinkAlarm = BTreeMap<String, String>;

/// Builds an [`UplinkAlarm`] from a decoded SNAP message.
pub fn uplink_alarm(msg: &SnapMessage) -> UplinkAlarm {
    let mut data = BTreeMap::new();
    data.insert("more".to_string(), if msg.more { "1" } else { "0" }.to_string());
    data.insert("msgCounter".to_string(), msg.message_counter.to_string());
    data.insert("serviceClass".to_string(), msg.service_class.to_string());
    data.insert("msgType".to_string(), msg.message_type.to_string());
    data.insert("systemId".to_string(), msg.system_id.to_string());
    data.insert("terminalId".to_string(), msg.terminal_id.to_string());
    data.insert("loopId".to_string(), msg.loop_id.to_string());
    data.insert("eventTime".to_string(), msg.event_time.to_string());
    data.insert(
        "data".to_string(),
        msg.data.iter().map(|&b| b as char).collect::<String>().replace('\r', ""),
    );
    data
}

/// Extra content bytes carried by a downlink alarm; a `&str` is UTF-8 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmContents(pub Vec<u8>);

impl From<&str> for AlarmContents {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for AlarmContents {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Builds a `SnapMessage` representing a generic alarm on/off event, addressed at
/// `(system_id, terminal_id, loop_id)` (defaulting to `(1, 1, 0)`).
pub fn generic_alarm_message(
    on_off: bool,
    addr: Option<(u16, u16, u16)>,
    contents: Option<AlarmContents>,
) -> SnapMessage {
    let (system_id, terminal_id, loop_id) = addr.unwrap_or((1, 1, 0));
    let event_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);

    SnapMessage {
        more: false,
        message_counter: 1,
        service_class: 1,
        message_type: if on_off { 1 } else { 9 },
        system_id,
        terminal_id,
        loop_id,
        event_time,
        data: contents.map(|c| c.0).unwrap_or_default(),
        empty: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg() -> SnapMessage {
        SnapMessage {
            more: true,
            message_counter: 3,
            service_class: 1,
            message_type: 1,
            system_id: 10,
            terminal_id: 20,
            loop_id: 30,
            event_time: 123,
            data: b"al\rarm".to_vec(),
            empty: false,
        }
    }

    #[test]
    fn uplink_alarm_strips_carriage_returns() {
        let alarm = uplink_alarm(&msg());
        assert_eq!(alarm["data"], "alarm");
        assert_eq!(alarm["more"], "1");
        assert_eq!(alarm["loopId"], "30");
    }

    #[test]
    fn generic_alarm_message_defaults_address() {
        let on = generic_alarm_message(true, None, None);
        assert_eq!((on.system_id, on.terminal_id, on.loop_id), (1, 1, 0));
        assert_eq!(on.message_type, 1);

        let off = generic_alarm_message(false, Some((5, 6, 7)), Some("x".into()));
        assert_eq!((off.system_id, off.terminal_id, off.loop_id), (5, 6, 7));
        assert_eq!(off.message_type, 9);
        assert_eq!(off.data, b"x");
    }
}
