//! The `hhl`/`prodex` SNAP message classifiers: turn a decoded [`SnapMessage`] into a
//! human-readable content tag and, for most traffic, an [`UplinkAlarm`] to forward.

use crate::alarm::{uplink_alarm, UplinkAlarm};
use crate::snap::SnapMessage;

const NON_SPECIFIED: &str = "non-specified";

/// Classifies a [`SnapMessage`] into a forwarding decision: either a tagged [`UplinkAlarm`], or
/// `None` if the message is uninteresting and should be silently dropped.
pub trait Classifier {
    fn classify(&self, msg: SnapMessage) -> Option<(String, UplinkAlarm)>;
}

/// HHL profile: content is derived purely from `(service_class, message_type, loop_id)`; the
/// message itself is forwarded unmodified.
#[derive(Debug, Default, Clone, Copy)]
pub struct HhlClassifier;

impl Classifier for HhlClassifier {
    fn classify(&self, msg: SnapMessage) -> Option<(String, UplinkAlarm)> {
        let content = hhl_content(&msg)?;
        let alarm = uplink_alarm(&msg);
        Some((content.to_string(), alarm))
    }
}

fn hhl_content(msg: &SnapMessage) -> Option<&'static str> {
    match msg.service_class {
        1 => match msg.message_type {
            1 => Some(match msg.loop_id {
                0 => "panel line alarm",
                1..=512 => "loop open (alarm)",
                521..=552 => "panic button",
                561..=592 => "control unit cover open",
                600 => "panel partial-monitoring",
                601..=632 => "group disarmed",
                680 => "panel acknowledgement",
                681 => "battery alarm",
                682 => "panel cover open",
                683 => "wrong code entered",
                691 => "reduced-function on",
                701..=956 => "user in",
                961..=992 => "group bypass on",
                _ => NON_SPECIFIED,
            }),
            2 => match msg.loop_id {
                1..=512 => Some("loop cover alarm"),
                _ => Some(NON_SPECIFIED),
            },
            7 => match msg.loop_id {
                1..=512 => Some("loop bypass on"),
                _ => Some(NON_SPECIFIED),
            },
            8 => match msg.loop_id {
                1..=512 => Some("loop bypass off"),
                _ => Some(NON_SPECIFIED),
            },
            9 => match msg.loop_id {
                0 => Some("line alarm restore"),
                1..=512 => Some("loop closed (restore)"),
                600 => Some("panel full-monitoring"),
                601..=632 => Some("group armed"),
                691 => Some("reduced-function off"),
                701..=956 => Some("user out"),
                961..=992 => Some("group bypass off"),
                2000 => None, // HHL-C heartbeat, discard
                _ => Some(NON_SPECIFIED),
            },
            _ => Some(NON_SPECIFIED),
        },
        // status-query, control-relay, control-command: unconditionally discarded
        91 | 92 | 94 => None,
        _ => Some(NON_SPECIFIED),
    }
}

/// PRODEX profile: only a fixed set of `(system_id, service_class)` tuples are forwarded; each
/// rewrites `loop_id` (and `message_type`, if it was `1`) before forwarding, and prepends its
/// content tag to the forwarded `data` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProdexClassifier;

impl Classifier for ProdexClassifier {
    fn classify(&self, mut msg: SnapMessage) -> Option<(String, UplinkAlarm)> {
        if !matches!(msg.message_type, 1 | 9) {
            return None;
        }

        let (content, loop_id, message_type_if_one) = match (msg.system_id, msg.service_class) {
            (680, 10) => ("fire alarm (group)", 1u16, 1u8),
            (681, 11) => ("pre-alarm (group)", 3, 8),
            (688, 1) => ("panel line alarm", 0, 3),
            (689, 1) => ("fire alarm", 1, 1),
            _ => return None,
        };

        msg.loop_id = loop_id;
        if msg.message_type == 1 {
            msg.message_type = message_type_if_one;
        }

        let mut alarm = uplink_alarm(&msg);
        if let Some(data) = alarm.get("data").cloned() {
            alarm.insert("data".to_string(), format!("{content}: {data}"));
        }
        Some((content.to_string(), alarm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(service_class: u8, message_type: u8, loop_id: u16, system_id: u16) -> SnapMessage {
        SnapMessage {
            more: false,
            message_counter: 1,
            service_class,
            message_type,
            system_id,
            terminal_id: 1,
            loop_id,
            event_time: 0,
            data: b"x".to_vec(),
            empty: false,
        }
    }

    #[test]
    fn hhl_maps_panel_line_alarm() {
        let (content, _) = HhlClassifier.classify(msg(1, 1, 0, 0)).unwrap();
        assert_eq!(content, "panel line alarm");
    }

    #[test]
    fn hhl_discards_control_relay() {
        assert!(HhlClassifier.classify(msg(92, 1, 0, 0)).is_none());
    }

    #[test]
    fn hhl_discards_heartbeat() {
        assert!(HhlClassifier.classify(msg(1, 9, 2000, 0)).is_none());
    }

    #[test]
    fn hhl_unmapped_loop_is_non_specified_but_forwarded() {
        let (content, _) = HhlClassifier.classify(msg(1, 1, 513, 0)).unwrap();
        assert_eq!(content, "non-specified");
    }

    #[test]
    fn prodex_rewrites_fire_alarm_group() {
        let (content, alarm) = ProdexClassifier.classify(msg(10, 1, 99, 680)).unwrap();
        assert_eq!(content, "fire alarm (group)");
        assert_eq!(alarm["loopId"], "1");
        assert_eq!(alarm["msgType"], "1");
        assert_eq!(alarm["data"], "fire alarm (group): x");
    }

    #[test]
    fn prodex_rewrites_prealarm_type_1_to_8() {
        let (_, alarm) = ProdexClassifier.classify(msg(11, 1, 0, 681)).unwrap();
        assert_eq!(alarm["msgType"], "8");
        assert_eq!(alarm["loopId"], "3");
    }

    #[test]
    fn prodex_keeps_type_9_unchanged_when_not_one() {
        let (_, alarm) = ProdexClassifier.classify(msg(11, 9, 0, 681)).unwrap();
        assert_eq!(alarm["msgType"], "9");
        assert_eq!(alarm["loopId"], "3");
    }

    #[test]
    fn prodex_discards_unmapped_system_id() {
        assert!(ProdexClassifier.classify(msg(12, 1, 0, 682)).is_none());
    }

    #[test]
    fn prodex_discards_non_alarm_message_type() {
        assert!(ProdexClassifier.classify(msg(1, 2, 0, 688)).is_none());
    }
}
