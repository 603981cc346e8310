use crate::duration::TimeParts;
use serde::{Deserialize, Serialize};

/// Countdown state as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStateKind {
    Stopped,
    Running,
    Paused,
}

/// Messages from daemon to clients (JSON-lines over Unix socket).
/// Transition events are broadcast to every subscriber; `Status` and `Ack`
/// go only to the requesting client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonMsg {
    /// A countdown (re)started with the given duration.
    #[serde(rename = "started")]
    Started { duration: TimeParts },
    /// Periodic remaining-time update while running.
    #[serde(rename = "tick")]
    Tick { remaining: TimeParts },
    /// Countdown paused; `remaining` is frozen until resume.
    #[serde(rename = "paused")]
    Paused {
        duration: TimeParts,
        remaining: TimeParts,
    },
    /// Countdown resumed from where it was paused.
    #[serde(rename = "resumed")]
    Resumed {
        duration: TimeParts,
        remaining: TimeParts,
    },
    /// Countdown stopped early; the duration stays remembered.
    #[serde(rename = "stopped")]
    Stopped { duration: TimeParts },
    /// Countdown ran out.
    #[serde(rename = "alarm")]
    Alarm { duration: TimeParts },
    /// Engine reset; the remembered duration was discarded.
    #[serde(rename = "reset")]
    WasReset,
    /// An OS shutdown fires in `grace_ms` unless cancelled.
    #[serde(rename = "shutdown_pending")]
    ShutdownPending { grace_ms: u64 },
    /// A pending OS shutdown was cancelled in time.
    #[serde(rename = "shutdown_cancelled")]
    ShutdownCancelled,
    /// Status response.
    #[serde(rename = "status")]
    Status {
        state: TimerStateKind,
        input_ms: Option<u64>,
        remaining_ms: Option<u64>,
        version: String,
    },
    /// Acknowledgement for commands.
    #[serde(rename = "ack")]
    Ack { ok: bool, message: String },
}

/// Messages from clients to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Start (or restart) a countdown. `ms: None` reuses the remembered
    /// duration. Signed so that out-of-range input reaches the engine's
    /// own validation instead of failing to parse.
    #[serde(rename = "start")]
    Start { ms: Option<i64> },
    #[serde(rename = "pause")]
    Pause,
    #[serde(rename = "resume")]
    Resume,
    #[serde(rename = "stop")]
    Stop,
    #[serde(rename = "reset")]
    Reset,
    /// Abort a pending OS shutdown during the grace period.
    #[serde(rename = "cancel_shutdown")]
    CancelShutdown,
    #[serde(rename = "get_status")]
    GetStatus,
    /// Client announcing it wants the transition-event broadcast stream.
    #[serde(rename = "subscribe")]
    Subscribe,
}

/// Serialize a message as a JSON line (with trailing newline).
pub fn encode(msg: &impl Serialize) -> String {
    let mut s = serde_json::to_string(msg).expect("serialize IPC message");
    s.push('\n');
    s
}

/// Deserialize a JSON line. Returns None on empty/whitespace input.
pub fn decode_daemon(line: &str) -> Option<DaemonMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

pub fn decode_client(line: &str) -> Option<ClientMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- spec: encoded messages are single JSON lines ---

    #[test]
    fn encode_produces_trailing_newline() {
        let msg = DaemonMsg::WasReset;
        let encoded = encode(&msg);
        assert!(encoded.ends_with('\n'));
        assert_eq!(encoded.matches('\n').count(), 1);
    }

    #[test]
    fn encoded_messages_contain_type_field() {
        assert!(encode(&DaemonMsg::WasReset).contains("\"type\""));
        assert!(encode(&ClientMsg::Pause).contains("\"type\""));
    }

    // --- spec: payload shapes survive the wire ---

    #[test]
    fn tick_carries_decomposed_remaining_time() {
        let msg = DaemonMsg::Tick {
            remaining: TimeParts::from_millis(4_000),
        };
        let decoded = decode_daemon(&encode(&msg)).expect("should decode");
        match decoded {
            DaemonMsg::Tick { remaining } => {
                assert_eq!(remaining.total_ms, 4_000);
                assert_eq!(remaining.seconds, 4);
            }
            _ => panic!("expected Tick"),
        }
    }

    #[test]
    fn paused_carries_both_duration_and_remaining() {
        let msg = DaemonMsg::Paused {
            duration: TimeParts::from_millis(5_000),
            remaining: TimeParts::from_millis(4_000),
        };
        let decoded = decode_daemon(&encode(&msg)).expect("should decode");
        match decoded {
            DaemonMsg::Paused { duration, remaining } => {
                assert_eq!(duration.total_ms, 5_000);
                assert_eq!(remaining.total_ms, 4_000);
            }
            _ => panic!("expected Paused"),
        }
    }

    #[test]
    fn start_with_no_duration_round_trips_as_none() {
        let decoded = decode_client(&encode(&ClientMsg::Start { ms: None }));
        match decoded {
            Some(ClientMsg::Start { ms }) => assert_eq!(ms, None),
            other => panic!("expected Start, got {:?}", other),
        }
    }

    #[test]
    fn start_accepts_negative_ms_on_the_wire() {
        // Validation is the engine's job, not the codec's.
        let decoded = decode_client("{\"type\":\"start\",\"ms\":-10}");
        match decoded {
            Some(ClientMsg::Start { ms }) => assert_eq!(ms, Some(-10)),
            other => panic!("expected Start, got {:?}", other),
        }
    }

    #[test]
    fn status_state_serializes_lowercase() {
        let msg = DaemonMsg::Status {
            state: TimerStateKind::Paused,
            input_ms: Some(5_000),
            remaining_ms: Some(4_000),
            version: "0.1.0".into(),
        };
        assert!(encode(&msg).contains("\"paused\""));
    }

    // --- spec: empty/garbage input → None, never a panic ---

    #[test]
    fn decode_returns_none_for_empty() {
        assert!(decode_daemon("").is_none());
        assert!(decode_daemon("   \n").is_none());
        assert!(decode_client("").is_none());
    }

    #[test]
    fn decode_returns_none_for_garbage() {
        assert!(decode_daemon("not json").is_none());
        assert!(decode_client("{\"type\":\"unknown_variant\"}").is_none());
    }
}
