use sdtimer_core::duration::TimeParts;
use sdtimer_core::ipc::TimerStateKind;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

/// Countdown states. The remembered input duration lives outside the state
/// because it survives stop and alarm (only `reset` discards it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Stopped,
    Running {
        remaining_ms: i64,
        /// When `remaining_ms` was last decremented. The next tick
        /// subtracts real elapsed time from here, so scheduler jitter
        /// never accumulates into the countdown.
        last_sample: Instant,
    },
    Paused {
        remaining_ms: i64,
    },
}

/// One tagged transition per operation, consumed by the daemon's
/// dispatcher. Fallible operations carry their error inside the event
/// rather than returning `Result`, so a failure is reported exactly once
/// through the same channel as the success it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Start(Result<TimeParts, TimerError>),
    /// Remaining time after a tick. Only ever emitted with a positive
    /// remainder; expiry emits `Alarm` instead.
    Countdown(TimeParts),
    Pause(Result<(TimeParts, TimeParts), TimerError>),
    Resume(Result<(TimeParts, TimeParts), TimerError>),
    Stop(Result<TimeParts, TimerError>),
    /// The countdown ran out; payload is the original input duration.
    Alarm(TimeParts),
    Reset,
}

/// Drift-correcting countdown state machine.
///
/// The scheduler primitive lives in the caller: the owning loop sleeps
/// until [`next_deadline`](Self::next_deadline) and then calls
/// [`tick`](Self::tick). Because pause/stop/reset change the state
/// synchronously, a tick arriving after cancellation observes the new
/// state and becomes a no-op; no stale tick can mutate a cancelled run.
pub struct ShutdownTimer {
    state: State,
    input: Option<TimeParts>,
    tick_interval: Duration,
}

impl Default for ShutdownTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL_MS)
    }
}

impl ShutdownTimer {
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            state: State::Stopped,
            input: None,
            tick_interval: Duration::from_millis(tick_interval_ms.max(1)),
        }
    }

    /// Begin (or restart) a countdown. `ms: None` reuses the remembered
    /// input duration. A restart while running replaces the in-flight run,
    /// so at most one countdown is ever active.
    pub fn start(&mut self, ms: Option<i64>) -> TimerEvent {
        let ms = match ms {
            Some(ms) if ms < 0 => {
                return TimerEvent::Start(Err(TimerError::InvalidArgument(
                    "duration must not be negative",
                )));
            }
            Some(ms) => ms as u64,
            None => match &self.input {
                Some(input) => input.total_ms,
                None => {
                    return TimerEvent::Start(Err(TimerError::InvalidState(
                        "no remembered duration to restart",
                    )));
                }
            },
        };

        let input = TimeParts::from_millis(ms);
        self.input = Some(input);
        self.state = State::Running {
            remaining_ms: ms as i64,
            last_sample: Instant::now(),
        };
        debug!(ms, "countdown started");
        TimerEvent::Start(Ok(input))
    }

    /// Freeze the countdown. The remaining time is kept; the clock sample
    /// is dropped so paused wall time never counts against the run.
    pub fn pause(&mut self) -> TimerEvent {
        match (self.state, self.input) {
            (State::Running { remaining_ms, .. }, Some(input)) => {
                self.state = State::Paused { remaining_ms };
                let remaining = TimeParts::from_millis(remaining_ms.max(0) as u64);
                debug!(remaining_ms, "countdown paused");
                TimerEvent::Pause(Ok((input, remaining)))
            }
            _ => TimerEvent::Pause(Err(TimerError::InvalidState("timer is not running"))),
        }
    }

    /// Continue a paused countdown from its frozen remaining time.
    pub fn resume(&mut self) -> TimerEvent {
        match (self.state, self.input) {
            (State::Paused { remaining_ms }, Some(input)) => {
                self.state = State::Running {
                    remaining_ms,
                    last_sample: Instant::now(),
                };
                let remaining = TimeParts::from_millis(remaining_ms.max(0) as u64);
                debug!(remaining_ms, "countdown resumed");
                TimerEvent::Resume(Ok((input, remaining)))
            }
            _ => TimerEvent::Resume(Err(TimerError::InvalidState("timer is not paused"))),
        }
    }

    /// Abort the run but remember the input duration, so a bare `start`
    /// afterwards restarts the same countdown.
    pub fn stop(&mut self) -> TimerEvent {
        match (self.state, self.input) {
            (State::Stopped, _) | (_, None) => {
                TimerEvent::Stop(Err(TimerError::InvalidState("timer was never started")))
            }
            (_, Some(input)) => {
                self.state = State::Stopped;
                debug!("countdown stopped");
                TimerEvent::Stop(Ok(input))
            }
        }
    }

    /// Clear every field, including the remembered input duration.
    /// Always succeeds, even on a fresh engine.
    pub fn reset(&mut self) -> TimerEvent {
        self.state = State::Stopped;
        self.input = None;
        debug!("countdown reset");
        TimerEvent::Reset
    }

    /// One scheduler period: subtract real elapsed wall time since the
    /// last sample and either report the remainder or raise the alarm.
    /// Returns `None` when not running (e.g. a tick that raced a
    /// cancellation), leaving all state untouched.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        let (remaining_ms, last_sample, input) = match (self.state, self.input) {
            (State::Running { remaining_ms, last_sample }, Some(input)) => {
                (remaining_ms, last_sample, input)
            }
            _ => return None,
        };

        let now = Instant::now();
        let elapsed = now.duration_since(last_sample).as_millis() as i64;
        let remaining = remaining_ms - elapsed;

        if remaining <= 0 {
            // The input stays readable alongside the terminal event.
            self.state = State::Stopped;
            debug!(input_ms = input.total_ms, "countdown expired");
            Some(TimerEvent::Alarm(input))
        } else {
            self.state = State::Running {
                remaining_ms: remaining,
                last_sample: now,
            };
            Some(TimerEvent::Countdown(TimeParts::from_millis(remaining as u64)))
        }
    }

    /// When the owning loop should call [`tick`](Self::tick) next, or
    /// `None` while no countdown is actively running.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            State::Running { last_sample, .. } => Some(last_sample + self.tick_interval),
            _ => None,
        }
    }

    pub fn state_kind(&self) -> TimerStateKind {
        match self.state {
            State::Stopped => TimerStateKind::Stopped,
            State::Running { .. } => TimerStateKind::Running,
            State::Paused { .. } => TimerStateKind::Paused,
        }
    }

    /// The remembered input duration. Present unless the engine was never
    /// started or was reset.
    pub fn input(&self) -> Option<TimeParts> {
        self.input
    }

    /// Milliseconds left, live-corrected while running, frozen while
    /// paused, absent while stopped.
    pub fn remaining_ms(&self) -> Option<u64> {
        match self.state {
            State::Running { remaining_ms, last_sample } => {
                let elapsed = last_sample.elapsed().as_millis() as i64;
                Some((remaining_ms - elapsed).max(0) as u64)
            }
            State::Paused { remaining_ms } => Some(remaining_ms.max(0) as u64),
            State::Stopped => None,
        }
    }
}
