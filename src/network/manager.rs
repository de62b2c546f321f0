use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Vòng đời của kênh realtime, theo góc nhìn của phần còn lại của app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Open,
    /// Closed, with a reconnect timer pending.
    Retrying,
    /// Closed for good; the retry budget is spent.
    Exhausted,
    /// Torn down by the session. Every further input is inert.
    Shutdown,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Idle => "idle",
            LinkState::Connecting => "connecting",
            LinkState::Open => "open",
            LinkState::Retrying => "retrying",
            LinkState::Exhausted => "exhausted",
            LinkState::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lịch reconnect: exponential backoff có trần, số lần thử bị chặn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based):
    /// `base * 2^(attempt - 1)`, capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let millis = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(millis.min(self.max_delay_ms))
    }
}

/// What the driver must do after a close event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconnect {
    /// Arm a single reconnect timer. `notify` is set only on the first
    /// transition into retrying for this outage.
    After {
        attempt: u32,
        delay: Duration,
        epoch: u64,
        notify: bool,
    },
    /// Retry budget spent; surface the terminal status and stop.
    GiveUp,
    /// Close observed in a state that schedules nothing.
    Ignored,
}

/// Decision half of the connection lifecycle: at most one live or in-flight
/// dial, at most one pending timer, a bounded retry budget, and an
/// idempotent teardown that a stale timer cannot revive.
///
/// The machine does no I/O; the driver feeds it events and executes the
/// returned decisions. Timer identity is an epoch counter: only the most
/// recently scheduled timer may dial, so an overlapping or post-teardown
/// fire falls through as a no-op.
#[derive(Debug)]
pub struct ConnectionManager {
    state: LinkState,
    attempts: u32,
    epoch: u64,
    notified_retrying: bool,
    policy: ReconnectPolicy,
}

impl ConnectionManager {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: LinkState::Idle,
            attempts: 0,
            epoch: 0,
            notified_retrying: false,
            policy,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    /// Request an initial dial. Returns true when the caller should dial.
    /// A no-op while a connection is live or already in flight, while a
    /// retry timer owns the next dial, and after exhaustion or teardown.
    pub fn connect(&mut self) -> bool {
        match self.state {
            LinkState::Idle => {
                self.state = LinkState::Connecting;
                true
            }
            _ => false,
        }
    }

    /// The channel reported ready.
    pub fn link_opened(&mut self) {
        self.state = LinkState::Open;
        self.attempts = 0;
        self.notified_retrying = false;
    }

    /// The channel closed, or a dial failed; both are the same event here.
    pub fn link_closed(&mut self) -> Reconnect {
        match self.state {
            LinkState::Connecting | LinkState::Open => {
                if self.attempts < self.policy.max_attempts {
                    self.attempts += 1;
                    self.epoch += 1;
                    self.state = LinkState::Retrying;
                    let notify = !self.notified_retrying;
                    self.notified_retrying = true;
                    Reconnect::After {
                        attempt: self.attempts,
                        delay: self.policy.delay_for(self.attempts),
                        epoch: self.epoch,
                        notify,
                    }
                } else {
                    self.state = LinkState::Exhausted;
                    Reconnect::GiveUp
                }
            }
            _ => Reconnect::Ignored,
        }
    }

    /// A reconnect timer fired. Returns true when the caller should dial.
    pub fn timer_fired(&mut self, epoch: u64) -> bool {
        if self.state == LinkState::Retrying && epoch == self.epoch {
            self.state = LinkState::Connecting;
            true
        } else {
            false
        }
    }

    /// Idempotent session teardown. Bumping the epoch invalidates any timer
    /// still in flight.
    pub fn teardown(&mut self) {
        self.epoch += 1;
        self.state = LinkState::Shutdown;
    }
}
