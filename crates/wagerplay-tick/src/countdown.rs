//! Per-session countdown.

use std::time::Duration;

use crate::{TickConfig, TickPolicy, TickScheduler};

/// One second of countdown, as observed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Whole seconds left after this tick.
    pub remaining_secs: u64,
    /// `true` exactly once, on the tick that reaches zero.
    pub expired: bool,
}

impl CountdownTick {
    /// `mm:ss` rendering for a timer display.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}

/// Counts a session's time limit down at 1 Hz.
///
/// Runs on a cadence-preserving scheduler ([`TickPolicy::Drop`]) so the
/// displayed time stays close to the wall clock. The zero tick is
/// delivered once; after it, [`next`](Self::next) pends forever so a
/// `select!` loop never sees a second expiry.
pub struct Countdown {
    scheduler: TickScheduler,
    limit_secs: u64,
    remaining_secs: u64,
    zero_delivered: bool,
}

impl Countdown {
    const SECOND: Duration = Duration::from_secs(1);

    /// Starts counting down from `limit`, rounded down to whole seconds.
    pub fn new(limit: Duration) -> Self {
        let secs = limit.as_secs();
        Self {
            scheduler: Self::scheduler(),
            limit_secs: secs,
            remaining_secs: secs,
            zero_delivered: false,
        }
    }

    fn scheduler() -> TickScheduler {
        TickScheduler::new(TickConfig {
            period: Self::SECOND,
            policy: TickPolicy::Drop,
            initial_jitter: Duration::ZERO,
        })
    }

    /// Waits for the next second to elapse.
    pub async fn next(&mut self) -> CountdownTick {
        if self.remaining_secs == 0 {
            if self.zero_delivered {
                return std::future::pending().await;
            }
            self.zero_delivered = true;
            return CountdownTick { remaining_secs: 0, expired: true };
        }

        self.scheduler.wait_for_tick().await;
        self.remaining_secs -= 1;

        let expired = self.remaining_secs == 0;
        if expired {
            self.zero_delivered = true;
            self.scheduler.pause();
            tracing::debug!(limit_secs = self.limit_secs, "countdown reached zero");
        }
        CountdownTick {
            remaining_secs: self.remaining_secs,
            expired,
        }
    }

    /// Freezes the countdown, e.g. once the session reached a terminal
    /// state for another reason.
    pub fn stop(&mut self) {
        self.scheduler.pause();
    }

    /// Restarts from the full limit ("play again").
    pub fn reset(&mut self) {
        self.scheduler = Self::scheduler();
        self.remaining_secs = self.limit_secs;
        self.zero_delivered = false;
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.remaining_secs)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }
}
