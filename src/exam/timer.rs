// src/exam/timer.rs

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// Receives countdown notifications. Called from the timer task.
pub trait TimerListener: Send + Sync + 'static {
    /// Remaining seconds after each decrement, down to and including 0.
    fn on_tick(&self, remaining: u64);

    /// Fired once, right after the tick that reaches 0.
    fn on_expiry(&self);
}

/// A running countdown. Cancelled when dropped, so its lifetime is tied to its owner.
#[derive(Debug)]
pub struct CountdownTimer {
    cancelled: Arc<AtomicBool>,
    expired: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Starts ticking immediately; the first tick arrives one second from now.
    /// A zero duration expires right away without ticking.
    pub fn start(duration_secs: u64, listener: Arc<dyn TimerListener>) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let expired = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn({
            let cancelled = cancelled.clone();
            let expired = expired.clone();
            async move {
                let period = Duration::from_secs(1);
                let mut interval = time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                let mut remaining = duration_secs;
                while remaining > 0 {
                    interval.tick().await;
                    if cancelled.load(Ordering::Acquire) {
                        return;
                    }
                    remaining -= 1;
                    listener.on_tick(remaining);
                }

                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                expired.store(true, Ordering::Release);
                listener.on_expiry();
            }
        });

        Self {
            cancelled,
            expired,
            handle,
        }
    }

    /// Stops the countdown. No notification is delivered after this returns,
    /// except one already being delivered on another thread.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
