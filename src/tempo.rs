// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::config::ClickConfig;
use crate::playsync::CancelHandle;
use crate::trigger::TriggerSender;

/// How long the driver sleeps per slice while waiting out a beat interval.
/// Bounds how long stop() can take; the remainder below one slice is slept
/// with spin_sleep to keep the tick accurate.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The tempo driver. Emits one beat trigger per beat interval on its own
/// thread until stopped.
pub struct TempoDriver {
    cancel_handle: CancelHandle,
    join_handle: JoinHandle<()>,
}

impl TempoDriver {
    /// Starts the driver. The first trigger fires one full beat interval
    /// after start. When the queue is full the trigger is dropped and that
    /// beat skips audibly; the driver never blocks on the consumer.
    pub fn start(
        config: &ClickConfig,
        triggers: TriggerSender,
        cancel_handle: CancelHandle,
    ) -> TempoDriver {
        let interval = config.beat_interval();
        let tune_latency = config.tune_latency();

        let join_handle = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || {
                // The schedule is absolute: next_tick advances by exactly one
                // interval per beat, so a delayed post never defers the
                // following tick and ticks are never skipped.
                let mut next_tick = Instant::now();
                loop {
                    next_tick += interval;
                    if sleep_until(next_tick, &cancel_handle) {
                        return;
                    }
                    if !tune_latency.is_zero() {
                        spin_sleep::sleep(tune_latency);
                    }
                    if !triggers.try_send() {
                        debug!("Trigger queue is full, dropping beat trigger.");
                    }
                }
            })
        };

        TempoDriver {
            cancel_handle,
            join_handle,
        }
    }

    /// Stops the driver and waits for the timer thread to exit. Safe to call
    /// while the queue is full or after the consumer is gone.
    pub fn stop(self) {
        self.cancel_handle.cancel();
        if self.join_handle.join().is_err() {
            error!("Tempo driver thread panicked.");
        }
    }
}

/// Sleeps until the deadline unless cancelled first; returns true when
/// cancelled. Coarse slices are plain thread sleeps, the final stretch uses
/// spin_sleep for tick accuracy.
fn sleep_until(deadline: Instant, cancel_handle: &CancelHandle) -> bool {
    loop {
        if cancel_handle.is_cancelled() {
            return true;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining > CANCEL_POLL_INTERVAL {
            thread::sleep(CANCEL_POLL_INTERVAL);
        } else {
            spin_sleep::sleep(remaining);
            return cancel_handle.is_cancelled();
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use serial_test::serial;

    use crate::config::ClickConfig;
    use crate::playsync::CancelHandle;
    use crate::test::eventually;
    use crate::trigger::{self, TRIGGER_QUEUE_CAPACITY};

    use super::TempoDriver;

    fn config(bpm: f64, tune_latency: Duration) -> ClickConfig {
        ClickConfig::new(bpm, 8000.0, 10.0, 1.0, tune_latency, true, true).expect("valid config")
    }

    #[test]
    #[serial]
    fn test_posts_triggers_at_cadence() {
        let (tx, rx) = trigger::channel();
        // 600 BPM: one trigger every 100ms.
        let driver = TempoDriver::start(&config(600.0, Duration::ZERO), tx, CancelHandle::new());

        let count = AtomicUsize::new(0);
        eventually(
            || {
                while rx.try_recv().is_some() {
                    count.fetch_add(1, Ordering::Relaxed);
                }
                count.load(Ordering::Relaxed) >= 3
            },
            "expected at least three beat triggers",
        );

        driver.stop();
    }

    #[test]
    #[serial]
    fn test_stop_halts_triggers() {
        let (tx, rx) = trigger::channel();
        let driver = TempoDriver::start(&config(6000.0, Duration::ZERO), tx, CancelHandle::new());

        eventually(|| rx.try_recv().is_some(), "expected a beat trigger");
        driver.stop();

        while rx.try_recv().is_some() {}
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_none());
    }

    #[test]
    #[serial]
    fn test_stop_with_full_queue_does_not_block() {
        let (tx, rx) = trigger::channel();
        // 6000 BPM with nobody consuming: the queue fills within ~100ms and
        // the driver starts dropping.
        let driver = TempoDriver::start(&config(6000.0, Duration::ZERO), tx, CancelHandle::new());

        thread::sleep(Duration::from_millis(300));
        driver.stop();

        let mut drained = 0;
        while rx.try_recv().is_some() {
            drained += 1;
        }
        assert_eq!(TRIGGER_QUEUE_CAPACITY, drained);
    }

    #[test]
    #[serial]
    fn test_tune_latency_delays_post_but_not_cadence() {
        let (tx, rx) = trigger::channel();
        // 1200 BPM ticks at 50ms; the 100ms latency means no post can land
        // before 150ms.
        let driver = TempoDriver::start(
            &config(1200.0, Duration::from_millis(100)),
            tx,
            CancelHandle::new(),
        );

        thread::sleep(Duration::from_millis(75));
        assert!(rx.try_recv().is_none());

        eventually(|| rx.try_recv().is_some(), "expected a delayed beat trigger");
        driver.stop();
    }
}
