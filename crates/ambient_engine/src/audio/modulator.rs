//! Dynamic modulator
//!
//! Background timer that, while dynamic mode is on, periodically asks the
//! mixer to perturb active volumes. The perturbation itself lives in
//! [`MixerState::modulate`](crate::audio::state::MixerState::modulate);
//! this module only owns the timer thread.
//!
//! Each start bumps a run epoch that is passed to every tick. The mixer
//! checks the epoch under its lock, so once [`DynamicModulator::stop`] has
//! returned no tick of the old run can be applied, even if its thread is
//! still waking up.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};

/// A running timer thread
struct Running {
    /// Dropping this wakes and ends the thread
    _stop: Sender<()>,
    _handle: JoinHandle<()>,
}

/// Periodic tick source for dynamic mode
pub struct DynamicModulator {
    interval: Duration,
    epoch: u64,
    running: Option<Running>,
}

impl DynamicModulator {
    /// Create a stopped modulator ticking every `interval`
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            epoch: 0,
            running: None,
        }
    }

    /// Tick period
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Epoch of the current (or last) run
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True while a timer thread is armed
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Arm the timer. `tick` is called with the run epoch every interval until
    /// it returns false or the modulator is stopped. Returns `Ok(false)` if a
    /// timer was already armed.
    pub fn start<F>(&mut self, tick: F) -> std::io::Result<bool>
    where
        F: Fn(u64) -> bool + Send + 'static,
    {
        if self.running.is_some() {
            return Ok(false);
        }

        let epoch = self.epoch.wrapping_add(1);
        let interval = self.interval;
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = std::thread::Builder::new()
            .name("mixer-modulator".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !tick(epoch) {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        self.epoch = epoch;
        self.running = Some(Running {
            _stop: stop_tx,
            _handle: handle,
        });
        log::info!("Dynamic modulator started (every {:?})", interval);
        Ok(true)
    }

    /// Disarm the timer. Ticks carrying the old epoch must be ignored by the
    /// caller from now on. Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };
        self.epoch = self.epoch.wrapping_add(1);
        // The thread may be blocked on the mixer lock held by our caller, so
        // it is detached rather than joined
        drop(running);
        log::info!("Dynamic modulator stopped");
        true
    }
}

impl Drop for DynamicModulator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn wait_for(counter: &AtomicU64, at_least: u64) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < at_least {
            if Instant::now() > deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        true
    }

    #[test]
    fn test_ticks_until_stopped() {
        let ticks = Arc::new(AtomicU64::new(0));
        let mut modulator = DynamicModulator::new(Duration::from_millis(5));

        let counter = Arc::clone(&ticks);
        assert!(modulator.start(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap());
        assert!(modulator.is_running());
        assert!(wait_for(&ticks, 3));

        assert!(modulator.stop());
        assert!(!modulator.is_running());
        assert!(!modulator.stop());
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut modulator = DynamicModulator::new(Duration::from_secs(60));
        assert!(modulator.start(|_| true).unwrap());
        let epoch = modulator.epoch();
        assert!(!modulator.start(|_| true).unwrap());
        assert_eq!(modulator.epoch(), epoch);
    }

    #[test]
    fn test_epoch_changes_across_runs() {
        let seen = Arc::new(AtomicU64::new(0));
        let mut modulator = DynamicModulator::new(Duration::from_millis(5));

        modulator.start(|_| true).unwrap();
        let first = modulator.epoch();
        modulator.stop();

        let recorder = Arc::clone(&seen);
        modulator
            .start(move |epoch| {
                recorder.store(epoch, Ordering::SeqCst);
                true
            })
            .unwrap();
        let second = modulator.epoch();
        assert_ne!(first, second);
        assert!(wait_for(&seen, second));
        assert_eq!(seen.load(Ordering::SeqCst), second);
    }

    #[test]
    fn test_tick_returning_false_ends_thread() {
        let ticks = Arc::new(AtomicU64::new(0));
        let mut modulator = DynamicModulator::new(Duration::from_millis(2));
        let counter = Arc::clone(&ticks);
        modulator
            .start(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            })
            .unwrap();
        assert!(wait_for(&ticks, 1));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }
}
