// Single-shot cancellable timers
// Fires are delivered back to the event loop as messages, never run on the
// sleeper thread itself.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Cancellation flag that also wakes whoever is waiting on it.
#[derive(Debug, Default)]
struct Cancellation {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl Cancellation {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one scheduled timer.
///
/// Clones share the cancellation flag. Two handles are equal when they refer
/// to the same scheduled timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    cancellation: Arc<Cancellation>,
}

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cancellation: Arc::default(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancellation.lock()
    }

    /// Marks the timer cancelled and wakes its sleeper. Idempotent.
    pub fn cancel(&self) {
        *self.cancellation.lock() = true;
        self.cancellation.wake.notify_all();
    }

    /// Blocks for `delay` or until cancelled. Returns true if cancelled.
    fn sleep(&self, delay: Duration) -> bool {
        let guard = self.cancellation.lock();
        let (guard, _) = self
            .cancellation
            .wake
            .wait_timeout_while(guard, delay, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

impl PartialEq for TimerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TimerHandle {}

/// A timer that has come due.
#[derive(Debug, Clone)]
pub struct TimerFire<P> {
    pub handle: TimerHandle,
    pub payload: P,
}

/// Schedules payloads to be handed back after a delay.
pub trait Timer<P> {
    fn schedule(&mut self, delay: Duration, payload: P) -> TimerHandle;

    /// Safe to call on timers that already fired or were already cancelled.
    fn cancel(&mut self, handle: &TimerHandle) {
        handle.cancel();
    }
}

type Sink<P> = Arc<dyn Fn(TimerFire<P>) + Send + Sync>;

/// Timer backed by one sleeping thread per schedule.
///
/// When a timer comes due and has not been cancelled, the fire is passed to
/// the sink, which normally posts it to the event loop channel.
pub struct ThreadTimer<P> {
    next_id: u64,
    sink: Sink<P>,
}

impl<P: Send + 'static> ThreadTimer<P> {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(TimerFire<P>) + Send + Sync + 'static,
    {
        Self {
            next_id: 0,
            sink: Arc::new(sink),
        }
    }
}

impl<P: Send + 'static> Timer<P> for ThreadTimer<P> {
    fn schedule(&mut self, delay: Duration, payload: P) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);

        let fire = TimerFire {
            handle: handle.clone(),
            payload,
        };
        let sink = Arc::clone(&self.sink);
        thread::spawn(move || {
            if fire.handle.sleep(delay) {
                log::trace!("Timer {} was cancelled before firing", fire.handle.id());
                return;
            }
            sink(fire);
        });

        handle
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A scheduled entry recorded by [`ManualTimer`].
    #[derive(Debug, Clone)]
    pub struct Scheduled<P> {
        pub delay: Duration,
        pub fire: TimerFire<P>,
    }

    /// Records schedules; tests fire them by hand.
    #[derive(Debug)]
    pub struct ManualTimer<P> {
        next_id: u64,
        pub scheduled: Vec<Scheduled<P>>,
    }

    impl<P> Default for ManualTimer<P> {
        fn default() -> Self {
            Self {
                next_id: 0,
                scheduled: Vec::new(),
            }
        }
    }

    impl<P: Clone> ManualTimer<P> {
        /// Handles that are neither fired nor cancelled.
        pub fn live(&self) -> Vec<&Scheduled<P>> {
            self.scheduled
                .iter()
                .filter(|s| !s.fire.handle.is_cancelled())
                .collect()
        }

        pub fn last(&self) -> Option<&Scheduled<P>> {
            self.scheduled.last()
        }
    }

    impl<P> Timer<P> for ManualTimer<P> {
        fn schedule(&mut self, delay: Duration, payload: P) -> TimerHandle {
            self.next_id += 1;
            let handle = TimerHandle::new(self.next_id);
            self.scheduled.push(Scheduled {
                delay,
                fire: TimerFire {
                    handle: handle.clone(),
                    payload,
                },
            });
            handle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn channel_timer() -> (ThreadTimer<&'static str>, mpsc::Receiver<TimerFire<&'static str>>) {
        let (tx, rx) = mpsc::channel();
        let timer = ThreadTimer::new(move |fire| {
            let _ = tx.send(fire);
        });
        (timer, rx)
    }

    #[test]
    fn fires_with_payload() {
        let (mut timer, rx) = channel_timer();
        let handle = timer.schedule(Duration::from_millis(10), "track");

        let fire = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(fire.handle, handle);
        assert_eq!(fire.payload, "track");
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let (mut timer, rx) = channel_timer();
        let handle = timer.schedule(Duration::from_millis(50), "track");
        timer.cancel(&handle);

        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    }

    #[test]
    fn cancel_wakes_sleeper_thread() {
        let (mut timer, rx) = channel_timer();
        let handle = timer.schedule(Duration::from_secs(240), "track");
        assert_eq!(Arc::strong_count(&timer.sink), 2);

        timer.cancel(&handle);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while Arc::strong_count(&timer.sink) > 1 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(Arc::strong_count(&timer.sink), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancel_is_idempotent() {
        let (mut timer, rx) = channel_timer();
        let handle = timer.schedule(Duration::from_millis(5), "track");
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        timer.cancel(&handle);
        timer.cancel(&handle);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn handles_are_distinct() {
        let (mut timer, _rx) = channel_timer();
        let first = timer.schedule(Duration::from_secs(60), "a");
        let second = timer.schedule(Duration::from_secs(60), "b");
        assert_ne!(first, second);
        assert_eq!(first, first.clone());
    }
}
