use std::time::{Duration, Instant};

/// Source of time for the throttle gate
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by `Instant::now` and `thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Gate that spaces outbound calls at least `min_interval` apart.
/// The first call passes immediately.
pub struct Throttle<C: Clock> {
    min_interval: Duration,
    last_call: Option<Instant>,
    clock: C,
}

impl<C: Clock> Throttle<C> {
    pub fn new(min_interval: Duration, clock: C) -> Self {
        Self {
            min_interval,
            last_call: None,
            clock,
        }
    }

    /// Block until the next call is allowed, then mark it as made
    pub fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                log::debug!("Throttling for {:?}", remaining);
                self.clock.sleep(remaining);
            }
        }
        self.last_call = Some(self.clock.now());
    }

    /// Run `f` once the gate opens
    pub fn call<T>(&mut self, f: impl FnOnce() -> T) -> T {
        self.wait();
        f()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::Clock;
    use std::cell::{Cell, RefCell};
    use std::time::{Duration, Instant};

    /// Clock that only moves when slept on or advanced explicitly
    pub struct FakeClock {
        base: Instant,
        offset: Cell<Duration>,
        sleeps: RefCell<Vec<Duration>>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Cell::new(Duration::ZERO),
                sleeps: RefCell::new(Vec::new()),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.offset.set(self.offset.get() + by);
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }

        pub fn total_slept(&self) -> Duration {
            self.sleeps.borrow().iter().sum()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.base + self.offset.get()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
            self.advance(duration);
        }
    }
}
