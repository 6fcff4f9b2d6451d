use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Default tick period of the session clock.
pub const TICK_RATE_MS: u64 = 200;

pub type SubscriptionId = u64;

type Callback<T> = Box<dyn FnMut(&T)>;

/// Registry of listeners invoked synchronously on every publish.
pub struct Subscribers<T> {
    next_id: SubscriptionId,
    callbacks: BTreeMap<SubscriptionId, Callback<T>>,
}

impl<T> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            callbacks: BTreeMap::new(),
        }
    }

    pub fn subscribe<F>(&mut self, f: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.insert(id, Box::new(f));
        id
    }

    /// Returns false when the handle was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.callbacks.remove(&id).is_some()
    }

    pub fn publish(&mut self, value: &T) {
        for f in self.callbacks.values_mut() {
            f(value);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

/// Session clock.
///
/// The start instant is captured once, on the inactive -> active transition,
/// and cleared when the session goes inactive again. Once halted the elapsed
/// value is frozen until the next reset. Observers receive `None` while the
/// clock is not running.
#[derive(Debug, Default)]
pub struct Timer {
    started_at: Option<Instant>,
    elapsed_secs: u64,
    halted: bool,
    subscribers: Subscribers<Option<u64>>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the activity/halt flags derived from the session.
    pub fn sync(&mut self, active: bool, halted: bool, now: Instant) {
        if !active {
            self.reset();
            return;
        }

        if self.started_at.is_none() {
            self.started_at = Some(now);
            self.elapsed_secs = 0;
            self.halted = false;
            self.notify();
        }

        if halted && !self.halted {
            // last reading at the completion instant, then freeze
            self.advance(now);
            self.halted = true;
            self.notify();
        } else if !halted {
            self.halted = false;
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.started_at.is_some() && !self.halted {
            self.advance(now);
            self.notify();
        }
    }

    pub fn reset(&mut self) {
        let was_running = self.started_at.take().is_some();
        self.elapsed_secs = 0;
        self.halted = false;
        if was_running {
            self.notify();
        }
    }

    /// Whole seconds since the first keystroke, `None` before it.
    pub fn elapsed(&self) -> Option<u64> {
        self.started_at.map(|_| self.elapsed_secs)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && !self.halted
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn subscribe<F>(&mut self, f: F) -> SubscriptionId
    where
        F: FnMut(&Option<u64>) + 'static,
    {
        self.subscribers.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn advance(&mut self, now: Instant) {
        if let Some(start) = self.started_at {
            self.elapsed_secs = round_secs(now.saturating_duration_since(start));
        }
    }

    fn notify(&mut self) {
        let value = self.elapsed();
        self.subscribers.publish(&value);
    }
}

fn round_secs(d: Duration) -> u64 {
    d.as_secs_f64().round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn reset_on_idle_timer_is_noop() {
        let mut timer = Timer::new();
        timer.reset();
        timer.reset();
        assert_eq!(timer.elapsed_secs(), 0);
        assert_eq!(timer.elapsed(), None);
    }

    #[test]
    fn starts_on_first_activity_and_rounds() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.sync(true, false, t0);
        assert_eq!(timer.elapsed(), Some(0));

        timer.on_tick(t0 + ms(1400));
        assert_eq!(timer.elapsed(), Some(1));
        timer.on_tick(t0 + ms(1600));
        assert_eq!(timer.elapsed(), Some(2));
    }

    #[test]
    fn start_instant_is_not_recaptured_while_active() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.sync(true, false, t0);
        timer.sync(true, false, t0 + ms(3000));
        timer.on_tick(t0 + ms(5000));
        assert_eq!(timer.elapsed(), Some(5));
    }

    #[test]
    fn ticks_before_start_do_nothing() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.on_tick(t0 + ms(9000));
        assert_eq!(timer.elapsed(), None);
        assert!(!timer.is_running());
    }

    #[test]
    fn halt_freezes_elapsed() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.sync(true, false, t0);
        timer.sync(true, true, t0 + ms(4000));
        assert!(timer.is_halted());
        assert_eq!(timer.elapsed(), Some(4));

        timer.on_tick(t0 + ms(60_000));
        assert_eq!(timer.elapsed(), Some(4));
    }

    #[test]
    fn going_inactive_clears_everything() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.sync(true, false, t0);
        timer.on_tick(t0 + ms(3000));
        timer.sync(false, false, t0 + ms(3100));
        assert_eq!(timer.elapsed(), None);
        assert_eq!(timer.elapsed_secs(), 0);

        // a fresh start measures from the new instant
        timer.sync(true, false, t0 + ms(10_000));
        timer.on_tick(t0 + ms(12_000));
        assert_eq!(timer.elapsed(), Some(2));
    }

    #[test]
    fn broadcasts_to_every_subscriber() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        let a = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::new(RefCell::new(Vec::new()));
        let a_sink = Rc::clone(&a);
        let b_sink = Rc::clone(&b);
        timer.subscribe(move |v| a_sink.borrow_mut().push(*v));
        let id_b = timer.subscribe(move |v| b_sink.borrow_mut().push(*v));

        timer.sync(true, false, t0);
        timer.on_tick(t0 + ms(1000));
        assert!(timer.unsubscribe(id_b));
        assert!(!timer.unsubscribe(id_b));
        timer.reset();

        assert_eq!(*a.borrow(), vec![Some(0), Some(1), None]);
        assert_eq!(*b.borrow(), vec![Some(0), Some(1)]);
    }

    #[test]
    fn subscribers_registry_tracks_handles() {
        let mut subs: Subscribers<u8> = Subscribers::new();
        assert!(subs.is_empty());
        let first = subs.subscribe(|_| {});
        let second = subs.subscribe(|_| {});
        assert_ne!(first, second);
        assert_eq!(subs.len(), 2);
        subs.unsubscribe(first);
        assert_eq!(subs.len(), 1);
    }
}
