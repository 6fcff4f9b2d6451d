use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::quote::QuoteDelivery;

/// Unified event type consumed by the app runner
#[derive(Debug)]
pub enum TypurEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    QuoteLoaded(QuoteDelivery),
}

/// Source of events for the loop: terminal input plus background deliveries.
pub trait TypurEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TypurEvent, RecvTimeoutError>;

    /// Sender other threads (the quote fetcher) post into.
    fn sender(&self) -> Sender<TypurEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<TypurEvent>,
    rx: Receiver<TypurEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        std::thread::spawn(move || loop {
            let sent = match event::read() {
                Ok(CtEvent::Key(key)) => input_tx.send(TypurEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => input_tx.send(TypurEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    tracing::error!(error = %e, "terminal input reader stopped");
                    break;
                }
            };
            if sent.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TypurEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TypurEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<TypurEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::timer::TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    tx: Sender<TypurEvent>,
    rx: Receiver<TypurEvent>,
}

impl TestEventSource {
    /// Returns the source and a handle to feed it.
    pub fn new() -> (Self, Sender<TypurEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx: tx.clone(),
                rx,
            },
            tx,
        )
    }
}

impl TypurEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TypurEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<TypurEvent> {
        self.tx.clone()
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are due every `ticker.interval()` whether or not input keeps
/// arriving, so a steady typist never starves the clock.
pub struct Runner<E: TypurEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Cell<Instant>,
}

impl<E: TypurEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Cell::new(Instant::now()),
        }
    }

    /// Returns Tick once the interval has passed, otherwise blocks until the
    /// next event or the next tick, whichever comes first.
    pub fn step(&self) -> TypurEvent {
        let now = Instant::now();
        let due = self.last_tick.get() + self.ticker.interval();
        if now >= due {
            return self.tick(now);
        }

        match self.event_source.recv_timeout(due - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.tick(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                // nothing can arrive any more; keep ticking at the interval
                thread::sleep(due.saturating_duration_since(Instant::now()));
                self.tick(Instant::now())
            }
        }
    }

    pub fn sender(&self) -> Sender<TypurEvent> {
        self.event_source.sender()
    }

    fn tick(&self, now: Instant) -> TypurEvent {
        self.last_tick.set(now);
        TypurEvent::Tick
    }
}
