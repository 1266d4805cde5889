use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use log::{debug, trace};

use crate::profile::ProfileSink;
use crate::session::{SessionResult, Transition, TypingSession};

/// Round clock period.
pub const CLOCK_INTERVAL: Duration = Duration::from_secs(1);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived within the ticker interval; time to repaint.
    Tick,
    /// One second of round time for the session of the given generation.
    ClockTick(u64),
    /// One opponent keystroke for the session of the given generation.
    OpponentTick(u64),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait SessionEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key_tx.send(SessionEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(SessionEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    /// Sender for schedulers that feed ticks into the same loop.
    pub fn sender(&self) -> Sender<SessionEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl SessionEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
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

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: SessionEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: SessionEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> SessionEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                SessionEvent::Tick
            }
        }
    }
}

/// Which periodic event a scheduler produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickKind {
    Clock,
    Opponent,
}

impl TickKind {
    fn event(self, generation: u64) -> SessionEvent {
        match self {
            TickKind::Clock => SessionEvent::ClockTick(generation),
            TickKind::Opponent => SessionEvent::OpponentTick(generation),
        }
    }
}

/// Fires a tick event at a fixed interval until stopped.
pub trait Scheduler {
    fn start(&mut self, interval: Duration, generation: u64);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Scheduler backed by a sleeping background thread.
///
/// Stopping flips a shared flag; the thread notices after its current sleep
/// and exits without sending. It also exits once the receiver is gone.
pub struct ThreadScheduler {
    kind: TickKind,
    tx: Sender<SessionEvent>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl ThreadScheduler {
    pub fn new(kind: TickKind, tx: Sender<SessionEvent>) -> Self {
        Self {
            kind,
            tx,
            stop_flag: None,
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn start(&mut self, interval: Duration, generation: u64) {
        self.stop();

        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_flag = Arc::clone(&stop_flag);
        let tx = self.tx.clone();
        let event = self.kind.event(generation);

        thread::spawn(move || loop {
            thread::sleep(interval);
            if thread_flag.load(Ordering::SeqCst) || tx.send(event.clone()).is_err() {
                break;
            }
        });

        debug!("{:?} scheduler started every {:?}", self.kind, interval);
        self.stop_flag = Some(stop_flag);
    }

    fn stop(&mut self) {
        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::SeqCst);
            debug!("{:?} scheduler stopped", self.kind);
        }
    }

    fn is_running(&self) -> bool {
        self.stop_flag.is_some()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scheduler that never fires on its own; tests deliver ticks by hand.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManualScheduler {
    pub running: bool,
    pub interval: Option<Duration>,
    pub generation: Option<u64>,
    pub starts: usize,
    pub stops: usize,
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, interval: Duration, generation: u64) {
        self.running = true;
        self.interval = Some(interval);
        self.generation = Some(generation);
        self.starts += 1;
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.stops += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Owns the live session and serializes every mutation to it.
///
/// Keystroke edits, clock ticks and opponent ticks all pass through here, so
/// both schedules start on the first keystroke and stop together when the
/// round ends, the opponent runs out of text, or the session is replaced.
/// Each session gets a fresh generation number; ticks carrying an older one
/// are dropped.
pub struct SessionDriver<S: Scheduler, P: ProfileSink> {
    session: TypingSession,
    generation: u64,
    clock: S,
    opponent: S,
    sink: P,
}

impl<S: Scheduler, P: ProfileSink> SessionDriver<S, P> {
    pub fn new(session: TypingSession, clock: S, opponent: S, sink: P) -> Self {
        Self {
            session,
            generation: 0,
            clock,
            opponent,
            sink,
        }
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn clock_scheduler(&self) -> &S {
        &self.clock
    }

    pub fn opponent_scheduler(&self) -> &S {
        &self.opponent
    }

    /// Discards the current session, whatever its state, and installs a new one.
    pub fn replace(&mut self, session: TypingSession) {
        self.stop_schedules();
        self.generation += 1;
        self.session = session;
        debug!("installed session generation {}", self.generation);
    }

    /// Applies a keystroke-driven edit.
    pub fn edit<F>(&mut self, f: F) -> Transition
    where
        F: FnOnce(&mut TypingSession) -> Transition,
    {
        let transition = f(&mut self.session);
        self.react(transition);
        transition
    }

    /// Applies a scheduler event. Other events are ignored.
    pub fn on_event(&mut self, event: &SessionEvent) -> Transition {
        let transition = match *event {
            SessionEvent::ClockTick(generation) if generation == self.generation => {
                self.session.tick_clock()
            }
            SessionEvent::OpponentTick(generation) if generation == self.generation => {
                self.session.tick_opponent()
            }
            SessionEvent::ClockTick(generation) | SessionEvent::OpponentTick(generation) => {
                trace!("dropping stale tick from generation {generation}");
                Transition::Ignored
            }
            _ => Transition::Ignored,
        };
        self.react(transition);
        transition
    }

    /// Ends the round early and forwards its result.
    pub fn finish(&mut self) -> Option<SessionResult> {
        let result = self.session.finish()?;
        self.react(Transition::Finished(result));
        Some(result)
    }

    /// Stops both schedules without touching the session (navigating away).
    pub fn stop_schedules(&mut self) {
        self.clock.stop();
        self.opponent.stop();
    }

    fn react(&mut self, transition: Transition) {
        match transition {
            Transition::Started => {
                self.clock.start(CLOCK_INTERVAL, self.generation);
                if let Some(opponent) = self.session.opponent() {
                    self.opponent
                        .start(opponent.config().interval(), self.generation);
                }
            }
            Transition::OpponentFinished => self.stop_schedules(),
            Transition::Finished(result) => {
                self.stop_schedules();
                self.sink
                    .record_result(result.words_per_minute, result.accuracy_percent);
            }
            Transition::Updated | Transition::Ignored => {}
        }
    }
}

impl<S: Scheduler, P: ProfileSink> Drop for SessionDriver<S, P> {
    fn drop(&mut self) {
        self.stop_schedules();
    }
}
