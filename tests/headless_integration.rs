use std::sync::mpsc;
use std::time::Duration;

use assert_matches::assert_matches;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use typeduel::opponent::OpponentConfig;
use typeduel::profile::ProfileSummary;
use typeduel::runtime::{
    FixedTicker, ManualScheduler, Runner, SessionDriver, SessionEvent, TestEventSource,
};
use typeduel::session::{SessionOptions, SessionState, Transition, TypingSession};

fn key(c: char) -> SessionEvent {
    SessionEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn backspace() -> SessionEvent {
    SessionEvent::Key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE))
}

type Driver = SessionDriver<ManualScheduler, ProfileSummary>;

/// Minimal event loop: keys edit the session, ticks go to the driver.
fn pump(driver: &mut Driver, runner: &Runner<TestEventSource, FixedTicker>, max_steps: u32) {
    for _ in 0..max_steps {
        let transition = match runner.step() {
            SessionEvent::Key(k) => match k.code {
                KeyCode::Char(c) => driver.edit(|s| s.write(c)),
                KeyCode::Backspace => driver.edit(|s| s.backspace()),
                _ => Transition::Ignored,
            },
            SessionEvent::Tick => break,
            event => driver.on_event(&event),
        };
        if matches!(transition, Transition::Finished(_)) {
            break;
        }
    }
}

fn practice_driver(text: &str) -> Driver {
    SessionDriver::new(
        TypingSession::from_text(text, SessionOptions::practice()).unwrap(),
        ManualScheduler::default(),
        ManualScheduler::default(),
        ProfileSummary::new(),
    )
}

// Headless integration using the internal runtime without a TTY
#[test]
fn headless_typing_flow_completes() {
    let mut driver = practice_driver("hi");
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    tx.send(key('h')).unwrap();
    tx.send(SessionEvent::ClockTick(0)).unwrap();
    tx.send(SessionEvent::ClockTick(0)).unwrap();
    tx.send(key('i')).unwrap();

    pump(&mut driver, &runner, 100);

    let session = driver.session();
    assert_eq!(session.state(), SessionState::Finished);
    let result = session.result().copied().unwrap();
    assert!(result.completed);
    assert_eq!(result.elapsed_seconds, 2);
    assert_eq!(result.accuracy_percent, 100.0);
    assert_eq!(driver.sink().sessions(), 1);
    assert!(!driver.clock_scheduler().running);
}

#[test]
fn headless_correction_keeps_mistake() {
    let mut driver = practice_driver("cat");
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    for ev in [key('c'), key('a'), key('p'), backspace(), key('t')] {
        tx.send(ev).unwrap();
    }

    pump(&mut driver, &runner, 100);

    let session = driver.session();
    assert_eq!(session.state(), SessionState::Finished);
    assert_eq!(session.mistakes(), 1);
    let result = session.result().copied().unwrap();
    assert!((result.accuracy_percent - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn headless_race_against_perfect_opponent() {
    let options = SessionOptions {
        opponent_seed: Some(1),
        ..SessionOptions::race(OpponentConfig::new(60.0, 100.0))
    };
    let mut driver = SessionDriver::new(
        TypingSession::from_text(&"abcde".repeat(5), options).unwrap(),
        ManualScheduler::default(),
        ManualScheduler::default(),
        ProfileSummary::new(),
    );

    assert_eq!(driver.edit(|s| s.write('a')), Transition::Started);

    // Five seconds of simulated time: 5 clock ticks, 25 opponent keystrokes.
    let mut last = Transition::Ignored;
    for second in 0..5 {
        for _ in 0..5 {
            last = driver.on_event(&SessionEvent::OpponentTick(0));
        }
        if second < 4 {
            driver.on_event(&SessionEvent::ClockTick(0));
        }
    }
    assert_eq!(last, Transition::OpponentFinished);

    let opponent = driver.session().opponent_render_state().unwrap();
    assert_eq!(opponent.target_index, 25);
    assert_eq!(opponent.slips, 0);
    assert!(!driver.clock_scheduler().running);
    assert!(!driver.opponent_scheduler().running);

    // The human can still complete the text; elapsed stays frozen.
    let result = assert_matches!(
        driver.edit(|s| s.update(&"abcde".repeat(5))),
        Transition::Finished(r) => r
    );
    assert_eq!(result.elapsed_seconds, 4);
    assert_eq!(driver.sink().sessions(), 1);
}
