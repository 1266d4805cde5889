//! One typing round: target, live input, clock and (in races) the opponent.
//!
//! `TypingSession` is a plain state machine. It never spawns timers itself;
//! the driver in [`crate::runtime`] feeds it keystroke edits and clock and
//! opponent ticks, one at a time, and reacts to the returned [`Transition`].

use crate::clock::RoundClock;
use crate::diff::{classify, Classification};
use crate::error::InvalidTargetError;
use crate::metrics::{compute_accuracy, compute_wpm, correct_count};
use crate::opponent::{OpponentConfig, OpponentSimulator, OpponentStep};
use crate::target::Target;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::time::SystemTime;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// untimed practice; check your text when you think it matches
    #[default]
    Practice,
    /// timed exercise that can be finished early
    Exercise,
    /// race against a simulated opponent
    Race,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaceOutcome {
    #[default]
    Undecided,
    HumanWon,
    OpponentWon,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionOptions {
    pub mode: Mode,
    /// Used only in race mode; defaults apply when absent.
    pub opponent: Option<OpponentConfig>,
    pub opponent_seed: Option<u64>,
    pub time_limit_secs: Option<u64>,
}

impl SessionOptions {
    pub fn practice() -> Self {
        Self::default()
    }

    pub fn race(opponent: OpponentConfig) -> Self {
        Self {
            mode: Mode::Race,
            opponent: Some(opponent),
            ..Self::default()
        }
    }
}

/// Final statistics of a round. Produced once per session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionResult {
    pub elapsed_seconds: u64,
    pub words_per_minute: f64,
    pub accuracy_percent: f64,
    pub completed: bool,
}

/// What a mutation did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Nothing changed (finished session, tick while stopped, no-op edit).
    Ignored,
    /// Idle -> Active on the first non-empty input.
    Started,
    Updated,
    /// The opponent typed its last character; both schedules should stop.
    OpponentFinished,
    Finished(SessionResult),
}

/// Read-only snapshot for painting the human's lane.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub correct_range: Range<usize>,
    pub mismatch_range: Range<usize>,
    pub pending_range: Range<usize>,
    pub cursor: usize,
    pub elapsed_seconds: u64,
    pub seconds_remaining: Option<u64>,
    pub live_wpm: f64,
    pub live_accuracy_percent: f64,
    pub mistakes: usize,
    pub state: SessionState,
}

/// Read-only snapshot of the opponent's lane.
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentRenderState {
    pub correct_range: Range<usize>,
    pub mismatch_range: Range<usize>,
    pub pending_range: Range<usize>,
    pub target_index: usize,
    pub slips: usize,
    pub finished: bool,
}

#[derive(Debug)]
pub struct TypingSession {
    mode: Mode,
    target: Target,
    typed: Vec<char>,
    cursor: usize,
    state: SessionState,
    mistakes: usize,
    flagged: HashSet<(usize, char)>,
    started_at: Option<SystemTime>,
    clock: RoundClock,
    time_limit_secs: Option<u64>,
    opponent: Option<OpponentSimulator>,
    race_outcome: RaceOutcome,
    result: Option<SessionResult>,
}

impl TypingSession {
    pub fn new(target: Target, options: SessionOptions) -> Self {
        let opponent = (options.mode == Mode::Race).then(|| {
            let config = options.opponent.unwrap_or_default();
            match options.opponent_seed {
                Some(seed) => OpponentSimulator::seeded(&target, config, seed),
                None => OpponentSimulator::new(&target, config),
            }
        });

        Self {
            mode: options.mode,
            target,
            typed: Vec::new(),
            cursor: 0,
            state: SessionState::Idle,
            mistakes: 0,
            flagged: HashSet::new(),
            started_at: None,
            clock: RoundClock::new(),
            time_limit_secs: options.time_limit_secs.filter(|secs| *secs > 0),
            opponent,
            race_outcome: RaceOutcome::Undecided,
            result: None,
        }
    }

    /// Normalizes `raw` into a target first; blank text is rejected.
    pub fn from_text(raw: &str, options: SessionOptions) -> Result<Self, InvalidTargetError> {
        Ok(Self::new(Target::new(raw)?, options))
    }

    /// Replaces the whole input, leaving the cursor at its end.
    pub fn update(&mut self, typed: &str) -> Transition {
        let typed: Vec<char> = typed.chars().collect();
        let cursor = typed.len();
        self.apply(typed, cursor)
    }

    /// Inserts `c` at the cursor.
    pub fn write(&mut self, c: char) -> Transition {
        if self.is_finished() {
            return Transition::Ignored;
        }
        let mut typed = self.typed.clone();
        typed.insert(self.cursor, c);
        self.apply(typed, self.cursor + 1)
    }

    /// Removes the character before the cursor.
    pub fn backspace(&mut self) -> Transition {
        if self.is_finished() || self.cursor == 0 {
            return Transition::Ignored;
        }
        let mut typed = self.typed.clone();
        typed.remove(self.cursor - 1);
        self.apply(typed, self.cursor - 1)
    }

    /// Removes the character under the cursor.
    pub fn delete(&mut self) -> Transition {
        if self.is_finished() || self.cursor >= self.typed.len() {
            return Transition::Ignored;
        }
        let mut typed = self.typed.clone();
        typed.remove(self.cursor);
        self.apply(typed, self.cursor)
    }

    pub fn cursor_left(&mut self) {
        if !self.is_finished() {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    pub fn cursor_right(&mut self) {
        if !self.is_finished() && self.cursor < self.typed.len() {
            self.cursor += 1;
        }
    }

    fn apply(&mut self, typed: Vec<char>, cursor: usize) -> Transition {
        if self.is_finished() {
            return Transition::Ignored;
        }

        let started = self.state == SessionState::Idle && !typed.is_empty();
        if started {
            self.state = SessionState::Active;
            self.started_at = Some(SystemTime::now());
            self.clock.start();
            debug!("round started ({} mode, {} chars)", self.mode, self.target.len());
        }

        self.cursor = cursor.min(typed.len());
        self.typed = typed;
        self.record_mistakes();

        if self.typed == self.target.chars() {
            return Transition::Finished(self.finish_round());
        }

        if started {
            Transition::Started
        } else {
            Transition::Updated
        }
    }

    fn record_mistakes(&mut self) {
        for (idx, (typed, expected)) in self.typed.iter().zip(self.target.chars()).enumerate() {
            if typed != expected && self.flagged.insert((idx, *typed)) {
                self.mistakes += 1;
            }
        }
    }

    /// One second of round time. Ends the round when the time limit is hit.
    pub fn tick_clock(&mut self) -> Transition {
        if self.state != SessionState::Active || !self.clock.tick() {
            return Transition::Ignored;
        }

        match self.time_limit_secs {
            Some(limit) if self.clock.elapsed_secs() >= limit => {
                debug!("time limit of {limit}s reached");
                Transition::Finished(self.finish_round())
            }
            _ => Transition::Updated,
        }
    }

    /// One opponent keystroke. Only advances while the human's clock runs.
    pub fn tick_opponent(&mut self) -> Transition {
        if self.state != SessionState::Active || !self.clock.is_running() {
            return Transition::Ignored;
        }
        let Some(opponent) = self.opponent.as_mut() else {
            return Transition::Ignored;
        };

        match opponent.tick() {
            OpponentStep::Typed { .. } => Transition::Updated,
            OpponentStep::Exhausted => Transition::Ignored,
            OpponentStep::Finished { .. } => {
                if self.race_outcome == RaceOutcome::Undecided {
                    self.race_outcome = RaceOutcome::OpponentWon;
                }
                self.clock.stop();
                info!(
                    "opponent finished the target after {}s",
                    self.clock.elapsed_secs()
                );
                Transition::OpponentFinished
            }
        }
    }

    /// Ends the round now, whatever its state. `None` if it already ended.
    pub fn finish(&mut self) -> Option<SessionResult> {
        if self.is_finished() {
            return None;
        }
        debug!("round finished early by caller");
        Some(self.finish_round())
    }

    fn finish_round(&mut self) -> SessionResult {
        let completed = self.check();
        self.state = SessionState::Finished;
        self.clock.stop();

        if completed && self.race_outcome == RaceOutcome::Undecided && self.opponent.is_some() {
            self.race_outcome = RaceOutcome::HumanWon;
        }

        let result = SessionResult {
            elapsed_seconds: self.clock.elapsed_secs(),
            words_per_minute: self.live_wpm(),
            accuracy_percent: self.live_accuracy(),
            completed,
        };
        info!(
            "round finished: {:.1} wpm, {:.1}% acc, {}s, completed={}",
            result.words_per_minute, result.accuracy_percent, result.elapsed_seconds, completed
        );
        self.result = Some(result);
        result
    }

    /// Exact equality of input and target.
    pub fn check(&self) -> bool {
        self.typed == self.target.chars()
    }

    fn live_wpm(&self) -> f64 {
        compute_wpm(self.typed.len(), self.clock.elapsed_secs())
    }

    fn live_accuracy(&self) -> f64 {
        let correct = correct_count(self.typed.len(), self.target.len(), self.mistakes);
        compute_accuracy(self.typed.len(), correct)
    }

    pub fn render_state(&self) -> RenderState {
        let Classification {
            correct,
            mismatch,
            pending,
        } = classify(&self.typed, self.target.chars());

        RenderState {
            correct_range: correct,
            mismatch_range: mismatch,
            pending_range: pending,
            cursor: self.cursor,
            elapsed_seconds: self.clock.elapsed_secs(),
            seconds_remaining: self.seconds_remaining(),
            live_wpm: self.live_wpm(),
            live_accuracy_percent: self.live_accuracy(),
            mistakes: self.mistakes,
            state: self.state,
        }
    }

    pub fn opponent_render_state(&self) -> Option<OpponentRenderState> {
        self.opponent.as_ref().map(|opponent| {
            let c = classify(opponent.simulated_typed(), self.target.chars());
            OpponentRenderState {
                correct_range: c.correct,
                mismatch_range: c.mismatch,
                pending_range: c.pending,
                target_index: opponent.target_index(),
                slips: opponent.slips(),
                finished: opponent.is_exhausted(),
            }
        })
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.time_limit_secs
            .map(|limit| limit.saturating_sub(self.clock.elapsed_secs()))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn typed_string(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn has_started(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn mistakes(&self) -> usize {
        self.mistakes
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.clock.elapsed_secs()
    }

    pub fn clock_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn is_race(&self) -> bool {
        self.opponent.is_some()
    }

    pub fn opponent(&self) -> Option<&OpponentSimulator> {
        self.opponent.as_ref()
    }

    pub fn race_outcome(&self) -> RaceOutcome {
        self.race_outcome
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }
}
