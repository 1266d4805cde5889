//! Simulated race opponent.
//!
//! The opponent "types" the target one character per interval on its own
//! schedule. Each keystroke is a Bernoulli trial against the configured
//! accuracy; a failed trial shows [`SLIP_CHAR`] in place of the expected
//! character until the opponent's next keystroke repairs it.

use crate::metrics::CHARS_PER_WORD;
use crate::target::Target;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

/// Shown in the opponent's lane where it mistyped.
pub const SLIP_CHAR: char = '_';

/// Slowest and fastest opponent the scheduler can keep time for.
pub const MIN_SPEED_WPM: f64 = 1.0;
pub const MAX_SPEED_WPM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentConfig {
    pub speed_wpm: f64,
    pub accuracy_percent: f64,
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            speed_wpm: 20.0,
            accuracy_percent: 90.0,
        }
    }
}

impl OpponentConfig {
    pub fn new(speed_wpm: f64, accuracy_percent: f64) -> Self {
        Self {
            speed_wpm: if speed_wpm.is_finite() && speed_wpm > 0.0 {
                speed_wpm.clamp(MIN_SPEED_WPM, MAX_SPEED_WPM)
            } else {
                Self::default().speed_wpm
            },
            accuracy_percent: if accuracy_percent.is_nan() {
                Self::default().accuracy_percent
            } else {
                accuracy_percent.clamp(0.0, 100.0)
            },
        }
    }

    pub fn seconds_per_char(&self) -> f64 {
        60.0 / (self.speed_wpm * CHARS_PER_WORD)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.seconds_per_char())
    }

    fn slip_probability(&self) -> f64 {
        (1.0 - self.accuracy_percent / 100.0).clamp(0.0, 1.0)
    }
}

/// Result of one opponent keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentStep {
    Typed { slipped: bool },
    /// The keystroke that reached the end of the target.
    Finished { slipped: bool },
    /// Target already exhausted; nothing happened.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct OpponentSimulator {
    config: OpponentConfig,
    target: Vec<char>,
    target_index: usize,
    simulated_typed: Vec<char>,
    last_slipped: bool,
    slips: usize,
    rng: StdRng,
}

impl OpponentSimulator {
    pub fn new(target: &Target, config: OpponentConfig) -> Self {
        Self::with_rng(target, config, StdRng::from_entropy())
    }

    pub fn seeded(target: &Target, config: OpponentConfig, seed: u64) -> Self {
        Self::with_rng(target, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(target: &Target, config: OpponentConfig, rng: StdRng) -> Self {
        Self {
            config,
            target: target.chars().to_vec(),
            target_index: 0,
            simulated_typed: Vec::with_capacity(target.len()),
            last_slipped: false,
            slips: 0,
            rng,
        }
    }

    pub fn tick(&mut self) -> OpponentStep {
        if self.is_exhausted() {
            return OpponentStep::Exhausted;
        }

        if self.last_slipped {
            if let Some(last) = self.simulated_typed.last_mut() {
                *last = self.target[self.target_index - 1];
            }
        }

        let expected = self.target[self.target_index];
        let slipped = self.rng.gen_bool(self.config.slip_probability());
        self.simulated_typed
            .push(if slipped { SLIP_CHAR } else { expected });
        self.last_slipped = slipped;
        if slipped {
            self.slips += 1;
        }
        self.target_index += 1;

        if self.is_exhausted() {
            debug!("opponent reached end of target with {} slips", self.slips);
            OpponentStep::Finished { slipped }
        } else {
            OpponentStep::Typed { slipped }
        }
    }

    /// Runs as many keystrokes as fit in `secs` of simulated time.
    pub fn advance_by(&mut self, secs: f64) -> usize {
        let steps = (secs / self.config.seconds_per_char() + 1e-9).floor() as usize;
        (0..steps)
            .take_while(|_| !matches!(self.tick(), OpponentStep::Exhausted))
            .count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.target_index >= self.target.len()
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn simulated_typed(&self) -> &[char] {
        &self.simulated_typed
    }

    /// Slips shown over the opponent's whole run, repaired or not.
    pub fn slips(&self) -> usize {
        self.slips
    }

    pub fn config(&self) -> OpponentConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_of_len(n: usize) -> Target {
        Target::new(&"abcde".repeat(n / 5)).unwrap()
    }

    #[test]
    fn test_default_config_is_low_difficulty() {
        let config = OpponentConfig::default();
        assert_eq!(config.speed_wpm, 20.0);
        assert_eq!(config.accuracy_percent, 90.0);
        assert!((config.seconds_per_char() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(OpponentConfig::new(0.0, 50.0).speed_wpm, 20.0);
        assert_eq!(OpponentConfig::new(-3.0, 50.0).speed_wpm, 20.0);
        assert_eq!(OpponentConfig::new(40.0, 150.0).accuracy_percent, 100.0);
        assert_eq!(OpponentConfig::new(40.0, -1.0).accuracy_percent, 0.0);
        assert_eq!(OpponentConfig::new(f64::NAN, f64::NAN), OpponentConfig::default());
    }

    #[test]
    fn test_extreme_speeds_are_clamped_to_a_usable_interval() {
        let crawl = OpponentConfig::new(1e-20, 90.0);
        assert_eq!(crawl.speed_wpm, MIN_SPEED_WPM);
        assert_eq!(crawl.interval(), Duration::from_secs(12));

        let blur = OpponentConfig::new(1e12, 90.0);
        assert_eq!(blur.speed_wpm, MAX_SPEED_WPM);
        assert!((blur.seconds_per_char() - 0.012).abs() < 1e-12);
        assert!(blur.interval() > Duration::from_millis(11));
    }

    #[test]
    fn test_perfect_opponent_finishes_in_five_seconds() {
        let target = target_of_len(25);
        let mut opp = OpponentSimulator::seeded(&target, OpponentConfig::new(60.0, 100.0), 7);

        assert_eq!(opp.config().interval(), Duration::from_millis(200));
        assert_eq!(opp.advance_by(5.0), 25);
        assert_eq!(opp.target_index(), 25);
        assert!(opp.is_exhausted());
        assert_eq!(opp.slips(), 0);
        assert!(!opp.simulated_typed().contains(&SLIP_CHAR));
        assert_eq!(opp.simulated_typed(), target.chars());
    }

    #[test]
    fn test_perfect_opponent_is_not_done_early() {
        let target = target_of_len(25);
        let mut opp = OpponentSimulator::seeded(&target, OpponentConfig::new(60.0, 100.0), 7);
        assert_eq!(opp.advance_by(4.9), 24);
        assert!(!opp.is_exhausted());
    }

    #[test]
    fn test_last_keystroke_reports_finished_then_exhausted() {
        let target = Target::new("ab").unwrap();
        let mut opp = OpponentSimulator::seeded(&target, OpponentConfig::new(60.0, 100.0), 1);
        assert_eq!(opp.tick(), OpponentStep::Typed { slipped: false });
        assert_eq!(opp.tick(), OpponentStep::Finished { slipped: false });
        assert_eq!(opp.tick(), OpponentStep::Exhausted);
        assert_eq!(opp.target_index(), 2);
    }

    #[test]
    fn test_zero_accuracy_slips_every_key_and_repairs_previous() {
        let target = Target::new("abc").unwrap();
        let mut opp = OpponentSimulator::seeded(&target, OpponentConfig::new(60.0, 0.0), 3);

        opp.tick();
        assert_eq!(opp.simulated_typed(), &['_']);
        opp.tick();
        assert_eq!(opp.simulated_typed(), &['a', '_']);
        opp.tick();
        assert_eq!(opp.simulated_typed(), &['a', 'b', '_']);
        assert_eq!(opp.slips(), 3);
    }

    #[test]
    fn test_same_seed_same_run() {
        let target = target_of_len(50);
        let config = OpponentConfig::new(80.0, 70.0);
        let mut a = OpponentSimulator::seeded(&target, config, 42);
        let mut b = OpponentSimulator::seeded(&target, config, 42);
        a.advance_by(100.0);
        b.advance_by(100.0);
        assert_eq!(a.simulated_typed(), b.simulated_typed());
        assert_eq!(a.slips(), b.slips());
    }
}
