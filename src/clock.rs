//! One-second-granularity round timer.
//!
//! The clock does not own a thread; whoever drives the session calls
//! [`RoundClock::tick`] once per second while it is running.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    #[default]
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundClock {
    state: ClockState,
    elapsed_secs: u64,
}

impl RoundClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stopped -> Running. Elapsed restarts from zero.
    pub fn start(&mut self) {
        self.elapsed_secs = 0;
        self.state = ClockState::Running;
    }

    /// Running -> Stopped, freezing elapsed time.
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds one second if running. Returns whether the tick counted.
    pub fn tick(&mut self) -> bool {
        if self.state == ClockState::Running {
            self.elapsed_secs += 1;
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }
}

/// `mm:ss`, minutes not wrapped at the hour.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock_is_stopped() {
        let clock = RoundClock::new();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.elapsed_secs(), 0);
    }

    #[test]
    fn test_ticks_only_count_while_running() {
        let mut clock = RoundClock::new();
        assert!(!clock.tick());
        assert_eq!(clock.elapsed_secs(), 0);

        clock.start();
        assert!(clock.tick());
        assert!(clock.tick());
        assert_eq!(clock.elapsed_secs(), 2);

        clock.stop();
        assert!(!clock.tick());
        assert_eq!(clock.elapsed_secs(), 2);
    }

    #[test]
    fn test_start_resets_elapsed() {
        let mut clock = RoundClock::new();
        clock.start();
        clock.tick();
        clock.stop();
        clock.start();
        assert_eq!(clock.elapsed_secs(), 0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_reset() {
        let mut clock = RoundClock::new();
        clock.start();
        clock.tick();
        clock.reset();
        assert_eq!(clock, RoundClock::new());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
    }
}
