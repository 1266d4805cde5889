//! Live and final typing statistics.
//!
//! Accuracy is charged against the session's cumulative mistake counter, so a
//! mistake that was later corrected keeps counting against the round.

/// Characters per standard word.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Elapsed time below one second is treated as one second.
const MIN_ELAPSED_MINUTES: f64 = 1.0 / 60.0;

pub fn compute_wpm(typed_len: usize, elapsed_secs: u64) -> f64 {
    let minutes = (elapsed_secs as f64 / 60.0).max(MIN_ELAPSED_MINUTES);
    (typed_len as f64 / CHARS_PER_WORD) / minutes
}

/// Percentage in `[0, 100]`; zero when nothing has been typed.
pub fn compute_accuracy(typed_len: usize, correct_count: usize) -> f64 {
    if typed_len == 0 {
        return 0.0;
    }
    (100.0 * correct_count.min(typed_len) as f64 / typed_len as f64).clamp(0.0, 100.0)
}

/// `min(typed, target) - mistakes`, floored at zero.
pub fn correct_count(typed_len: usize, target_len: usize, mistakes: usize) -> usize {
    typed_len.min(target_len).saturating_sub(mistakes)
}
