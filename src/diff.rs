use std::ops::Range;

/// Per-character classification of a target against typed input.
///
/// The three ranges are contiguous and cover `0..target_len`. Typed
/// characters beyond the end of the target are not represented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub correct: Range<usize>,
    pub mismatch: Range<usize>,
    pub pending: Range<usize>,
}

impl Classification {
    pub fn correct_len(&self) -> usize {
        self.correct.len()
    }

    pub fn has_mismatch(&self) -> bool {
        !self.mismatch.is_empty()
    }
}

/// Length of the longest common prefix of `typed` and `target`.
pub fn first_mismatch_index(typed: &[char], target: &[char]) -> usize {
    typed
        .iter()
        .zip(target)
        .take_while(|(t, e)| t == e)
        .count()
}

pub fn classify(typed: &[char], target: &[char]) -> Classification {
    let correct_end = first_mismatch_index(typed, target).min(target.len());
    let mismatch_end = typed.len().min(target.len());

    Classification {
        correct: 0..correct_end,
        mismatch: correct_end..mismatch_end,
        pending: mismatch_end..target.len(),
    }
}
