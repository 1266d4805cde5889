pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Visible stand-in for a space typed in the wrong place.
pub fn visible_char(c: char) -> char {
    match c {
        ' ' => '·',
        c => c,
    }
}
