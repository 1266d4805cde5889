use crate::util::mean;

/// Receives the final statistics of every finished round.
pub trait ProfileSink {
    fn record_result(&mut self, words_per_minute: f64, accuracy_percent: f64);
}

/// In-memory running averages over the rounds of one program run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSummary {
    wpms: Vec<f64>,
    accuracies: Vec<f64>,
}

impl ProfileSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> usize {
        self.wpms.len()
    }

    pub fn average_wpm(&self) -> f64 {
        mean(&self.wpms).unwrap_or(0.0)
    }

    pub fn average_accuracy(&self) -> f64 {
        mean(&self.accuracies).unwrap_or(0.0)
    }

    pub fn best_wpm(&self) -> Option<f64> {
        self.wpms.iter().copied().reduce(f64::max)
    }

    /// One-line summary for the results view.
    pub fn describe(&self) -> String {
        match self.sessions() {
            0 => "no rounds recorded yet".to_string(),
            n => format!(
                "{} round{}   avg {:.1} wpm   best {:.1} wpm   avg {:.1}% acc",
                n,
                if n == 1 { "" } else { "s" },
                self.average_wpm(),
                self.best_wpm().unwrap_or(0.0),
                self.average_accuracy()
            ),
        }
    }
}

impl ProfileSink for ProfileSummary {
    fn record_result(&mut self, words_per_minute: f64, accuracy_percent: f64) {
        self.wpms.push(words_per_minute);
        self.accuracies.push(accuracy_percent);
    }
}

impl<S: ProfileSink + ?Sized> ProfileSink for &mut S {
    fn record_result(&mut self, words_per_minute: f64, accuracy_percent: f64) {
        (**self).record_result(words_per_minute, accuracy_percent)
    }
}
