use crate::error::InvalidTargetError;
use cgisf_lib::cgisf;
use include_dir::{include_dir, Dir};
use itertools::Itertools;
use log::debug;
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use std::fmt;

static TEXT_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/texts");

/// Fixed reference text for one round.
///
/// Built only through [`Target::new`], which folds typographic punctuation to
/// ASCII and collapses whitespace, so a `Target` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    text: String,
    chars: Vec<char>,
}

impl Target {
    pub fn new(raw: &str) -> Result<Self, InvalidTargetError> {
        let text = normalize(raw);
        if text.is_empty() {
            return Err(InvalidTargetError);
        }
        let chars = text.chars().collect();
        Ok(Self { text, chars })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Length in characters, not bytes.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Folds curly quotes and ellipses to ASCII, collapses whitespace runs to a
/// single space and trims both ends.
pub fn normalize(raw: &str) -> String {
    let folded = raw
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => "'".to_string(),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => "\"".to_string(),
            '\u{2026}' => "...".to_string(),
            other => other.to_string(),
        })
        .collect::<String>();

    folded.split_whitespace().join(" ")
}

/// Supplies raw text for the next round. Normalization is the caller's job.
pub trait TargetProvider {
    fn next_text(&self) -> String;
}

#[derive(Deserialize, Clone, Debug)]
struct TextLibrary {
    name: String,
    texts: Vec<String>,
}

fn read_library(file_name: &str) -> Option<TextLibrary> {
    let file = TEXT_DIR.get_file(file_name)?;
    let contents = file.contents_utf8()?;
    serde_json::from_str(contents).ok()
}

/// Picks a random paragraph from the built-in text library.
#[derive(Debug, Clone)]
pub struct LibraryProvider {
    texts: Vec<String>,
}

impl LibraryProvider {
    pub fn new() -> Self {
        let texts = read_library("library.json")
            .map(|lib| {
                debug!("loaded text library '{}' ({} texts)", lib.name, lib.texts.len());
                lib.texts
            })
            .unwrap_or_default();
        Self { texts }
    }

    pub fn with_texts(texts: Vec<String>) -> Self {
        Self { texts }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl Default for LibraryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetProvider for LibraryProvider {
    fn next_text(&self) -> String {
        let mut rng = rand::thread_rng();
        self.texts.choose(&mut rng).cloned().unwrap_or_default()
    }
}

/// Generates nonsense-but-grammatical English sentences.
#[derive(Debug, Clone, Copy)]
pub struct SentenceProvider {
    count: usize,
}

impl SentenceProvider {
    pub fn new(count: usize) -> Self {
        Self {
            count: count.max(1),
        }
    }
}

impl TargetProvider for SentenceProvider {
    fn next_text(&self) -> String {
        let rng = &mut rand::thread_rng();
        (0..self.count)
            .map(|_| {
                cgisf(
                    rng.gen_range(1..3),
                    rng.gen_range(1..3),
                    rng.gen_range(1..5),
                    rng.gen_bool(0.5),
                    rng.gen_range(1..3),
                    rng.gen_bool(0.5),
                )
            })
            .join(" ")
    }
}

/// Where rounds get their text: a provider, optionally overridden by custom
/// text for the next round only.
pub struct TargetSource {
    provider: Box<dyn TargetProvider>,
    custom: Option<String>,
}

impl TargetSource {
    pub fn new(provider: Box<dyn TargetProvider>) -> Self {
        Self {
            provider,
            custom: None,
        }
    }

    /// Substitutes `text` for the provider's output on the next round.
    pub fn set_custom_text(&mut self, text: impl Into<String>) {
        self.custom = Some(text.into());
    }

    pub fn has_custom_text(&self) -> bool {
        self.custom.is_some()
    }

    pub fn next_target(&mut self) -> Result<Target, InvalidTargetError> {
        match self.custom.take() {
            Some(text) => Target::new(&text),
            None => Target::new(&self.provider.next_text()),
        }
    }
}

impl fmt::Debug for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSource")
            .field("custom", &self.custom)
            .finish_non_exhaustive()
    }
}
