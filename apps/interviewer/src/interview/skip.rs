//! Skip Detector — recognises a candidate asking to move past a question.
//!
//! Pluggable like the reply classifier: the controller holds an
//! `Arc<dyn SkipDetector>`, and `PhraseSkipDetector` is the default.

/// Phrases that mark an answer as an explicit skip or evasion.
/// Matched case-insensitively as substrings; no stemming.
pub const SKIP_PHRASES: &[&str] = &[
    "следующий вопрос",
    "давайте дальше",
    "не знаю",
    "пропустить",
    "далее",
    "next",
    "skip",
    "don't know",
    "don’t know",
    "let's continue",
];

pub trait SkipDetector: Send + Sync {
    fn is_skip(&self, answer: &str) -> bool;
}

/// Substring match against a fixed phrase list.
pub struct PhraseSkipDetector {
    phrases: Vec<String>,
}

impl PhraseSkipDetector {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl Default for PhraseSkipDetector {
    fn default() -> Self {
        Self::new(SKIP_PHRASES)
    }
}

impl SkipDetector for PhraseSkipDetector {
    fn is_skip(&self, answer: &str) -> bool {
        let answer = answer.to_lowercase();
        self.phrases.iter().any(|p| answer.contains(p.as_str()))
    }
}
