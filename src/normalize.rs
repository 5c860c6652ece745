//! Linguistic normalization for relevance matching.
//!
//! Literal substring matching of a keyword against a headline under-matches
//! badly in inflected languages: a watch for "новый закон" should catch
//! "Новые законы приняты" even though no token matches byte-for-byte. The
//! [`Normalizer`] maps free text to a canonical lemma-based form so the
//! relevance filter can compare canonical strings instead.
//!
//! Normalization is: lower-case, tokenize on whitespace, trim leading and
//! trailing non-alphanumeric characters from each token, reduce each token
//! to its Snowball stem, join with single spaces. The mapping is pure and
//! deterministic, and idempotent: normalizing an already-normalized string
//! returns it unchanged.

use rust_stemmers::{Algorithm, Stemmer};

/// Stemming language for the morphological analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Language {
    /// Russian (default; the target language of the watched news).
    Ru,
    /// English.
    En,
}

impl Language {
    fn algorithm(self) -> Algorithm {
        match self {
            Language::Ru => Algorithm::Russian,
            Language::En => Algorithm::English,
        }
    }
}

/// Maps free text to a canonical lemma-based form.
///
/// Holds only a read-only stemmer, so it is cheap to share and safe to call
/// from concurrent tasks.
pub struct Normalizer {
    stemmer: Stemmer,
}

impl Normalizer {
    pub fn new(language: Language) -> Self {
        Self {
            stemmer: Stemmer::create(language.algorithm()),
        }
    }

    /// Canonicalize `text` for containment comparison.
    pub fn normalize(&self, text: &str) -> String {
        let mut lemmas: Vec<String> = Vec::new();
        for token in text.split_whitespace() {
            let trimmed: &str = token.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.is_empty() {
                continue;
            }
            let lowered = trimmed.to_lowercase();
            lemmas.push(self.stem_fixpoint(lowered));
        }
        lemmas.join(" ")
    }

    /// Stem until the output is stable. A Snowball stem is not always a
    /// fixed point of the stemmer (Russian "приняты" stems to "принят",
    /// which stems again to "прин"), and stems only ever shrink, so the
    /// loop terminates.
    fn stem_fixpoint(&self, token: String) -> String {
        let mut current = token;
        loop {
            let stemmed = self.stemmer.stem(&current).into_owned();
            if stemmed == current {
                return current;
            }
            current = stemmed;
        }
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}
