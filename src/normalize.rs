//! Canonical names for raw API labels.
//!
//! The API reports the same coin, miner or GPU model under labels that differ
//! only in punctuation or case. Canonical names are the aggregation key.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Anything that is not a word character, whitespace or a letter.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\p{L}]").expect("invalid name pattern"));

/// Replace each disallowed character with `_`, then upper-case.
///
/// ```
/// assert_eq!(hivestats::normalize::normalize("RTX 3080 Ti!"), "RTX 3080 TI_");
/// ```
pub fn normalize(raw: &str) -> String {
    DISALLOWED.replace_all(raw, "_").to_uppercase()
}

/// Normalizes names and filters out denylisted canonical names.
#[derive(Debug, Clone)]
pub struct Normalizer {
    denylist: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DENYLIST.iter().copied())
    }
}

impl Normalizer {
    /// Build a normalizer from canonical names to drop.
    ///
    /// Entries are normalized on the way in, so `"smh 永州"` and
    /// `"SMH 永州"` deny the same thing.
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denylist: denylist.into_iter().map(|s| normalize(s.as_ref())).collect(),
        }
    }

    pub fn is_denied(&self, canonical: &str) -> bool {
        self.denylist.contains(canonical)
    }

    /// Canonical name for `raw`, or `None` if it is denylisted.
    pub fn canonical(&self, raw: &str) -> Option<String> {
        let name = normalize(raw);
        if self.is_denied(&name) {
            None
        } else {
            Some(name)
        }
    }
}
