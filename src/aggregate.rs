//! Turns one fetched payload into a cleaned snapshot.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::models::{Category, CategoryRecords, CleanedSnapshot, NormalizedRecord, RawPayload};
use crate::normalize::Normalizer;

pub struct Aggregator {
    normalizer: Normalizer,
}

impl Aggregator {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Group entries by canonical name within each category.
    ///
    /// Amounts are converted to percentages and summed when several raw names
    /// collapse onto one canonical name. Every record is stamped with `at`.
    /// Known categories missing from the payload come out empty; unknown
    /// payload keys are aggregated under their own key. Amounts that are not
    /// finite after conversion or summing are dropped.
    pub fn aggregate(&self, payload: &RawPayload, at: NaiveDateTime) -> CleanedSnapshot {
        let mut cleaned = CleanedSnapshot::default();
        for category in Category::ALL {
            cleaned.0.insert(category.as_str().to_string(), CategoryRecords::new());
        }

        for (key, entries) in &payload.0 {
            let records = cleaned.0.entry(key.clone()).or_default();
            for entry in entries {
                let Some(name) = self.normalizer.canonical(&entry.name) else {
                    debug!(category = %key, name = %entry.name, "dropping denylisted entry");
                    continue;
                };
                let amount = entry.amount * 100.0;
                if !amount.is_finite() {
                    warn!(
                        category = %key,
                        name = %entry.name,
                        amount = entry.amount,
                        "dropping non-finite amount"
                    );
                    continue;
                }
                records
                    .entry(name.clone())
                    .and_modify(|r| r.amount += amount)
                    .or_insert(NormalizedRecord {
                        name,
                        amount,
                        snapshot: at,
                    });
            }
            // JSON has no representation for a sum that overflowed.
            records.retain(|name, r| {
                let finite = r.amount.is_finite();
                if !finite {
                    warn!(category = %key, %name, "dropping record whose summed amount overflowed");
                }
                finite
            });
        }

        cleaned
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}
