use std::collections::HashSet;

use tracing::warn;

use crate::labels::Signature;
use crate::types::Silence;

/// Keep the silences whose matcher signature equals `target`
///
/// This is exact set equality: a silence with extra matchers, or with fewer,
/// is never selected. Silences are only read, never changed. When the same ID
/// appears more than once the first occurrence is kept. Silences without an ID
/// cannot be addressed and are skipped.
pub fn select_matching(target: &Signature, silences: Vec<Silence>) -> Vec<Silence> {
    let mut seen = HashSet::new();

    silences
        .into_iter()
        .filter(|silence| silence.signature() == *target)
        .filter(|silence| {
            if silence.id().is_empty() {
                warn!(silence = %silence, "Skipping matching silence without an ID");
                return false;
            }
            seen.insert(silence.id().to_string())
        })
        .collect()
}
