//! Statement layout detection from header markers.

use tracing::debug;

use crate::models::{DetectedFormat, Dialect};

/// Header phrases that identify a dialect. Matching is case-insensitive
/// substring search over the header window.
pub fn markers(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::CardTypeSummary => &["summary by card type", "amounts submitted", "chargebacks/reversals"],
        Dialect::PlanSummary => &["plan summary", "plan code", "interchange/program fees"],
    }
}

/// Classifies the leading lines of a document.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    priority: Vec<Dialect>,
}

impl FormatDetector {
    /// Create a detector. When markers of several dialects match, the one
    /// listed first in `priority` wins.
    pub fn new(priority: Vec<Dialect>) -> Self {
        Self { priority }
    }

    /// Dialect preference order.
    pub fn priority(&self) -> &[Dialect] {
        &self.priority
    }

    /// Every dialect whose markers appear in the header, in priority order.
    pub fn matching(&self, header: &[String]) -> Vec<Dialect> {
        let text = header.join("\n").to_lowercase();
        self.priority
            .iter()
            .copied()
            .filter(|dialect| markers(*dialect).iter().any(|marker| text.contains(marker)))
            .collect()
    }

    /// Classify a header window.
    pub fn detect(&self, header: &[String]) -> DetectedFormat {
        let matching = self.matching(header);
        if matching.len() > 1 {
            debug!("Markers of {:?} all matched; using {}", matching, matching[0]);
        }
        match matching.first() {
            Some(dialect) => DetectedFormat::Known { dialect: *dialect },
            None => DetectedFormat::Unknown { inferred: None },
        }
    }
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new(vec![Dialect::PlanSummary, Dialect::CardTypeSummary])
    }
}
