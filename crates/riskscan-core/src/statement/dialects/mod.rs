//! Dialect-specific field extractors.
//!
//! Each dialect walks the reconstructed lines with its own section state
//! machine, then resolves every field through an ordered strategy list.

mod card_type;
mod plan_summary;
mod tally;

pub use card_type::CardTypeSummaryExtractor;
pub use plan_summary::PlanSummaryExtractor;

use tracing::debug;

use crate::models::{CanonicalFields, Dialect};

/// Fields and notices one dialect read from a document.
#[derive(Debug, Clone)]
pub struct DialectOutcome {
    pub fields: CanonicalFields,
    pub warnings: Vec<String>,
    /// Fields resolved from document content. Values fixed by contract are
    /// not evidence.
    pub evidence: usize,
}

/// Trait for dialect extractors.
pub trait DialectExtractor: Send + Sync {
    /// The layout this extractor reads.
    fn dialect(&self) -> Dialect;

    /// Extract canonical fields from reconstructed lines.
    fn extract(&self, lines: &[String]) -> DialectOutcome;
}

/// The extractor for a dialect.
pub fn extractor_for(dialect: Dialect) -> &'static dyn DialectExtractor {
    match dialect {
        Dialect::CardTypeSummary => &CardTypeSummaryExtractor,
        Dialect::PlanSummary => &PlanSummaryExtractor,
    }
}

/// Run every dialect over the same lines and keep the one with the most
/// evidence. Ties go to the dialect listed first in `priority`. Returns
/// `None` when no dialect resolved anything.
pub fn race(lines: &[String], priority: &[Dialect]) -> Option<(Dialect, DialectOutcome)> {
    let mut best: Option<(Dialect, DialectOutcome)> = None;

    for dialect in priority {
        let outcome = extractor_for(*dialect).extract(lines);
        debug!("{} resolved {} field(s) from evidence", dialect, outcome.evidence);

        let better = match &best {
            Some((_, current)) => outcome.evidence > current.evidence,
            None => outcome.evidence > 0,
        };
        if better {
            best = Some((*dialect, outcome));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_race_prefers_more_evidence() {
        let doc = lines(
            "
            ACTIVITY SUMMARY
            Total Sales 310 $25,000.00
            Keyed Transactions 40
            CHARGEBACK ACTIVITY
            Total Chargebacks 2 $150.00
            FRAUD ACTIVITY
            Total Fraud 1 $75.00
            ",
        );

        let (dialect, outcome) = race(&doc, &[Dialect::CardTypeSummary, Dialect::PlanSummary]).unwrap();
        assert_eq!(dialect, Dialect::PlanSummary);
        assert!(outcome.evidence >= 4);
    }

    #[test]
    fn test_race_tie_follows_priority() {
        // both layouts read only the period
        let doc = lines("Statement Period 03/01/24 - 03/31/24\nThank you for your business");

        let (first, outcome) = race(&doc, &[Dialect::CardTypeSummary, Dialect::PlanSummary]).unwrap();
        assert_eq!(first, Dialect::CardTypeSummary);
        assert_eq!(outcome.evidence, 1);

        let (again, repeat) = race(&doc, &[Dialect::CardTypeSummary, Dialect::PlanSummary]).unwrap();
        assert_eq!(again, first);
        assert_eq!(repeat.fields, outcome.fields);
        assert_eq!(repeat.warnings, outcome.warnings);

        let (reordered, _) = race(&doc, &[Dialect::PlanSummary, Dialect::CardTypeSummary]).unwrap();
        assert_eq!(reordered, Dialect::PlanSummary);
    }

    #[test]
    fn test_race_without_evidence() {
        let doc = lines("Hello\nNothing to see here");
        assert!(race(&doc, &Dialect::ALL).is_none());
    }
}
