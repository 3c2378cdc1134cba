use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentId, Verbatim};

/// Canned operations a message can request instead of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AllThePlans,
    StateOfRace,
    Verbatim,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllThePlans => "all_the_plans",
            Self::StateOfRace => "state_of_race",
            Self::Verbatim => "verbatim",
        }
    }
}

/// A ranked candidate kept for "did you mean" replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialMatch {
    pub document_id: DocumentId,
    /// `None` when the model references an id the loaded corpus lacks
    pub document: Option<Document>,
    pub confidence: f64,
}

/// Outcome of any matching strategy.
///
/// A final result holds exactly one of: an accepted `match`, an
/// `operation`, or neither (no match). Statistical strategies still fill
/// `confidence`, `document` and `potential_matches` for a rejected best
/// guess so the caller can offer suggestions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "match")]
    pub match_id: Option<DocumentId>,
    /// 0-100
    pub confidence: Option<f64>,
    pub document: Option<Document>,
    pub potential_matches: Option<Vec<PotentialMatch>>,
    pub operation: Option<Operation>,
    pub verbatim: Option<Verbatim>,
}

impl MatchResult {
    /// Empty result: a rule strategy that did not fire.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// An accepted match on `document` at `confidence`.
    #[must_use]
    pub fn matched(document: Document, confidence: f64) -> Self {
        Self {
            match_id: Some(document.id.clone()),
            confidence: Some(confidence),
            document: Some(document),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn operation(operation: Operation) -> Self {
        Self {
            operation: Some(operation),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn verbatim(verbatim: Verbatim) -> Self {
        Self {
            operation: Some(Operation::Verbatim),
            verbatim: Some(verbatim),
            ..Self::default()
        }
    }

    /// True when a composite chain should stop at this result.
    #[must_use]
    pub fn is_affirmative(&self) -> bool {
        self.match_id.is_some() || self.operation.is_some()
    }

    #[must_use]
    pub fn potential_matches(&self) -> &[PotentialMatch] {
        self.potential_matches.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_field_serializes_under_its_short_name() {
        let doc = Document::plan("a", "topic", "Title", "http://a", "summary");
        let value = serde_json::to_value(MatchResult::matched(doc, 100.0)).unwrap();
        assert_eq!(value["match"], "a");
        assert_eq!(value["confidence"], 100.0);
        assert!(value["operation"].is_null());
    }

    #[test]
    fn operations_are_affirmative() {
        assert!(MatchResult::operation(Operation::AllThePlans).is_affirmative());
        assert!(!MatchResult::none().is_affirmative());
        assert_eq!(
            serde_json::to_value(Operation::AllThePlans).unwrap(),
            "all_the_plans"
        );
    }
}
