use serde::{Deserialize, Serialize};

use crate::core::record::Record;

/// How a row relates the two sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Both sides present
    Match,
    /// Only the master (TOC1) item is present
    MasterOnly,
    /// Only the candidate (TOC2) item is present
    CandidateOnly,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "MATCH"),
            Self::MasterOnly => write!(f, "MASTER_ONLY"),
            Self::CandidateOnly => write!(f, "CANDIDATE_ONLY"),
        }
    }
}

/// A strategy's decision for one output row, expressed as positions in the inputs.
///
/// At least one side is always present; use the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRow {
    master: Option<usize>,
    candidate: Option<usize>,
    pub rationale: String,
}

impl IndexedRow {
    pub fn matched(master: usize, candidate: usize, rationale: impl Into<String>) -> Self {
        Self {
            master: Some(master),
            candidate: Some(candidate),
            rationale: rationale.into(),
        }
    }

    pub fn master_only(master: usize, rationale: impl Into<String>) -> Self {
        Self {
            master: Some(master),
            candidate: None,
            rationale: rationale.into(),
        }
    }

    pub fn candidate_only(candidate: usize, rationale: impl Into<String>) -> Self {
        Self {
            master: None,
            candidate: Some(candidate),
            rationale: rationale.into(),
        }
    }

    /// Build from optional sides; `None` when both are absent
    pub fn from_parts(
        master: Option<usize>,
        candidate: Option<usize>,
        rationale: impl Into<String>,
    ) -> Option<Self> {
        if master.is_none() && candidate.is_none() {
            return None;
        }
        Some(Self {
            master,
            candidate,
            rationale: rationale.into(),
        })
    }

    pub fn master(&self) -> Option<usize> {
        self.master
    }

    pub fn candidate(&self) -> Option<usize> {
        self.candidate
    }

    #[must_use]
    pub fn classification(&self) -> Classification {
        classify(self.master.is_some(), self.candidate.is_some())
    }
}

/// One line of the aligned view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentRow {
    pub master_item: Option<Record>,
    pub candidate_item: Option<Record>,
    pub classification: Classification,
    pub rationale: String,
}

impl AlignmentRow {
    /// Resolve an [`IndexedRow`] against the two sequences.
    ///
    /// Returns `None` if an index is out of range.
    pub fn resolve(row: &IndexedRow, master: &[Record], candidate: &[Record]) -> Option<Self> {
        let master_item = match row.master {
            Some(i) => Some(master.get(i)?.clone()),
            None => None,
        };
        let candidate_item = match row.candidate {
            Some(j) => Some(candidate.get(j)?.clone()),
            None => None,
        };

        Some(Self {
            classification: row.classification(),
            master_item,
            candidate_item,
            rationale: row.rationale.clone(),
        })
    }

    pub fn master_identity(&self) -> Option<&str> {
        self.master_item.as_ref().map(Record::identity)
    }

    pub fn candidate_identity(&self) -> Option<&str> {
        self.candidate_item.as_ref().map(Record::identity)
    }
}

fn classify(has_master: bool, has_candidate: bool) -> Classification {
    match (has_master, has_candidate) {
        (true, true) => Classification::Match,
        (true, false) => Classification::MasterOnly,
        _ => Classification::CandidateOnly,
    }
}

/// Per-classification counts for a row list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentSummary {
    pub total_rows: usize,
    pub matches: usize,
    pub master_only: usize,
    pub candidate_only: usize,
}

impl AlignmentSummary {
    pub fn from_rows(rows: &[AlignmentRow]) -> Self {
        let mut summary = Self {
            total_rows: rows.len(),
            ..Self::default()
        };
        for row in rows {
            match row.classification {
                Classification::Match => summary.matches += 1,
                Classification::MasterOnly => summary.master_only += 1,
                Classification::CandidateOnly => summary.candidate_only += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RawRecord;

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .map(|id| Record::try_from(RawRecord::with_id(*id)).unwrap())
            .collect()
    }

    #[test]
    fn test_from_parts_rejects_empty_row() {
        assert!(IndexedRow::from_parts(None, None, "nothing").is_none());
        assert_eq!(
            IndexedRow::from_parts(Some(0), None, "x")
                .unwrap()
                .classification(),
            Classification::MasterOnly
        );
    }

    #[test]
    fn test_resolve_out_of_range() {
        let master = records(&["1"]);
        let candidate = records(&["1"]);
        let row = IndexedRow::matched(0, 3, "bad");
        assert!(AlignmentRow::resolve(&row, &master, &candidate).is_none());
    }

    #[test]
    fn test_resolve_match() {
        let master = records(&["1", "2"]);
        let candidate = records(&["2"]);
        let row = IndexedRow::matched(1, 0, "Exact identity match");
        let resolved = AlignmentRow::resolve(&row, &master, &candidate).unwrap();
        assert_eq!(resolved.classification, Classification::Match);
        assert_eq!(resolved.master_identity(), Some("2"));
        assert_eq!(resolved.candidate_identity(), Some("2"));
    }

    #[test]
    fn test_classification_serializes_screaming_case() {
        let json = serde_json::to_string(&Classification::CandidateOnly).unwrap();
        assert_eq!(json, "\"CANDIDATE_ONLY\"");
    }

    #[test]
    fn test_summary_counts() {
        let master = records(&["1", "2"]);
        let candidate = records(&["1", "3"]);
        let rows: Vec<AlignmentRow> = [
            IndexedRow::matched(0, 0, ""),
            IndexedRow::master_only(1, ""),
            IndexedRow::candidate_only(1, ""),
        ]
        .iter()
        .filter_map(|r| AlignmentRow::resolve(r, &master, &candidate))
        .collect();

        let summary = AlignmentSummary::from_rows(&rows);
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.matches, 1);
        assert_eq!(summary.master_only, 1);
        assert_eq!(summary.candidate_only, 1);
    }
}
