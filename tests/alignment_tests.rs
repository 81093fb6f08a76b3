//! Alignment behaviour through the public engine API.
//!
//! Covers ordering and coverage for both strategies, the local strategy's documented
//! scenarios, and the repair of misbehaving matcher responses.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use toc_align::alignment::invariants;
use toc_align::alignment::LocalStrategy;
use toc_align::core::IndexedRow;
use toc_align::{
    AlignmentEngine, AlignmentError, AlignmentRow, Classification, OracleError, RawRecord,
    Record, SemanticMatcher, StrategyKind,
};

/// Matcher that replays a fixed response
struct CannedMatcher(Value);

#[async_trait]
impl SemanticMatcher for CannedMatcher {
    async fn match_sequences(
        &self,
        _master: &[Record],
        _candidate: &[Record],
    ) -> Result<Value, OracleError> {
        Ok(self.0.clone())
    }
}

/// Matcher whose call always fails
struct FailingMatcher;

#[async_trait]
impl SemanticMatcher for FailingMatcher {
    async fn match_sequences(
        &self,
        _master: &[Record],
        _candidate: &[Record],
    ) -> Result<Value, OracleError> {
        Err(OracleError::Timeout(std::time::Duration::from_secs(1)))
    }
}

fn raw(ids: &[&str]) -> Vec<RawRecord> {
    ids.iter()
        .map(|id| RawRecord::with_id(*id).with_label(format!("Label {id}")))
        .collect()
}

fn master_ids(rows: &[AlignmentRow]) -> Vec<&str> {
    rows.iter().filter_map(AlignmentRow::master_identity).collect()
}

fn candidate_ids(rows: &[AlignmentRow]) -> Vec<&str> {
    rows.iter()
        .filter_map(AlignmentRow::candidate_identity)
        .collect()
}

fn classes(rows: &[AlignmentRow]) -> Vec<Classification> {
    rows.iter().map(|r| r.classification).collect()
}

#[test]
fn test_scenario_insertion_in_candidate() {
    let rows = AlignmentEngine::new()
        .align_local(&raw(&["1", "2", "3"]), &raw(&["1", "1.5", "2", "3"]))
        .unwrap();

    assert_eq!(rows.len(), 4);
    assert_eq!(
        classes(&rows),
        vec![
            Classification::Match,
            Classification::CandidateOnly,
            Classification::Match,
            Classification::Match,
        ]
    );
    assert_eq!(rows[1].candidate_identity(), Some("1.5"));
    assert_eq!(master_ids(&rows), vec!["1", "2", "3"]);
    assert_eq!(candidate_ids(&rows), vec!["1", "1.5", "2", "3"]);
}

#[test]
fn test_scenario_master_only() {
    let rows = AlignmentEngine::new()
        .align_local(&raw(&["A"]), &[])
        .unwrap();
    assert_eq!(classes(&rows), vec![Classification::MasterOnly]);
    assert_eq!(rows[0].master_identity(), Some("A"));
    assert!(rows[0].candidate_item.is_none());
}

#[test]
fn test_scenario_candidate_only() {
    let rows = AlignmentEngine::new()
        .align_local(&[], &raw(&["X", "Y"]))
        .unwrap();
    assert_eq!(
        classes(&rows),
        vec![Classification::CandidateOnly, Classification::CandidateOnly]
    );
    assert_eq!(candidate_ids(&rows), vec!["X", "Y"]);
}

#[test]
fn test_self_alignment_is_all_matches() {
    let toc = raw(&["1", "1.1", "1.2", "2", "2.1"]);
    let rows = AlignmentEngine::new().align_local(&toc, &toc).unwrap();

    assert_eq!(rows.len(), toc.len());
    assert!(rows.iter().all(|r| r.classification == Classification::Match));
    assert_eq!(master_ids(&rows), vec!["1", "1.1", "1.2", "2", "2.1"]);
    assert!(rows.iter().all(|r| r.rationale == "Exact identity match"));
}

#[test]
fn test_disjoint_sequences_master_block_then_candidate_block() {
    let rows = AlignmentEngine::new()
        .align_local(&raw(&["1", "2", "3"]), &raw(&["a", "b"]))
        .unwrap();
    assert_eq!(
        classes(&rows),
        vec![
            Classification::MasterOnly,
            Classification::MasterOnly,
            Classification::MasterOnly,
            Classification::CandidateOnly,
            Classification::CandidateOnly,
        ]
    );
}

#[test]
fn test_records_keep_their_fields() {
    let master = vec![RawRecord {
        concept_id: Some("1".to_string()),
        label: Some("JavaScript Environment".to_string()),
        short_description: Some("Overview of where JS runs.".to_string()),
        source_url: Some("https://example.com/js-env".to_string()),
        evidence_snippet: Some("JavaScript is ubiquitous.".to_string()),
    }];
    let rows = AlignmentEngine::new().align_local(&master, &master).unwrap();

    let item = rows[0].master_item.as_ref().unwrap();
    assert_eq!(item.label(), "JavaScript Environment");
    assert_eq!(item.source_url(), Some("https://example.com/js-env"));
    assert_eq!(item.evidence_snippet(), Some("JavaScript is ubiquitous."));
}

/// Every sequence of length 0..=4 over a three-letter alphabet, duplicates included
fn all_sequences() -> Vec<Vec<Record>> {
    let alphabet = ["A", "B", "C"];
    let mut out: Vec<Vec<&str>> = vec![vec![]];
    let mut frontier: Vec<Vec<&str>> = vec![vec![]];
    for _ in 0..4 {
        let mut next = Vec::new();
        for prefix in &frontier {
            for letter in alphabet {
                let mut seq = prefix.clone();
                seq.push(letter);
                next.push(seq);
            }
        }
        out.extend(next.iter().cloned());
        frontier = next;
    }

    out.into_iter()
        .map(|ids| {
            ids.into_iter()
                .map(|id| Record::try_from(RawRecord::with_id(id)).unwrap())
                .collect()
        })
        .collect()
}

#[test]
fn test_local_strategy_order_coverage_and_contiguity_exhaustive() {
    let sequences = all_sequences();
    assert_eq!(sequences.len(), 121);

    for master in &sequences {
        for candidate in &sequences {
            let rows = LocalStrategy::align(master, candidate);
            if let Err(violation) = invariants::check(&rows, master.len(), candidate.len(), true)
            {
                let m: Vec<&str> = master.iter().map(Record::identity).collect();
                let c: Vec<&str> = candidate.iter().map(Record::identity).collect();
                panic!("{m:?} vs {c:?}: {violation}");
            }

            // Matches always pair equal identities
            for row in &rows {
                if let (Some(i), Some(j)) = (row.master(), row.candidate()) {
                    assert_eq!(master[i].identity(), candidate[j].identity());
                }
            }
        }
    }
}

#[test]
fn test_local_strategy_rows_never_empty() {
    for master in all_sequences().iter().take(40) {
        let rows = LocalStrategy::align(master, master);
        assert!(rows
            .iter()
            .all(|r: &IndexedRow| r.master().is_some() || r.candidate().is_some()));
    }
}

#[tokio::test]
async fn test_oracle_rows_pass_through() {
    let matcher = CannedMatcher(json!({"rows": [
        {"masterIndex": 0, "candidateIndex": 1, "rationale": "Same environment topic"},
        {"masterIndex": 1, "candidateIndex": null, "rationale": "Browser only in TOC 1"},
    ]}));
    let engine = AlignmentEngine::with_matcher(Arc::new(matcher));

    let rows = engine
        .align_sequences(&raw(&["1", "1.1"]), &raw(&["0", "3"]), StrategyKind::Oracle)
        .await
        .unwrap();

    // Candidate 0 was never placed; it belongs before candidate 1
    assert_eq!(
        classes(&rows),
        vec![
            Classification::CandidateOnly,
            Classification::Match,
            Classification::MasterOnly,
        ]
    );
    assert_eq!(rows[1].master_identity(), Some("1"));
    assert_eq!(rows[1].candidate_identity(), Some("3"));
    assert_eq!(rows[1].rationale, "Same environment topic");
}

#[tokio::test]
async fn test_oracle_decreasing_master_indices_are_repaired() {
    let matcher = CannedMatcher(json!({"rows": [
        {"masterIndex": 2, "candidateIndex": 0, "rationale": "first"},
        {"masterIndex": 1, "candidateIndex": 1, "rationale": "second"},
    ]}));
    let engine = AlignmentEngine::with_matcher(Arc::new(matcher));

    let rows = engine
        .align_with_oracle(&raw(&["a", "b", "c"]), &raw(&["x", "y"]))
        .await
        .unwrap();

    assert_eq!(master_ids(&rows), vec!["a", "b", "c"]);
    assert_eq!(candidate_ids(&rows), vec!["x", "y"]);

    let second = rows
        .iter()
        .find(|r| r.rationale.starts_with("second"))
        .unwrap();
    assert_eq!(second.classification, Classification::CandidateOnly);
    assert!(second.rationale.contains("master index 1 out of order"));

    let deferred = rows
        .iter()
        .find(|r| r.master_identity() == Some("b"))
        .unwrap();
    assert_eq!(deferred.classification, Classification::MasterOnly);
}

#[tokio::test]
async fn test_oracle_contract_error_carries_context() {
    let matcher = CannedMatcher(json!({"rows": [{"masterIndex": "zero"}]}));
    let engine = AlignmentEngine::with_matcher(Arc::new(matcher));

    let err = engine
        .align_with_oracle(&raw(&["1"]), &raw(&["1", "2"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "oracle_contract_error");
    let message = err.to_string();
    assert!(message.contains("strategy=oracle master=1 candidate=2"), "{message}");
    assert!(message.contains("not a non-negative integer"), "{message}");
}

#[tokio::test]
async fn test_oracle_transport_error_propagates() {
    let engine = AlignmentEngine::with_matcher(Arc::new(FailingMatcher));
    let err = engine
        .align_with_oracle(&raw(&["1"]), &raw(&["1"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AlignmentError::OracleTransport {
            source: OracleError::Timeout(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_malformed_record_fails_before_matcher_call() {
    // A matcher that would produce a contract error if it were ever consulted
    let engine = AlignmentEngine::with_matcher(Arc::new(CannedMatcher(json!(null))));
    let master = vec![RawRecord::with_id("1"), RawRecord::with_id("")];

    let err = engine
        .align_with_oracle(&master, &raw(&["1"]))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("master record at index 1"));
}

#[tokio::test]
async fn test_local_strategy_ignores_matcher() {
    let engine = AlignmentEngine::with_matcher(Arc::new(FailingMatcher));
    let rows = engine
        .align_sequences(&raw(&["1"]), &raw(&["1"]), StrategyKind::Local)
        .await
        .unwrap();
    assert_eq!(classes(&rows), vec![Classification::Match]);
}
