use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::alignment::invariants::{self, InvariantViolation};
use crate::alignment::local::LocalStrategy;
use crate::alignment::oracle::{ContractViolation, OracleStrategy, OracleStrategyError};
use crate::core::record::{RawRecord, Record, RecordError};
use crate::core::row::{AlignmentRow, AlignmentSummary, IndexedRow};
use crate::core::types::{SequenceSide, StrategyKind};
use crate::oracle::{OracleError, SemanticMatcher};
use crate::utils::validation::MAX_RECORDS;

/// Which request failed, for logging without re-deriving state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlignContext {
    pub strategy: StrategyKind,
    pub master_len: usize,
    pub candidate_len: usize,
}

impl std::fmt::Display for AlignContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "strategy={} master={} candidate={}",
            self.strategy, self.master_len, self.candidate_len
        )
    }
}

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("invalid {side} record at index {index}: {source}")]
    Validation {
        side: SequenceSide,
        index: usize,
        source: RecordError,
    },

    #[error("{side} sequence has {count} records, maximum is {max}", max = MAX_RECORDS)]
    TooManyRecords { side: SequenceSide, count: usize },

    #[error("no semantic matcher configured ({context})")]
    MatcherUnavailable { context: AlignContext },

    #[error("matcher response violated contract ({context}): {violation}")]
    OracleContract {
        context: AlignContext,
        #[source]
        violation: ContractViolation,
    },

    #[error("matcher call failed ({context}): {source}")]
    OracleTransport {
        context: AlignContext,
        source: OracleError,
    },

    #[error("alignment invariant violated ({context}): {violation}")]
    InvariantViolation {
        context: AlignContext,
        #[source]
        violation: InvariantViolation,
    },
}

impl AlignmentError {
    /// Stable machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::TooManyRecords { .. } => "validation_error",
            Self::MatcherUnavailable { .. } => "matcher_unavailable",
            Self::OracleContract { .. } => "oracle_contract_error",
            Self::OracleTransport { .. } => "oracle_transport_error",
            Self::InvariantViolation { .. } => "invariant_violation",
        }
    }

    /// Whether the caller's input, rather than a collaborator, is at fault
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::TooManyRecords { .. })
    }

    pub fn context(&self) -> Option<&AlignContext> {
        match self {
            Self::Validation { .. } | Self::TooManyRecords { .. } => None,
            Self::MatcherUnavailable { context }
            | Self::OracleContract { context, .. }
            | Self::OracleTransport { context, .. }
            | Self::InvariantViolation { context, .. } => Some(context),
        }
    }
}

/// Validates inputs, runs a strategy and checks the result.
///
/// Holds no per-request state; one engine can serve concurrent requests.
#[derive(Clone, Default)]
pub struct AlignmentEngine {
    matcher: Option<Arc<dyn SemanticMatcher>>,
}

impl std::fmt::Debug for AlignmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignmentEngine")
            .field("has_matcher", &self.has_matcher())
            .finish()
    }
}

impl AlignmentEngine {
    /// Engine that can only run the local strategy
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that can run both strategies
    pub fn with_matcher(matcher: Arc<dyn SemanticMatcher>) -> Self {
        Self {
            matcher: Some(matcher),
        }
    }

    pub fn has_matcher(&self) -> bool {
        self.matcher.is_some()
    }

    /// Align with the exact-identity strategy. No I/O.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::Validation`] for a malformed record.
    pub fn align_local(
        &self,
        master: &[RawRecord],
        candidate: &[RawRecord],
    ) -> Result<Vec<AlignmentRow>, AlignmentError> {
        let (master, candidate) = validate_sequences(master, candidate)?;
        let context = AlignContext {
            strategy: StrategyKind::Local,
            master_len: master.len(),
            candidate_len: candidate.len(),
        };

        let rows = LocalStrategy::align(&master, &candidate);
        finish(&rows, &master, &candidate, context)
    }

    /// Align with correspondences decided by the configured matcher.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::Validation`] for a malformed record,
    /// [`AlignmentError::MatcherUnavailable`] if no matcher is configured, and the oracle
    /// errors if the call or its response fails.
    pub async fn align_with_oracle(
        &self,
        master: &[RawRecord],
        candidate: &[RawRecord],
    ) -> Result<Vec<AlignmentRow>, AlignmentError> {
        let (master, candidate) = validate_sequences(master, candidate)?;
        let context = AlignContext {
            strategy: StrategyKind::Oracle,
            master_len: master.len(),
            candidate_len: candidate.len(),
        };

        let matcher = self
            .matcher
            .as_deref()
            .ok_or(AlignmentError::MatcherUnavailable { context })?;

        let rows = OracleStrategy::align(&master, &candidate, matcher)
            .await
            .map_err(|e| match e {
                OracleStrategyError::Transport(source) => {
                    AlignmentError::OracleTransport { context, source }
                }
                OracleStrategyError::Contract(violation) => {
                    AlignmentError::OracleContract { context, violation }
                }
            })?;

        finish(&rows, &master, &candidate, context)
    }

    /// Align with the chosen strategy
    ///
    /// # Errors
    ///
    /// See [`Self::align_local`] and [`Self::align_with_oracle`].
    pub async fn align_sequences(
        &self,
        master: &[RawRecord],
        candidate: &[RawRecord],
        strategy: StrategyKind,
    ) -> Result<Vec<AlignmentRow>, AlignmentError> {
        match strategy {
            StrategyKind::Local => self.align_local(master, candidate),
            StrategyKind::Oracle => self.align_with_oracle(master, candidate).await,
        }
    }
}

fn validate_sequences(
    master: &[RawRecord],
    candidate: &[RawRecord],
) -> Result<(Vec<Record>, Vec<Record>), AlignmentError> {
    Ok((
        validate_sequence(SequenceSide::Master, master)?,
        validate_sequence(SequenceSide::Candidate, candidate)?,
    ))
}

fn validate_sequence(side: SequenceSide, raw: &[RawRecord]) -> Result<Vec<Record>, AlignmentError> {
    if raw.len() > MAX_RECORDS {
        return Err(AlignmentError::TooManyRecords {
            side,
            count: raw.len(),
        });
    }

    raw.iter()
        .enumerate()
        .map(|(index, r)| {
            Record::try_from(r.clone())
                .map_err(|source| AlignmentError::Validation { side, index, source })
        })
        .collect()
}

fn finish(
    rows: &[IndexedRow],
    master: &[Record],
    candidate: &[Record],
    context: AlignContext,
) -> Result<Vec<AlignmentRow>, AlignmentError> {
    if cfg!(debug_assertions) {
        let contiguity = context.strategy == StrategyKind::Local;
        invariants::check(rows, master.len(), candidate.len(), contiguity)
            .map_err(|violation| AlignmentError::InvariantViolation { context, violation })?;
    }

    let resolved = rows
        .iter()
        .enumerate()
        .map(|(row, r)| {
            AlignmentRow::resolve(r, master, candidate).ok_or(
                AlignmentError::InvariantViolation {
                    context,
                    violation: InvariantViolation::Unresolvable { row },
                },
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = AlignmentSummary::from_rows(&resolved);
    debug!(
        %context,
        matches = summary.matches,
        master_only = summary.master_only,
        candidate_only = summary.candidate_only,
        "alignment complete"
    );

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::row::Classification;

    fn raw(ids: &[&str]) -> Vec<RawRecord> {
        ids.iter().map(|id| RawRecord::with_id(*id)).collect()
    }

    #[test]
    fn test_align_local_scenario() {
        let engine = AlignmentEngine::new();
        let rows = engine
            .align_local(&raw(&["1", "2", "3"]), &raw(&["1", "1.5", "2", "3"]))
            .unwrap();

        let classes: Vec<Classification> = rows.iter().map(|r| r.classification).collect();
        assert_eq!(
            classes,
            vec![
                Classification::Match,
                Classification::CandidateOnly,
                Classification::Match,
                Classification::Match,
            ]
        );
        assert_eq!(rows[1].candidate_identity(), Some("1.5"));
    }

    #[test]
    fn test_validation_reports_side_and_index() {
        let engine = AlignmentEngine::new();
        let candidate = vec![RawRecord::with_id("1"), RawRecord::default()];

        let err = engine.align_local(&raw(&["1"]), &candidate).unwrap_err();
        match err {
            AlignmentError::Validation {
                side,
                index,
                source,
            } => {
                assert_eq!(side, SequenceSide::Candidate);
                assert_eq!(index, 1);
                assert_eq!(source, RecordError::MissingIdentity);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_too_many_records() {
        let engine = AlignmentEngine::new();
        let big = vec![RawRecord::with_id("1"); MAX_RECORDS + 1];
        let err = engine.align_local(&big, &[]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_oracle_without_matcher() {
        let engine = AlignmentEngine::new();
        let err = engine
            .align_sequences(&raw(&["1"]), &raw(&["1"]), StrategyKind::Oracle)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "matcher_unavailable");
        assert_eq!(
            err.context(),
            Some(&AlignContext {
                strategy: StrategyKind::Oracle,
                master_len: 1,
                candidate_len: 1,
            })
        );
        assert!(err.to_string().contains("strategy=oracle master=1 candidate=1"));
    }

    #[tokio::test]
    async fn test_validation_precedes_matcher_lookup() {
        let engine = AlignmentEngine::new();
        let err = engine
            .align_with_oracle(&[RawRecord::with_id(" ")], &[])
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
