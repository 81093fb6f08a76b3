//! Structural checks over a strategy's row list.
//!
//! - Order: the master indices, read in row order, are exactly `0..master_len`; likewise
//!   for the candidate. This covers both order preservation and coverage (every record
//!   appears once).
//! - Insertion contiguity (local strategy only): every maximal run of candidate-only rows
//!   sits immediately before the match of the master item following the run's anchor,
//!   or at the very end once the master is exhausted.

use thiserror::Error;

use crate::core::row::{Classification, IndexedRow};
use crate::core::types::SequenceSide;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("row {row}: expected {side} index {expected}, found {found}")]
    OutOfOrder {
        side: SequenceSide,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{side} coverage incomplete: {covered} of {len} records placed")]
    Incomplete {
        side: SequenceSide,
        covered: usize,
        len: usize,
    },

    #[error("candidate-only run starting at row {row} is not anchored before master index {successor}")]
    DetachedInsertion { row: usize, successor: usize },

    #[error("row {row} references a record outside its sequence")]
    Unresolvable { row: usize },
}

impl InvariantViolation {
    /// Row the violation was detected at, if any
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::OutOfOrder { row, .. }
            | Self::DetachedInsertion { row, .. }
            | Self::Unresolvable { row } => Some(*row),
            Self::Incomplete { .. } => None,
        }
    }
}

/// Run every applicable check.
///
/// # Errors
///
/// Returns the first [`InvariantViolation`] found.
pub fn check(
    rows: &[IndexedRow],
    master_len: usize,
    candidate_len: usize,
    insertion_contiguity: bool,
) -> Result<(), InvariantViolation> {
    check_side(rows, SequenceSide::Master, master_len)?;
    check_side(rows, SequenceSide::Candidate, candidate_len)?;
    if insertion_contiguity {
        check_insertion_contiguity(rows, master_len)?;
    }
    Ok(())
}

/// Order and coverage for one side
///
/// # Errors
///
/// Returns [`InvariantViolation::OutOfOrder`] or [`InvariantViolation::Incomplete`].
pub fn check_side(
    rows: &[IndexedRow],
    side: SequenceSide,
    len: usize,
) -> Result<(), InvariantViolation> {
    let mut expected = 0;
    for (row, r) in rows.iter().enumerate() {
        let index = match side {
            SequenceSide::Master => r.master(),
            SequenceSide::Candidate => r.candidate(),
        };
        if let Some(found) = index {
            if found != expected {
                return Err(InvariantViolation::OutOfOrder {
                    side,
                    row,
                    expected,
                    found,
                });
            }
            expected += 1;
        }
    }

    if expected != len {
        return Err(InvariantViolation::Incomplete {
            side,
            covered: expected,
            len,
        });
    }
    Ok(())
}

/// Candidate-only runs must end at the successor's match, or at the end of the rows
///
/// # Errors
///
/// Returns [`InvariantViolation::DetachedInsertion`] for the first misplaced run.
pub fn check_insertion_contiguity(
    rows: &[IndexedRow],
    master_len: usize,
) -> Result<(), InvariantViolation> {
    let mut next_master = 0;
    let mut run_start: Option<usize> = None;

    for (row, r) in rows.iter().enumerate() {
        if r.classification() == Classification::CandidateOnly {
            run_start.get_or_insert(row);
            continue;
        }

        if let Some(start) = run_start.take() {
            let anchored =
                r.classification() == Classification::Match && r.master() == Some(next_master);
            if !anchored {
                return Err(InvariantViolation::DetachedInsertion {
                    row: start,
                    successor: next_master,
                });
            }
        }

        if let Some(m) = r.master() {
            next_master = m + 1;
        }
    }

    // A trailing run is only legal once the master has nothing left to anchor to
    if let Some(start) = run_start {
        if next_master < master_len {
            return Err(InvariantViolation::DetachedInsertion {
                row: start,
                successor: next_master,
            });
        }
    }
    Ok(())
}
