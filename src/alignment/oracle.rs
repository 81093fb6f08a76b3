use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::record::Record;
use crate::core::row::IndexedRow;
use crate::core::types::SequenceSide;
use crate::oracle::{OracleError, SemanticMatcher};

/// Ways a matcher response can break its contract beyond what is repaired locally
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("response is not an object with a `rows` array")]
    MissingRows,

    #[error("row {row} is not an object")]
    RowNotObject { row: usize },

    #[error("row {row}: {side} index is not a non-negative integer ({value})")]
    NonNumericIndex {
        row: usize,
        side: SequenceSide,
        value: String,
    },

    #[error("row {row}: {side} index {index} out of range for {len} records")]
    IndexOutOfRange {
        row: usize,
        side: SequenceSide,
        index: u64,
        len: usize,
    },

    #[error("row {row} has neither a master nor a candidate index")]
    EmptyRow { row: usize },

    #[error("row {row}: rationale is not a string")]
    InvalidRationale { row: usize },
}

impl ContractViolation {
    /// Index that triggered the violation, if it was an index problem
    pub fn offending_index(&self) -> Option<u64> {
        match self {
            Self::IndexOutOfRange { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Why the oracle strategy could not produce rows
#[derive(Debug, Error)]
pub enum OracleStrategyError {
    #[error(transparent)]
    Transport(OracleError),

    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

/// A validated row proposal, before order repair
#[derive(Debug, Clone, PartialEq, Eq)]
struct Proposal {
    master: Option<usize>,
    candidate: Option<usize>,
    rationale: String,
}

/// Alignment delegated to a [`SemanticMatcher`].
///
/// The matcher's answer is checked for shape and index range, then repaired so that both
/// input orders hold: an index that is not strictly greater than the last one placed on
/// its side is dropped from its row (the row keeps its other side, or disappears), and
/// every index the matcher never placed is inserted at the latest position its order
/// allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleStrategy;

impl OracleStrategy {
    /// Ask the matcher and reconcile its answer.
    ///
    /// # Errors
    ///
    /// Returns [`OracleStrategyError::Transport`] if the call fails and
    /// [`OracleStrategyError::Contract`] if the response cannot be used.
    pub async fn align(
        master: &[Record],
        candidate: &[Record],
        matcher: &dyn SemanticMatcher,
    ) -> Result<Vec<IndexedRow>, OracleStrategyError> {
        let response = match matcher.match_sequences(master, candidate).await {
            Ok(response) => response,
            Err(OracleError::MalformedResponse(message)) => {
                return Err(ContractViolation::MalformedBody(message).into())
            }
            Err(e) => return Err(OracleStrategyError::Transport(e)),
        };

        Ok(Self::reconcile(&response, master.len(), candidate.len())?)
    }

    /// Turn a raw matcher response into an order-preserving, complete row list.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractViolation`] if the response shape or an index is invalid.
    pub fn reconcile(
        response: &Value,
        master_len: usize,
        candidate_len: usize,
    ) -> Result<Vec<IndexedRow>, ContractViolation> {
        let proposals = parse_proposals(response, master_len, candidate_len)?;
        let repaired = repair_order(proposals);
        Ok(complete_coverage(repaired, master_len, candidate_len))
    }
}

fn parse_proposals(
    response: &Value,
    master_len: usize,
    candidate_len: usize,
) -> Result<Vec<Proposal>, ContractViolation> {
    let rows = response
        .get("rows")
        .and_then(Value::as_array)
        .ok_or(ContractViolation::MissingRows)?;

    let mut proposals = Vec::with_capacity(rows.len());
    for (row, value) in rows.iter().enumerate() {
        let object = value
            .as_object()
            .ok_or(ContractViolation::RowNotObject { row })?;

        let master = parse_index(
            object,
            row,
            SequenceSide::Master,
            ["masterIndex", "master_index"],
            master_len,
        )?;
        let candidate = parse_index(
            object,
            row,
            SequenceSide::Candidate,
            ["candidateIndex", "candidate_index"],
            candidate_len,
        )?;
        if master.is_none() && candidate.is_none() {
            return Err(ContractViolation::EmptyRow { row });
        }

        let rationale = match object.get("rationale") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(ContractViolation::InvalidRationale { row }),
        };

        proposals.push(Proposal {
            master,
            candidate,
            rationale,
        });
    }
    Ok(proposals)
}

fn parse_index(
    object: &Map<String, Value>,
    row: usize,
    side: SequenceSide,
    keys: [&str; 2],
    len: usize,
) -> Result<Option<usize>, ContractViolation> {
    let value = match keys.iter().find_map(|k| object.get(*k)) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };

    let index = value
        .as_u64()
        .ok_or_else(|| ContractViolation::NonNumericIndex {
            row,
            side,
            value: value.to_string(),
        })?;

    match usize::try_from(index) {
        Ok(i) if i < len => Ok(Some(i)),
        _ => Err(ContractViolation::IndexOutOfRange {
            row,
            side,
            index,
            len,
        }),
    }
}

/// Outcome of order repair
#[derive(Debug, Default)]
struct Repaired {
    rows: Vec<IndexedRow>,
    deferred_master: HashSet<usize>,
    deferred_candidate: HashSet<usize>,
}

/// Drop every index that is not strictly after the last placed one on its side.
///
/// An index seen before is a repeat and simply disappears; an unseen one is deferred to
/// coverage completion.
fn repair_order(proposals: Vec<Proposal>) -> Repaired {
    let mut out = Repaired {
        rows: Vec::with_capacity(proposals.len()),
        ..Repaired::default()
    };
    let mut master = SideTracker::default();
    let mut candidate = SideTracker::default();

    for (row, p) in proposals.into_iter().enumerate() {
        let mut notes = Vec::new();

        let keep_master = match p.master {
            Some(m) => match master.place(m) {
                Placement::Kept => Some(m),
                Placement::Repeated => {
                    warn!(row, master_index = m, "matcher repeated a master index");
                    notes.push(format!("[master index {m} repeated; dropped]"));
                    None
                }
                Placement::OutOfOrder => {
                    warn!(row, master_index = m, "matcher placed master index out of order");
                    notes.push(format!("[master index {m} out of order; deferred]"));
                    out.deferred_master.insert(m);
                    None
                }
            },
            None => None,
        };

        let keep_candidate = match p.candidate {
            Some(c) => match candidate.place(c) {
                Placement::Kept => Some(c),
                Placement::Repeated => {
                    warn!(row, candidate_index = c, "matcher repeated a candidate index");
                    notes.push(format!("[candidate index {c} repeated; dropped]"));
                    None
                }
                Placement::OutOfOrder => {
                    warn!(
                        row,
                        candidate_index = c,
                        "matcher placed candidate index out of order"
                    );
                    notes.push(format!("[candidate index {c} out of order; deferred]"));
                    out.deferred_candidate.insert(c);
                    None
                }
            },
            None => None,
        };

        let rationale = std::iter::once(p.rationale)
            .chain(notes)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(repaired) = IndexedRow::from_parts(keep_master, keep_candidate, rationale) {
            out.rows.push(repaired);
        }
    }
    out
}

enum Placement {
    Kept,
    Repeated,
    OutOfOrder,
}

#[derive(Default)]
struct SideTracker {
    last: Option<usize>,
    seen: HashSet<usize>,
}

impl SideTracker {
    fn place(&mut self, index: usize) -> Placement {
        if !self.seen.insert(index) {
            return Placement::Repeated;
        }
        if self.last.is_some_and(|last| index < last) {
            return Placement::OutOfOrder;
        }
        self.last = Some(index);
        Placement::Kept
    }
}

/// Insert single-sided rows for every index the matcher left out or deferred
fn complete_coverage(repaired: Repaired, master_len: usize, candidate_len: usize) -> Vec<IndexedRow> {
    let Repaired {
        rows,
        deferred_master,
        deferred_candidate,
    } = repaired;

    let uncovered_master = uncovered(&rows, master_len, IndexedRow::master);
    let uncovered_candidate = uncovered(&rows, candidate_len, IndexedRow::candidate);
    if uncovered_master.is_empty() && uncovered_candidate.is_empty() {
        return rows;
    }
    debug!(
        master = uncovered_master.len(),
        candidate = uncovered_candidate.len(),
        "placing records the matcher left out"
    );

    // slots[p] holds the rows to emit just before rows[p]; the extra slot is the end
    let mut slots: Vec<Vec<IndexedRow>> = vec![Vec::new(); rows.len() + 1];
    for (slot, m) in insertion_slots(&rows, &uncovered_master, IndexedRow::master) {
        let rationale = if deferred_master.contains(&m) {
            "Placed out of order by the matcher; kept at its master position"
        } else {
            "Not placed by the matcher; kept at its master position"
        };
        slots[slot].push(IndexedRow::master_only(m, rationale));
    }
    for (slot, c) in insertion_slots(&rows, &uncovered_candidate, IndexedRow::candidate) {
        let rationale = if deferred_candidate.contains(&c) {
            "Placed out of order by the matcher; kept at its candidate position"
        } else {
            "Not placed by the matcher; kept at its candidate position"
        };
        slots[slot].push(IndexedRow::candidate_only(c, rationale));
    }

    let mut out =
        Vec::with_capacity(rows.len() + uncovered_master.len() + uncovered_candidate.len());
    let mut slots = slots.into_iter();
    for row in rows {
        if let Some(before) = slots.next() {
            out.extend(before);
        }
        out.push(row);
    }
    out.extend(slots.flatten());
    out
}

fn uncovered(
    rows: &[IndexedRow],
    len: usize,
    side: impl Fn(&IndexedRow) -> Option<usize>,
) -> Vec<usize> {
    let mut placed = vec![false; len];
    for i in rows.iter().filter_map(&side) {
        placed[i] = true;
    }
    (0..len).filter(|&i| !placed[i]).collect()
}

/// For each uncovered index (ascending), the position of the first row carrying a larger
/// index on the same side. Placed indices are strictly increasing after repair, so one
/// forward pass suffices.
fn insertion_slots(
    rows: &[IndexedRow],
    uncovered: &[usize],
    side: impl Fn(&IndexedRow) -> Option<usize>,
) -> Vec<(usize, usize)> {
    let mut p = 0;
    uncovered
        .iter()
        .map(|&k| {
            while p < rows.len() && side(&rows[p]).map_or(true, |placed| placed < k) {
                p += 1;
            }
            (p, k)
        })
        .collect()
}
