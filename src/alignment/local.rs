use std::collections::HashMap;

use crate::core::record::Record;
use crate::core::row::IndexedRow;

/// Deterministic, identity-keyed greedy alignment.
///
/// Walks both sequences once with a cursor into each. When the current items share an
/// identity they are matched. Otherwise the candidate item is treated as an insertion if
/// the current master identity still occurs later in the candidate, and the master item
/// is treated as missing from the candidate if it does not. Never backtracks, so the
/// result is not a minimum-edit alignment, but both input orders are always preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStrategy;

impl LocalStrategy {
    #[must_use]
    pub fn align(master: &[Record], candidate: &[Record]) -> Vec<IndexedRow> {
        // Last occurrence wins: "does this identity occur after j" only needs the maximum
        let candidate_last: HashMap<&str, usize> = candidate
            .iter()
            .enumerate()
            .map(|(j, r)| (r.identity(), j))
            .collect();

        let mut master_first: HashMap<&str, usize> = HashMap::with_capacity(master.len());
        for (i, r) in master.iter().enumerate() {
            master_first.entry(r.identity()).or_insert(i);
        }

        let mut rows = Vec::with_capacity(master.len().max(candidate.len()));
        let (mut i, mut j) = (0, 0);

        loop {
            match (master.get(i), candidate.get(j)) {
                (Some(m), Some(c)) if m.identity() == c.identity() => {
                    rows.push(IndexedRow::matched(i, j, "Exact identity match"));
                    i += 1;
                    j += 1;
                }
                (Some(m), Some(c)) => {
                    let recurs_later = candidate_last
                        .get(m.identity())
                        .is_some_and(|&last| last > j);

                    if recurs_later {
                        let rationale = insertion_rationale(c, Some(m), &master_first);
                        rows.push(IndexedRow::candidate_only(j, rationale));
                        j += 1;
                    } else {
                        let rationale = missing_rationale(m, &candidate_last);
                        rows.push(IndexedRow::master_only(i, rationale));
                        i += 1;
                    }
                }
                (Some(m), None) => {
                    let rationale = missing_rationale(m, &candidate_last);
                    rows.push(IndexedRow::master_only(i, rationale));
                    i += 1;
                }
                (None, Some(c)) => {
                    let rationale = insertion_rationale(c, None, &master_first);
                    rows.push(IndexedRow::candidate_only(j, rationale));
                    j += 1;
                }
                (None, None) => break,
            }
        }

        rows
    }
}

fn insertion_rationale(
    inserted: &Record,
    before: Option<&Record>,
    master_first: &HashMap<&str, usize>,
) -> String {
    let position = match before {
        Some(next) => format!("before {}", next.identity()),
        None => "after the end of master".to_string(),
    };

    match master_first.get(inserted.identity()) {
        Some(&at) => format!(
            "Out of order: {} is at master position {at}; candidate copy placed {position}",
            inserted.identity()
        ),
        None => format!("Unique topic in candidate inserted {position}"),
    }
}

fn missing_rationale(missing: &Record, candidate_last: &HashMap<&str, usize>) -> String {
    if candidate_last.contains_key(missing.identity()) {
        format!(
            "Counterpart of {} already passed in candidate (order differs)",
            missing.identity()
        )
    } else {
        "No counterpart found in candidate".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RawRecord;
    use crate::core::row::Classification;

    fn seq(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .map(|id| Record::try_from(RawRecord::with_id(*id)).unwrap())
            .collect()
    }

    fn shape(rows: &[IndexedRow]) -> Vec<(Option<usize>, Option<usize>)> {
        rows.iter().map(|r| (r.master(), r.candidate())).collect()
    }

    #[test]
    fn test_insertion_between_matches() {
        let master = seq(&["1", "2", "3"]);
        let candidate = seq(&["1", "1.5", "2", "3"]);

        let rows = LocalStrategy::align(&master, &candidate);
        assert_eq!(
            shape(&rows),
            vec![
                (Some(0), Some(0)),
                (None, Some(1)),
                (Some(1), Some(2)),
                (Some(2), Some(3)),
            ]
        );
        assert_eq!(rows[1].rationale, "Unique topic in candidate inserted before 2");
        assert_eq!(rows[0].rationale, "Exact identity match");
    }

    #[test]
    fn test_empty_master() {
        let rows = LocalStrategy::align(&[], &seq(&["X", "Y"]));
        assert_eq!(shape(&rows), vec![(None, Some(0)), (None, Some(1))]);
        assert_eq!(
            rows[0].rationale,
            "Unique topic in candidate inserted after the end of master"
        );
    }

    #[test]
    fn test_empty_candidate() {
        let rows = LocalStrategy::align(&seq(&["A"]), &[]);
        assert_eq!(shape(&rows), vec![(Some(0), None)]);
        assert_eq!(rows[0].rationale, "No counterpart found in candidate");
    }

    #[test]
    fn test_both_empty() {
        assert!(LocalStrategy::align(&[], &[]).is_empty());
    }

    #[test]
    fn test_identical_sequences_all_match() {
        let master = seq(&["1", "1.1", "1.2", "2"]);
        let rows = LocalStrategy::align(&master, &master);
        assert_eq!(rows.len(), 4);
        assert!(rows
            .iter()
            .all(|r| r.classification() == Classification::Match));
    }

    #[test]
    fn test_disjoint_sequences_do_not_interleave() {
        let rows = LocalStrategy::align(&seq(&["A", "B"]), &seq(&["X", "Y", "Z"]));
        let classes: Vec<Classification> = rows.iter().map(IndexedRow::classification).collect();
        assert_eq!(
            classes,
            vec![
                Classification::MasterOnly,
                Classification::MasterOnly,
                Classification::CandidateOnly,
                Classification::CandidateOnly,
                Classification::CandidateOnly,
            ]
        );
    }

    #[test]
    fn test_deleted_master_item() {
        let rows = LocalStrategy::align(&seq(&["1", "2", "3"]), &seq(&["1", "3"]));
        assert_eq!(
            shape(&rows),
            vec![(Some(0), Some(0)), (Some(1), None), (Some(2), Some(1))]
        );
    }

    #[test]
    fn test_rotated_candidate() {
        // C moves to the front of the candidate: it is inserted there and its master
        // copy is reported as master-only at its original position
        let rows = LocalStrategy::align(&seq(&["A", "B", "C"]), &seq(&["C", "A", "B"]));
        assert_eq!(
            shape(&rows),
            vec![
                (None, Some(0)),
                (Some(0), Some(1)),
                (Some(1), Some(2)),
                (Some(2), None),
            ]
        );
        assert!(rows[0].rationale.starts_with("Out of order: C"));
        assert!(rows[3].rationale.contains("already passed"));
    }

    #[test]
    fn test_duplicate_identities_cover_every_record() {
        let master = seq(&["1", "1", "2"]);
        let candidate = seq(&["1", "2", "1"]);

        let rows = LocalStrategy::align(&master, &candidate);
        assert_eq!(
            shape(&rows),
            vec![
                (Some(0), Some(0)),
                (None, Some(1)),
                (Some(1), Some(2)),
                (Some(2), None),
            ]
        );
    }
}
