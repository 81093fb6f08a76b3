//! Core data types for TOC alignment.
//!
//! - [`RawRecord`]: A TOC entry as received, nothing validated
//! - [`Record`]: A validated, immutable TOC entry
//! - [`IndexedRow`]: A strategy's decision for one row, as positions in the inputs
//! - [`AlignmentRow`]: A resolved output row with its [`Classification`]
//! - [`StrategyKind`], [`SequenceSide`]: Shared enums
//!
//! ## Identities
//!
//! A record's `concept_id` is a dotted path whose segment count is its depth:
//!
//! | concept_id | Depth |
//! |------------|-------|
//! | 1          | 1     |
//! | 1.2        | 2     |
//! | 1.2.3      | 3     |
//!
//! Identities are compared exactly; uniqueness within one TOC is assumed but not required.

pub mod record;
pub mod row;
pub mod types;

pub use record::{RawRecord, Record, RecordError};
pub use row::{AlignmentRow, AlignmentSummary, Classification, IndexedRow};
pub use types::{SequenceSide, StrategyKind};
