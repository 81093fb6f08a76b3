//! Ordered two-list alignment.
//!
//! Produces a row-by-row correspondence between a master TOC and a candidate TOC:
//!
//! - [`AlignmentEngine`]: validates inputs, runs a strategy, checks the result
//! - [`LocalStrategy`]: greedy exact-identity alignment, no I/O
//! - [`OracleStrategy`]: correspondences from a [`crate::oracle::SemanticMatcher`],
//!   validated and repaired locally
//!
//! ## Guarantees
//!
//! Whatever the strategy, reading the rows top to bottom:
//!
//! 1. the present master items reproduce the master order exactly
//! 2. the present candidate items reproduce the candidate order exactly
//! 3. every record appears in exactly one row
//!
//! The local strategy additionally keeps each run of candidate-only rows directly in front
//! of the match that follows it in the master.
//!
//! ## Example
//!
//! ```rust
//! use toc_align::{AlignmentEngine, Classification, RawRecord};
//!
//! let master = vec![RawRecord::with_id("1"), RawRecord::with_id("2")];
//! let candidate = vec![
//!     RawRecord::with_id("1"),
//!     RawRecord::with_id("1.5"),
//!     RawRecord::with_id("2"),
//! ];
//!
//! let rows = AlignmentEngine::new().align_local(&master, &candidate).unwrap();
//! assert_eq!(rows.len(), 3);
//! assert_eq!(rows[1].classification, Classification::CandidateOnly);
//! ```

pub mod engine;
pub mod invariants;
pub mod local;
pub mod oracle;

pub use engine::{AlignContext, AlignmentEngine, AlignmentError};
pub use local::LocalStrategy;
pub use oracle::{ContractViolation, OracleStrategy};
