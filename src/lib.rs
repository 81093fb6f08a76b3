//! # toc-align
//!
//! A library for comparing two ordered Tables of Contents (TOCs): flat lists of concept
//! records whose order encodes a document's structure.
//!
//! The core is an ordered two-list alignment engine. Given a master TOC and a candidate
//! TOC it decides, for every entry, whether it is a match, master-only, or a
//! candidate-only insertion, and where insertions belong, without ever reordering either
//! list.
//!
//! ## Features
//!
//! - **Local alignment**: Greedy, single-pass matching on exact `concept_id`
//! - **Oracle alignment**: Correspondences from an external semantic matcher, validated
//!   and repaired so ordering and coverage always hold
//! - **Combine**: Merge two TOCs into one through the same external service
//! - **CLI and HTTP API**: `toc-align align|combine|serve`
//!
//! ## Example
//!
//! ```rust
//! use toc_align::{AlignmentEngine, Classification};
//! use toc_align::parsing::toc::parse_toc_text;
//!
//! let toc1 = parse_toc_text(r#"[{"concept_id": "1"}, {"concept_id": "2"}]"#).unwrap();
//! let toc2 = parse_toc_text(r#"[{"concept_id": "1"}, {"concept_id": "3"}]"#).unwrap();
//!
//! let rows = AlignmentEngine::new().align_local(&toc1, &toc2).unwrap();
//! for row in &rows {
//!     println!("{:?} -> {:?}: {}", row.master_identity(), row.candidate_identity(), row.classification);
//! }
//! assert_eq!(rows[0].classification, Classification::Match);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Records, alignment rows and shared enums
//! - [`alignment`]: Engine, strategies and invariant checks
//! - [`oracle`]: Semantic matcher and combiner capabilities, OpenAI-compatible client
//! - [`parsing`]: Loading TOC JSON
//! - [`render`]: Markdown output
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: HTTP API

pub mod alignment;
pub mod cli;
pub mod core;
pub mod oracle;
pub mod parsing;
pub mod render;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use crate::alignment::{AlignmentEngine, AlignmentError};
pub use crate::core::record::{RawRecord, Record};
pub use crate::core::row::{AlignmentRow, AlignmentSummary, Classification};
pub use crate::core::types::*;
pub use crate::oracle::{OracleError, SemanticMatcher, TocCombiner};
