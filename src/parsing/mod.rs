//! Loading Tables of Contents.
//!
//! A TOC is JSON: either an array of entries, or an object holding that array under
//! `toc` or `items`. Each entry uses the keys
//!
//! | Key | Description | Required |
//! |-----|-------------|----------|
//! | `concept_id` | Dotted hierarchical identity (`"1.2"`) | Yes (checked when aligning) |
//! | `label` | Title | No |
//! | `short_description` | One-line summary | No |
//! | `source_url` | Where the concept came from | No |
//! | `evidence_snippet` | Supporting quote | No |
//!
//! ## Example
//!
//! ```rust
//! use toc_align::parsing::toc::parse_toc_text;
//!
//! let toc = parse_toc_text(r#"[{"concept_id": "1", "label": "Intro"}]"#).unwrap();
//! assert_eq!(toc.len(), 1);
//! ```

pub mod toc;
