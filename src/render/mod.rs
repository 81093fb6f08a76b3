//! Human-readable renderings of alignment results and combined TOCs.

pub mod markdown;
