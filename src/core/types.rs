use serde::{Deserialize, Serialize};

/// Which alignment strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Exact identity matching, no external call
    #[default]
    Local,
    /// Correspondence decided by the semantic matcher
    Oracle,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Oracle => write!(f, "oracle"),
        }
    }
}

/// The two input sequences of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceSide {
    /// TOC1, whose order drives the result
    Master,
    /// TOC2
    Candidate,
}

impl std::fmt::Display for SequenceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Master => write!(f, "master"),
            Self::Candidate => write!(f, "candidate"),
        }
    }
}
