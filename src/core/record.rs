use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::validation::MAX_IDENTITY_LENGTH;

/// Reasons a TOC entry cannot become a [`Record`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing concept_id")]
    MissingIdentity,

    #[error("concept_id is empty")]
    EmptyIdentity,

    #[error("concept_id exceeds {max} bytes ({0} bytes)", max = MAX_IDENTITY_LENGTH)]
    IdentityTooLong(usize),
}

/// A TOC entry exactly as received from a collaborator (file, HTTP body, oracle).
///
/// Nothing is validated here; convert with [`Record::try_from`] before aligning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_snippet: Option<String>,
}

impl RawRecord {
    /// Raw entry carrying only an identity
    pub fn with_id(concept_id: impl Into<String>) -> Self {
        Self {
            concept_id: Some(concept_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One validated, immutable TOC entry.
///
/// The identity is a dotted hierarchical path (`"1"`, `"1.2"`, ...) whose segment
/// count gives the nesting depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "concept_id")]
    identity: String,

    label: String,

    short_description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    evidence_snippet: Option<String>,
}

impl Record {
    /// Create a record with just an identity
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] if the identity is empty or too long.
    pub fn new(identity: impl Into<String>) -> Result<Self, RecordError> {
        let identity = identity.into();
        validate_identity(&identity)?;
        Ok(Self {
            identity,
            label: String::new(),
            short_description: String::new(),
            source_url: None,
            evidence_snippet: None,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn evidence_snippet(&self) -> Option<&str> {
        self.evidence_snippet.as_deref()
    }

    /// Nesting depth: `"2"` is 1, `"2.3.1"` is 3
    #[must_use]
    pub fn depth(&self) -> usize {
        self.identity.split('.').count()
    }
}

impl TryFrom<RawRecord> for Record {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let identity = raw.concept_id.ok_or(RecordError::MissingIdentity)?;
        validate_identity(&identity)?;

        Ok(Self {
            identity,
            label: raw.label.unwrap_or_default(),
            short_description: raw.short_description.unwrap_or_default(),
            source_url: raw.source_url,
            evidence_snippet: raw.evidence_snippet,
        })
    }
}

impl From<&Record> for RawRecord {
    fn from(record: &Record) -> Self {
        Self {
            concept_id: Some(record.identity.clone()),
            label: Some(record.label.clone()),
            short_description: Some(record.short_description.clone()),
            source_url: record.source_url.clone(),
            evidence_snippet: record.evidence_snippet.clone(),
        }
    }
}

fn validate_identity(identity: &str) -> Result<(), RecordError> {
    if identity.trim().is_empty() {
        return Err(RecordError::EmptyIdentity);
    }
    if identity.len() > MAX_IDENTITY_LENGTH {
        return Err(RecordError::IdentityTooLong(identity.len()));
    }
    Ok(())
}
