//! Entry whose identifier could not be read.
//!
//! Signals drift in the host's markup. The container holding it is left in
//! its current order; other containers keep working.

use crate::model::identifiers::InvalidEntryId;

/// An entry without a usable identifier attribute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("entry at position {position} has no usable id ({reason})")]
pub struct MalformedEntry {
    position: usize,
    raw_id: Option<String>,
    reason: MalformedReason,
}

/// Why an entry's id was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// The identifier attribute is missing.
    #[error("attribute missing")]
    Missing,
    /// The attribute is present but did not parse.
    #[error("{0}")]
    Invalid(#[from] InvalidEntryId),
}

impl MalformedEntry {
    /// Entry at `position` had no identifier attribute.
    pub fn missing(position: usize) -> Self {
        Self {
            position,
            raw_id: None,
            reason: MalformedReason::Missing,
        }
    }

    /// Entry at `position` carried `raw_id`, which failed to parse.
    pub fn invalid(position: usize, raw_id: impl Into<String>, error: InvalidEntryId) -> Self {
        Self {
            position,
            raw_id: Some(raw_id.into()),
            reason: MalformedReason::Invalid(error),
        }
    }

    /// Zero-based position in the container's child list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The raw attribute value, if one was present.
    pub fn raw_id(&self) -> Option<&str> {
        self.raw_id.as_deref()
    }

    /// Rejection reason.
    pub fn reason(&self) -> &MalformedReason {
        &self.reason
    }
}
