//! Core identifier newtypes with smart constructors.
//!
//! Raw constructors are never exported - use smart constructors only.

use std::fmt;

/// Identifier of one entry, taken from the host's audit log.
///
/// Ids grow monotonically with entry age, so ascending id order is
/// chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

impl EntryId {
    /// Smart constructor: parses the host's identifier attribute.
    ///
    /// Surrounding whitespace is tolerated; anything that is not a
    /// non-negative integer is rejected.
    pub fn parse(raw: &str) -> Result<Self, InvalidEntryId> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidEntryId::Empty);
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| InvalidEntryId::NotNumeric(raw.to_string()))
    }

    /// The numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of one rendered thread view.
///
/// Used instead of element references so that discarded views can be
/// forgotten without keeping their subtree alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(String);

impl ViewId {
    /// Smart constructor: validates non-empty id
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidViewId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidViewId::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ===== Error Types =====

/// Rejected entry identifier attribute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEntryId {
    /// Attribute present but blank.
    #[error("entry id cannot be empty")]
    Empty,
    /// Attribute is not a non-negative integer.
    #[error("entry id is not numeric: {0:?}")]
    NotNumeric(String),
}

/// Rejected view identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidViewId {
    /// Blank id.
    #[error("view id cannot be empty")]
    Empty,
}

// ===== Tests =====
