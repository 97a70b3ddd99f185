//! The persisted order preference.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Which direction entries are shown in.
///
/// Global to the persistence scope: every view of every thread shares one
/// value. Stored as a JSON boolean where `true` means [`Reversed`].
///
/// [`Reversed`]: OrderPreference::Reversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderPreference {
    /// Oldest first (ascending entry id).
    #[default]
    Default,
    /// Newest first (descending entry id).
    Reversed,
}

impl OrderPreference {
    /// Both variants in toggle display order.
    pub const ALL: [OrderPreference; 2] = [OrderPreference::Default, OrderPreference::Reversed];

    /// Decode a stored value. Absent and `null` mean `Default`.
    ///
    /// Values of any other shape also fall back to `Default`; callers that
    /// care can check [`OrderPreference::is_recognized`] first.
    pub fn from_stored(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => OrderPreference::Reversed,
            _ => OrderPreference::Default,
        }
    }

    /// Whether a stored value has a shape this crate writes.
    pub fn is_recognized(value: Option<&Value>) -> bool {
        matches!(value, None | Some(Value::Null) | Some(Value::Bool(_)))
    }

    /// Encode for the store.
    pub fn to_stored(self) -> Value {
        Value::Bool(self.is_reversed())
    }

    /// True for [`OrderPreference::Reversed`].
    pub fn is_reversed(self) -> bool {
        matches!(self, OrderPreference::Reversed)
    }

    /// Human label shown on the toggle.
    pub fn label(self) -> &'static str {
        match self {
            OrderPreference::Default => "Default Order",
            OrderPreference::Reversed => "Reverse Order",
        }
    }
}

impl fmt::Display for OrderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPreference::Default => f.write_str("default"),
            OrderPreference::Reversed => f.write_str("reversed"),
        }
    }
}

/// Unrecognized preference name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order preference {0:?} (expected \"default\" or \"reversed\")")]
pub struct UnknownPreference(pub String);

impl FromStr for OrderPreference {
    type Err = UnknownPreference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "ascending" => Ok(OrderPreference::Default),
            "reversed" | "reverse" | "descending" => Ok(OrderPreference::Reversed),
            _ => Err(UnknownPreference(s.to_string())),
        }
    }
}
