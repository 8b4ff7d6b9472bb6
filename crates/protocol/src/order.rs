//! Sort keys and directions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Key a listing is ordered by.
///
/// Deserialization is lenient: any unrecognized string becomes
/// [`SortKey::Name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    /// Case-insensitive name, no directory grouping.
    #[default]
    Name,
    /// Directories first, then files by byte size.
    Size,
    /// Modification time, no directory grouping.
    Time,
    /// Directories first, then case-insensitive name.
    Type,
}

impl SortKey {
    /// All keys, in declaration order.
    pub const ALL: [SortKey; 4] = [SortKey::Name, SortKey::Size, SortKey::Time, SortKey::Type];

    /// The lowercase wire name of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Time => "time",
            Self::Type => "type",
        }
    }

    /// Parse a key, falling back to [`SortKey::Name`] for anything unknown.
    pub fn lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "time" => Ok(Self::Time),
            "type" => Ok(Self::Type),
            _ => Err(ProtocolError::UnknownSortKey(s.to_string())),
        }
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        Self::lenient(&s)
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.as_str().to_string()
    }
}

/// Sort key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortOrder {
    /// Key to order by.
    pub key: SortKey,
    /// Reverse the whole sequence after ordering.
    pub reverse: bool,
}

impl SortOrder {
    /// Create a sort order.
    pub fn new(key: SortKey, reverse: bool) -> Self {
        Self { key, reverse }
    }
}
