use serde::{Deserialize, Serialize};

/// Strategy used to match a free-text value from the logs against a dimension's text key.
///
/// Matching is always evaluated against the dimension candidates in a deterministic order and
/// the first candidate wins. The looser modes trade precision for recall.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TextMatchMode {
    /// Byte-for-byte equality.
    Exact,
    /// Equality after lowercasing both sides.
    #[default]
    CaseInsensitive,
    /// The candidate starts with the probe, ignoring case.
    Prefix,
    /// The candidate contains the probe, ignoring case.
    Substring,
}

impl TextMatchMode {
    /// Returns whether lookups can be served by an equality index.
    pub fn is_equality(&self) -> bool {
        matches!(self, TextMatchMode::Exact | TextMatchMode::CaseInsensitive)
    }

    /// Returns the configuration name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextMatchMode::Exact => "exact",
            TextMatchMode::CaseInsensitive => "case_insensitive",
            TextMatchMode::Prefix => "prefix",
            TextMatchMode::Substring => "substring",
        }
    }
}
