use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown exam field: {0}")]
pub struct FieldParseError(String);

/// Topic field a question belongs to. Exam composition is stratified by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Business strategy, legal and corporate topics.
    Strategy,
    /// Project and service management.
    Management,
    /// Computing fundamentals, networks and security.
    Technology,
}

impl Field {
    /// Every field, in canonical order.
    pub const ALL: [Field; 3] = [Field::Strategy, Field::Management, Field::Technology];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Strategy => "strategy",
            Field::Management => "management",
            Field::Technology => "technology",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Field {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FieldParseError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Strategy".parse::<Field>().unwrap(), Field::Strategy);
        assert_eq!(" technology ".parse::<Field>().unwrap(), Field::Technology);
        assert!("marketing".parse::<Field>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Field::Management).unwrap();
        assert_eq!(json, "\"management\"");
    }
}
