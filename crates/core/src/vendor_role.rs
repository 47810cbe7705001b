//! The fixed enumeration of vendor roles a request can target.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A vendor's trade. Stored and serialized in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorRole {
    Photographer,
    Caterer,
    Decorator,
    Musician,
}

impl VendorRole {
    pub const ALL: [VendorRole; 4] = [
        Self::Photographer,
        Self::Caterer,
        Self::Decorator,
        Self::Musician,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photographer => "photographer",
            Self::Caterer => "caterer",
            Self::Decorator => "decorator",
            Self::Musician => "musician",
        }
    }

    /// Parse a role tag, ignoring case and surrounding whitespace.
    pub fn parse(tag: &str) -> Result<Self, CoreError> {
        let wanted = tag.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid vendor role '{tag}'. Must be one of: {}",
                    Self::ALL.map(Self::as_str).join(", ")
                ))
            })
    }
}

impl std::fmt::Display for VendorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VendorRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VendorRole {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(VendorRole::parse("Caterer").unwrap(), VendorRole::Caterer);
        assert_eq!(VendorRole::parse("  MUSICIAN ").unwrap(), VendorRole::Musician);
    }

    #[test]
    fn parse_requires_exact_tag() {
        assert!(VendorRole::parse("cater").is_err());
        assert!(VendorRole::parse("caterers").is_err());
        assert!(VendorRole::parse("").is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&VendorRole::Photographer).unwrap();
        assert_eq!(json, "\"photographer\"");
    }
}
