use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A power profile exposed by the profile provider.
///
/// Variants are declared in rank order, so the derived `Ord` matches
/// power/performance rank: `PowerSaver < Balanced < Performance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileName {
    PowerSaver,
    Balanced,
    Performance,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown power profile: {0:?}")]
pub struct ParseProfileError(pub String);

impl ProfileName {
    pub const ALL: [ProfileName; 3] = [
        ProfileName::PowerSaver,
        ProfileName::Balanced,
        ProfileName::Performance,
    ];

    /// The literal used by the provider and in persisted files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileName::PowerSaver => "power-saver",
            ProfileName::Balanced => "balanced",
            ProfileName::Performance => "performance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileName::PowerSaver => "Power Saver",
            ProfileName::Balanced => "Balanced",
            ProfileName::Performance => "Performance",
        }
    }

    /// Parses a persisted or provider-reported value. Surrounding whitespace is
    /// ignored; anything but an exact literal is rejected.
    pub fn parse_trimmed(s: &str) -> Option<Self> {
        s.trim().parse().ok()
    }
}

impl FromStr for ProfileName {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power-saver" => Ok(ProfileName::PowerSaver),
            "balanced" => Ok(ProfileName::Balanced),
            "performance" => Ok(ProfileName::Performance),
            other => Err(ParseProfileError(other.to_string())),
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(ProfileName::PowerSaver < ProfileName::Balanced);
        assert!(ProfileName::Balanced < ProfileName::Performance);
        assert_eq!(ProfileName::ALL.iter().max(), Some(&ProfileName::Performance));
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!("power-saver".parse(), Ok(ProfileName::PowerSaver));
        assert_eq!("balanced".parse(), Ok(ProfileName::Balanced));
        assert_eq!("performance".parse(), Ok(ProfileName::Performance));
        assert!("Performance".parse::<ProfileName>().is_err());
        assert!("auto".parse::<ProfileName>().is_err());
    }

    #[test]
    fn test_parse_trimmed() {
        assert_eq!(
            ProfileName::parse_trimmed("  balanced\n"),
            Some(ProfileName::Balanced)
        );
        assert_eq!(ProfileName::parse_trimmed("banana\n"), None);
        assert_eq!(ProfileName::parse_trimmed(""), None);
    }

    #[test]
    fn test_display_matches_literal() {
        for profile in ProfileName::ALL {
            assert_eq!(profile.to_string().parse(), Ok(profile));
        }
    }
}
