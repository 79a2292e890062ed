//! User record and gender enumeration.
//!
//! Users are owned and persisted entirely by the upstream API; this service
//! only passes them through to the rendered pages.

use serde::{Deserialize, Serialize};

/// Gender values accepted by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Wire value `male`.
    Male,
    /// Wire value `female`.
    Female,
}

/// Raised when a submitted gender value matches no known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown gender value")]
pub struct UnknownGender;

impl Gender {
    /// All variants in display order, for select options.
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    /// Wire value sent to and received from the upstream API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Human-readable label for select options.
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(UnknownGender),
        }
    }
}

/// One user as returned by the upstream API.
///
/// The birthdate stays a string on the way through; only user *input* is
/// parsed into a typed date before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Upstream identifier.
    pub id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// ISO `YYYY-MM-DD` date, passed through verbatim.
    pub birthdate: String,
    /// Gender as stored upstream.
    pub gender: Gender,
}
