// src/models/level.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Text-adaptation tier applied to an article before questions are generated.
/// Stored in `tests.language_level` as its display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifficultyLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[default]
    #[serde(rename = "original")]
    Original,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 7] = [
        DifficultyLevel::Original,
        DifficultyLevel::A1,
        DifficultyLevel::A2,
        DifficultyLevel::B1,
        DifficultyLevel::B2,
        DifficultyLevel::C1,
        DifficultyLevel::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::A1 => "A1",
            DifficultyLevel::A2 => "A2",
            DifficultyLevel::B1 => "B1",
            DifficultyLevel::B2 => "B2",
            DifficultyLevel::C1 => "C1",
            DifficultyLevel::C2 => "C2",
            DifficultyLevel::Original => "original",
        }
    }

    /// Name shown in level pickers.
    pub fn label(&self) -> &'static str {
        match self {
            DifficultyLevel::Original => "No changes",
            other => other.as_str(),
        }
    }

    /// Whether the article text must be rewritten for this level.
    pub fn needs_adaptation(&self) -> bool {
        *self != DifficultyLevel::Original
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown difficulty level '{}'", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for DifficultyLevel {
    type Err = UnknownLevel;

    /// Accepts the stored values case-insensitively, plus the "No changes" label
    /// older rows and forms used for the untouched article.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a1" => Ok(DifficultyLevel::A1),
            "a2" => Ok(DifficultyLevel::A2),
            "b1" => Ok(DifficultyLevel::B1),
            "b2" => Ok(DifficultyLevel::B2),
            "c1" => Ok(DifficultyLevel::C1),
            "c2" => Ok(DifficultyLevel::C2),
            "original" | "no changes" | "" => Ok(DifficultyLevel::Original),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// Lets sqlx decode the TEXT column straight into the enum.
impl TryFrom<String> for DifficultyLevel {
    type Error = UnknownLevel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
