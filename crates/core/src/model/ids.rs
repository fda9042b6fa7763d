use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three fixed content domains.
///
/// The serialized names double as the keys of the persisted document, so
/// they must stay stable across releases.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubjectId {
    #[serde(rename = "economie")]
    Economie,
    #[serde(rename = "sociologie")]
    Sociologie,
    #[serde(rename = "science-politique")]
    SciencePolitique,
}

impl SubjectId {
    /// Every supported subject, in canonical order.
    pub const ALL: [SubjectId; 3] = [
        SubjectId::Economie,
        SubjectId::Sociologie,
        SubjectId::SciencePolitique,
    ];

    /// Returns the stable slug for this subject.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectId::Economie => "economie",
            SubjectId::Sociologie => "sociologie",
            SubjectId::SciencePolitique => "science-politique",
        }
    }
}

/// Identifier of a chapter page within a subject.
///
/// Chapter identifiers are slugs chosen by the calling pages (e.g.
/// `"marche-prix"`); unknown values simply name a not-yet-visited chapter.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(String);

impl ChapterId {
    /// Creates a new `ChapterId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a quiz within a subject.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(String);

impl QuizId {
    /// Creates a new `QuizId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.as_str())
    }
}

impl fmt::Debug for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChapterId({})", self.0)
    }
}

impl fmt::Debug for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChapterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<&str> for QuizId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ─── FromStr Implementation ────────────────────────────────────────────────────

/// Error type for parsing a `SubjectId` from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown subject: {raw}")]
pub struct ParseSubjectError {
    raw: String,
}

impl FromStr for SubjectId {
    type Err = ParseSubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectId::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| ParseSubjectError { raw: s.to_string() })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
