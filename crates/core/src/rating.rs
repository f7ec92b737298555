//! Like/dislike toggle decisions.
//!
//! One vote exists per article and origin address. Repeating the same vote
//! withdraws it, voting the other way flips it.

use quire_common::AppError;
use serde::{Deserialize, Serialize};

/// A single vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingValue {
    /// +1
    Like,
    /// -1
    Dislike,
}

impl RatingValue {
    /// Stored representation.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Like => 1,
            Self::Dislike => -1,
        }
    }

    /// The other vote.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Like),
            -1 => Ok(Self::Dislike),
            other => Err(AppError::Validation(format!(
                "rating value must be 1 or -1, got {other}"
            ))),
        }
    }
}

impl TryFrom<i16> for RatingValue {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

/// What to do with the stored vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTransition {
    /// No vote yet: store the requested one.
    Create(RatingValue),
    /// Opposite vote stored: replace it.
    Update(RatingValue),
    /// Same vote stored: withdraw it.
    Delete,
}

impl RatingTransition {
    /// Decide the transition from the stored vote and the requested one.
    #[must_use]
    pub fn decide(current: Option<RatingValue>, requested: RatingValue) -> Self {
        match current {
            None => Self::Create(requested),
            Some(stored) if stored == requested => Self::Delete,
            Some(_) => Self::Update(requested),
        }
    }

    /// Status reported back to the voter.
    #[must_use]
    pub const fn status(self) -> RatingStatus {
        match self {
            Self::Create(_) => RatingStatus::Created,
            Self::Update(_) => RatingStatus::Updated,
            Self::Delete => RatingStatus::Deleted,
        }
    }

    /// Vote left in storage after the transition.
    #[must_use]
    pub const fn resulting_value(self) -> Option<RatingValue> {
        match self {
            Self::Create(v) | Self::Update(v) => Some(v),
            Self::Delete => None,
        }
    }
}

/// Result status of a vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingStatus {
    Created,
    Updated,
    Deleted,
}

/// Response to a vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingOutcome {
    pub status: RatingStatus,
    /// Net score of the article after the vote.
    pub rating_sum: i64,
}
