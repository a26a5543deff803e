use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::CompetitionError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Competitor {
    pub id: i64,
    pub user_id: i64,
    pub video_id: i64,
    pub event_id: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub vote_end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Competitor {
    /// Votes only move the tally while the competitor's own window is open.
    pub fn is_vote_updateable(&self, now: DateTime<Utc>) -> bool {
        self.id != 0 && now <= self.vote_end_date
    }

    pub fn total_votes(&self) -> i64 {
        self.upvotes + self.downvotes
    }
}

#[derive(Debug, Clone)]
pub struct NewCompetitor {
    pub user_id: i64,
    pub video_id: i64,
    pub event_id: i64,
    pub vote_end_date: DateTime<Utc>,
}

/// The slice of a freshly created video the registry needs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Video {
    pub id: i64,
    pub user_id: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl TryFrom<i16> for VoteDirection {
    type Error = CompetitionError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            _ => Err(CompetitionError::IncorrectValue("direction")),
        }
    }
}
