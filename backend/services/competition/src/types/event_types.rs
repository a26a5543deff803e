use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const LEADERBOARD_EVENT_TYPE: &str = "leaderboard";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub event_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub competitor_count: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub is_active: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn status(&self, now: DateTime<Utc>) -> EventStatus {
        if self.paid_at.is_some() {
            EventStatus::Paid
        } else if now <= self.end_date {
            EventStatus::Open
        } else {
            EventStatus::ClosedPendingPayout
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Open,
    ClosedPendingPayout,
    Paid,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub event_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}
