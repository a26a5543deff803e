use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::VoteDirection;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EventRanking {
    pub id: i64,
    pub event_id: i64,
    pub competitor_id: i64,
    pub user_id: i64,
    pub ranking: i32,
    pub pay_out: i64,
    pub total_votes: i64,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEventRanking {
    pub event_id: i64,
    pub competitor_id: i64,
    pub user_id: i64,
    pub ranking: i32,
    pub pay_out: i64,
    pub total_votes: i64,
}

impl NewEventRanking {
    pub fn is_paid(&self) -> bool {
        self.pay_out > 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PointLedger {
    pub user_id: i64,
    pub total: i64,
    pub total_lifetime: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery {
    pub event_id: i64,
    pub viewer_id: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A competitor as shown on the leaderboard, with display data joined in from
/// the video, vote and user tables when the store has them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RankedVideo {
    pub rank: i64,
    pub competitor_id: i64,
    pub video_id: i64,
    pub user_id: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub vote_end_date: DateTime<Utc>,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub publisher_name: Option<String>,
    pub boost_count: i64,
    pub viewer_vote: Option<VoteDirection>,
}
