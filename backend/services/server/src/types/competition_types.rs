use competition::types::VoteDirection;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterCompetitorRequest {
    pub video_id: i64,
    pub user_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApplyVoteRequest {
    pub video_id: i64,
    pub direction: VoteDirection,
    /// Sent by the vote service; the tally uses the competitor's own window.
    pub week_interval: Option<i64>,
}

#[derive(Deserialize, Validate, Debug)]
pub struct HistoryQueryParams {
    #[serde(default)]
    pub user_id: i64,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[validate(range(min = 0, message = "offset must not be negative"))]
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Deserialize, Validate, Debug)]
pub struct PayoutPreviewParams {
    #[validate(range(min = 0, message = "prize_pool must not be negative"))]
    pub prize_pool: Option<i64>,

    pub entrants: u32,
}
