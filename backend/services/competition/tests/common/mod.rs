#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use competition::services::MemoryNotifier;
use competition::types::Video;
use competition::{CompetitionStore, Competition, PayoutTable};

pub const PRIZE_POOL: i64 = 30_000;

pub fn utc(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// Wednesday of the week starting Monday 2024-05-13 (America/Los_Angeles).
pub fn registration_time() -> DateTime<Utc> {
    utc("2024-05-15T10:00:00Z")
}

/// Ranks 1-3 take 60/30/10 percent from three entrants up.
pub fn three_rank_table() -> PayoutTable {
    PayoutTable::from_rows(
        vec![3],
        vec![(1, vec![6000]), (2, vec![3000]), (3, vec![1000])],
    )
    .expect("valid table")
}

pub fn video(id: i64, user_id: i64) -> Video {
    Video { id, user_id }
}

pub fn setup(store: Arc<dyn CompetitionStore>, notifier: MemoryNotifier) -> Competition {
    Competition::new(store, Arc::new(notifier), Arc::new(three_rank_table()), PRIZE_POOL)
}
