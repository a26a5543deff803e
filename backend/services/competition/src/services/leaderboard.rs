use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::scheduler::EventScheduler;
use crate::error::{CompetitionError, Result};
use crate::payout_table::PayoutTable;
use crate::store::CompetitionStore;
use crate::types::{Event, HistoryQuery, RankedVideo};

pub const MAX_HISTORY_LIMIT: i64 = 100;

/// Read side of the competition.
#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn CompetitionStore>,
    scheduler: EventScheduler,
    table: Arc<PayoutTable>,
}

impl Leaderboard {
    pub fn new(
        store: Arc<dyn CompetitionStore>,
        scheduler: EventScheduler,
        table: Arc<PayoutTable>,
    ) -> Self {
        Self {
            store,
            scheduler,
            table,
        }
    }

    pub async fn current_event(&self, now: DateTime<Utc>) -> Result<Event> {
        self.scheduler.get_or_create_active_event(now).await
    }

    pub async fn history(
        &self,
        event_id: i64,
        viewer_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedVideo>> {
        if event_id == 0 {
            return Err(CompetitionError::MissingId("event_id"));
        }
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(CompetitionError::IncorrectValue("limit"));
        }
        if offset < 0 {
            return Err(CompetitionError::IncorrectValue("offset"));
        }

        self.store
            .history(HistoryQuery {
                event_id,
                viewer_id,
                limit,
                offset,
            })
            .await
    }

    /// Per-rank payouts a pool of `prize_pool` points would produce.
    pub fn payout_preview(&self, prize_pool: i64, entrants: u32) -> Result<Vec<i64>> {
        if prize_pool < 0 {
            return Err(CompetitionError::IncorrectValue("prize_pool"));
        }
        Ok(self.table.payouts(prize_pool, entrants))
    }
}
