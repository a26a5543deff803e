pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    Competitor, Event, EventRanking, HistoryQuery, NewCompetitor, NewEvent, NewEventRanking,
    PointLedger, RankedVideo, VoteDirection,
};

/// Everything the competition services persist.
///
/// Each method is its own unit of work: implementations must apply the writes
/// of a single call atomically.
#[async_trait]
pub trait CompetitionStore: Send + Sync {
    async fn find_event_by_title(&self, event_type: &str, title: &str) -> Result<Option<Event>>;

    /// Inserts the event, or returns the existing one with the same type and
    /// title if another caller created it first.
    async fn insert_event(&self, event: NewEvent) -> Result<Event>;

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>>;

    /// Closed events (`end_date < now`) that are unpaid or still have an active
    /// competitor without a ranking, oldest first.
    async fn events_pending_payout(&self, now: DateTime<Utc>) -> Result<Vec<Event>>;

    /// Sets `paid_at` on the first call only and deactivates the event.
    async fn mark_event_paid(&self, event_id: i64, paid_at: DateTime<Utc>) -> Result<()>;

    /// Inserts the competitor and bumps the event's `competitor_count`.
    /// Returns `None` without writing if the video already competes in the event.
    async fn insert_competitor(&self, competitor: NewCompetitor) -> Result<Option<Competitor>>;

    /// The active competitor for a video, if any.
    async fn find_competitor_by_video(&self, video_id: i64) -> Result<Option<Competitor>>;

    /// Soft-deletes the video's active competitor. Returns whether a row changed.
    async fn deactivate_competitor(&self, video_id: i64) -> Result<bool>;

    /// Adds one vote to the competitor and its event in one transaction,
    /// provided `now` is still inside the competitor's vote window.
    /// Returns whether the counters moved.
    async fn increment_votes(
        &self,
        competitor_id: i64,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Active competitors of an event in ranking order: most upvotes first,
    /// then fewest downvotes, then earliest registration.
    async fn ranked_competitors(&self, event_id: i64) -> Result<Vec<Competitor>>;

    async fn ranking_exists(&self, event_id: i64, competitor_id: i64) -> Result<bool>;

    /// Writes the ranking snapshot and credits `pay_out` to the user's ledger
    /// in one transaction. Returns `None` if a ranking for the same event and
    /// competitor already exists, in which case nothing is credited.
    async fn record_payout(&self, ranking: NewEventRanking) -> Result<Option<EventRanking>>;

    async fn event_rankings(&self, event_id: i64) -> Result<Vec<EventRanking>>;

    async fn get_ledger(&self, user_id: i64) -> Result<Option<PointLedger>>;

    async fn history(&self, query: HistoryQuery) -> Result<Vec<RankedVideo>>;
}
