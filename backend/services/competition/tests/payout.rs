mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{registration_time, setup, utc, video, PRIZE_POOL};
use common::three_rank_table;
use competition::services::{MemoryNotifier, Notifier};
use competition::store::MemoryStore;
use competition::types::{
    Competitor, Event, EventRanking, HistoryQuery, NewCompetitor, NewEvent, NewEventRanking,
    Notification, NotificationObject, PointLedger, RankedVideo, Verb, VoteDirection,
};
use competition::{Competition, CompetitionError, CompetitionStore, Result};

/// Week of 2024-05-13 ends 2024-05-20T07:00Z.
fn after_close() -> DateTime<Utc> {
    utc("2024-05-23T12:00:00Z")
}

async fn vote(comp: &Competition, video_id: i64, up: usize, down: usize) {
    let at = registration_time() + Duration::hours(1);
    for _ in 0..up {
        comp.tally.apply_vote_at(video_id, VoteDirection::Up, at).await.unwrap();
    }
    for _ in 0..down {
        comp.tally.apply_vote_at(video_id, VoteDirection::Down, at).await.unwrap();
    }
}

/// Registers three videos ranked user 3, user 2, user 1.
async fn three_competitors(comp: &Competition) -> i64 {
    let now = registration_time();
    let first = comp.registry.register_at(video(10, 1), now).await.unwrap();
    comp.registry.register_at(video(20, 2), now).await.unwrap();
    comp.registry.register_at(video(30, 3), now).await.unwrap();

    vote(comp, 10, 3, 1).await;
    vote(comp, 20, 3, 0).await;
    vote(comp, 30, 7, 2).await;
    first.event_id
}

async fn ledger_total(store: &dyn CompetitionStore, user_id: i64) -> Option<i64> {
    store
        .get_ledger(user_id)
        .await
        .unwrap()
        .map(|ledger| ledger.total)
}

#[tokio::test]
async fn pays_ranked_competitors_from_the_pool() {
    let store = MemoryStore::new();
    let notifier = MemoryNotifier::new();
    let comp = setup(Arc::new(store.clone()), notifier.clone());
    let event_id = three_competitors(&comp).await;

    let report = comp.payout.run_payout_at(event_id, after_close()).await.unwrap();

    assert_eq!(report.entrants, 3);
    assert_eq!(report.recorded, 3);
    assert_eq!(report.skipped, 0);
    assert!(report.failures.is_empty());
    assert_eq!(report.total_paid_out, PRIZE_POOL);

    let rankings = store.event_rankings(event_id).await.unwrap();
    let summary: Vec<(i64, i32, i64, i64, bool)> = rankings
        .iter()
        .map(|r| (r.user_id, r.ranking, r.pay_out, r.total_votes, r.is_paid))
        .collect();
    assert_eq!(
        summary,
        vec![
            (3, 1, 18000, 9, true),
            (2, 2, 9000, 3, true),
            (1, 3, 3000, 4, true),
        ]
    );

    assert_eq!(ledger_total(&store, 3).await, Some(18000));
    assert_eq!(ledger_total(&store, 2).await, Some(9000));
    assert_eq!(ledger_total(&store, 1).await, Some(3000));
    let lifetime = store.get_ledger(3).await.unwrap().unwrap().total_lifetime;
    assert_eq!(lifetime, 18000);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 3);
    for (notification, ranking) in sent.iter().zip(&rankings) {
        assert_eq!(notification.verb, Verb::VotingEnded);
        assert_eq!(notification.receiver_id, ranking.user_id);
        assert_eq!(notification.object, NotificationObject::EventRanking(ranking.id));
        assert_eq!(notification.object.object_type(), "event_ranking");
    }

    let event = store.get_event(event_id).await.unwrap().unwrap();
    assert_eq!(event.paid_at, Some(after_close()));
    assert!(!event.is_active);
}

#[tokio::test]
async fn refuses_to_pay_an_open_event() {
    let store = MemoryStore::new();
    let comp = setup(Arc::new(store.clone()), MemoryNotifier::new());
    let event_id = three_competitors(&comp).await;
    let event = store.get_event(event_id).await.unwrap().unwrap();

    let result = comp.payout.run_payout_at(event_id, event.end_date).await;

    assert!(matches!(
        result,
        Err(CompetitionError::NotYetClosed { event_id: id, .. }) if id == event_id
    ));
    assert!(store.event_rankings(event_id).await.unwrap().is_empty());
    assert_eq!(ledger_total(&store, 3).await, None);
}

#[tokio::test]
async fn unknown_event_is_reported() {
    let comp = setup(Arc::new(MemoryStore::new()), MemoryNotifier::new());
    assert!(matches!(
        comp.payout.run_payout_at(404, after_close()).await,
        Err(CompetitionError::EventNotFound(404))
    ));
    assert!(matches!(
        comp.payout.run_payout_at(0, after_close()).await,
        Err(CompetitionError::MissingId("event_id"))
    ));
}

#[tokio::test]
async fn rerunning_a_payout_changes_nothing() {
    let store = MemoryStore::new();
    let notifier = MemoryNotifier::new();
    let comp = setup(Arc::new(store.clone()), notifier.clone());
    let event_id = three_competitors(&comp).await;

    comp.payout.run_payout_at(event_id, after_close()).await.unwrap();
    let rankings = store.event_rankings(event_id).await.unwrap();

    let rerun = comp
        .payout
        .run_payout_at(event_id, after_close() + Duration::days(1))
        .await
        .unwrap();

    assert_eq!(rerun.recorded, 0);
    assert_eq!(rerun.skipped, 3);
    assert_eq!(rerun.total_paid_out, 0);
    assert_eq!(store.event_rankings(event_id).await.unwrap(), rankings);
    assert_eq!(ledger_total(&store, 3).await, Some(18000));
    assert_eq!(ledger_total(&store, 1).await, Some(3000));
    assert_eq!(notifier.sent().len(), 3);

    let event = store.get_event(event_id).await.unwrap().unwrap();
    assert_eq!(event.paid_at, Some(after_close()));
}

#[tokio::test]
async fn ranks_past_the_table_are_recorded_unpaid() {
    let store = MemoryStore::new();
    let comp = setup(Arc::new(store.clone()), MemoryNotifier::new());
    let event_id = three_competitors(&comp).await;
    comp.registry
        .register_at(video(40, 4), registration_time())
        .await
        .unwrap();

    let report = comp.payout.run_payout_at(event_id, after_close()).await.unwrap();

    assert_eq!(report.entrants, 4);
    let last = store.event_rankings(event_id).await.unwrap().pop().unwrap();
    assert_eq!((last.user_id, last.ranking, last.pay_out), (4, 4, 0));
    assert!(!last.is_paid);
    assert_eq!(ledger_total(&store, 4).await, None);
}

#[tokio::test]
async fn empty_event_is_closed_without_rankings() {
    let store = MemoryStore::new();
    let comp = setup(Arc::new(store.clone()), MemoryNotifier::new());
    let event = comp
        .scheduler
        .get_or_create_active_event(registration_time())
        .await
        .unwrap();

    let report = comp.payout.run_payout_at(event.id, after_close()).await.unwrap();

    assert_eq!(report.entrants, 0);
    assert_eq!(report.recorded, 0);
    assert!(store.get_event(event.id).await.unwrap().unwrap().paid_at.is_some());
}

#[tokio::test]
async fn pending_sweep_pays_only_closed_events() {
    let store = MemoryStore::new();
    let comp = setup(Arc::new(store.clone()), MemoryNotifier::new());
    let closed = three_competitors(&comp).await;
    let open = comp
        .registry
        .register_at(video(50, 5), utc("2024-05-22T10:00:00Z"))
        .await
        .unwrap()
        .event_id;
    assert_ne!(closed, open);

    let reports = comp.payout.run_pending_payouts_at(after_close()).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].event_id, closed);
    assert!(store.get_event(open).await.unwrap().unwrap().paid_at.is_none());
    assert!(store.events_pending_payout(after_close()).await.unwrap().is_empty());
}

/// Delegates to a [`MemoryStore`] but fails ledger writes for one user while armed.
struct FlakyStore {
    inner: MemoryStore,
    failing_user: i64,
    armed: AtomicBool,
}

#[async_trait]
impl CompetitionStore for FlakyStore {
    async fn find_event_by_title(&self, event_type: &str, title: &str) -> Result<Option<Event>> {
        self.inner.find_event_by_title(event_type, title).await
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event> {
        self.inner.insert_event(event).await
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>> {
        self.inner.get_event(event_id).await
    }

    async fn events_pending_payout(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.inner.events_pending_payout(now).await
    }

    async fn mark_event_paid(&self, event_id: i64, paid_at: DateTime<Utc>) -> Result<()> {
        self.inner.mark_event_paid(event_id, paid_at).await
    }

    async fn insert_competitor(&self, competitor: NewCompetitor) -> Result<Option<Competitor>> {
        self.inner.insert_competitor(competitor).await
    }

    async fn find_competitor_by_video(&self, video_id: i64) -> Result<Option<Competitor>> {
        self.inner.find_competitor_by_video(video_id).await
    }

    async fn deactivate_competitor(&self, video_id: i64) -> Result<bool> {
        self.inner.deactivate_competitor(video_id).await
    }

    async fn increment_votes(
        &self,
        competitor_id: i64,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.inner.increment_votes(competitor_id, direction, now).await
    }

    async fn ranked_competitors(&self, event_id: i64) -> Result<Vec<Competitor>> {
        self.inner.ranked_competitors(event_id).await
    }

    async fn ranking_exists(&self, event_id: i64, competitor_id: i64) -> Result<bool> {
        self.inner.ranking_exists(event_id, competitor_id).await
    }

    async fn record_payout(&self, ranking: NewEventRanking) -> Result<Option<EventRanking>> {
        if ranking.user_id == self.failing_user && self.armed.load(Ordering::SeqCst) {
            return Err(CompetitionError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.record_payout(ranking).await
    }

    async fn event_rankings(&self, event_id: i64) -> Result<Vec<EventRanking>> {
        self.inner.event_rankings(event_id).await
    }

    async fn get_ledger(&self, user_id: i64) -> Result<Option<PointLedger>> {
        self.inner.get_ledger(user_id).await
    }

    async fn history(&self, query: HistoryQuery) -> Result<Vec<RankedVideo>> {
        self.inner.history(query).await
    }
}

#[tokio::test]
async fn one_failed_competitor_does_not_stop_the_batch() {
    let flaky = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        failing_user: 2,
        armed: AtomicBool::new(true),
    });
    let comp = setup(flaky.clone(), MemoryNotifier::new());
    let event_id = three_competitors(&comp).await;

    let report = comp.payout.run_payout_at(event_id, after_close()).await.unwrap();

    assert_eq!(report.recorded, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, 2);
    assert_eq!(ledger_total(flaky.as_ref(), 3).await, Some(18000));
    assert_eq!(ledger_total(flaky.as_ref(), 2).await, None);
    assert_eq!(ledger_total(flaky.as_ref(), 1).await, Some(3000));
    assert!(flaky.get_event(event_id).await.unwrap().unwrap().paid_at.is_some());

    let pending = flaky.events_pending_payout(after_close()).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, event_id);

    flaky.armed.store(false, Ordering::SeqCst);
    let reports = comp.payout.run_pending_payouts_at(after_close()).await.unwrap();
    assert_eq!(reports.len(), 1);
    let retry = &reports[0];

    assert_eq!(retry.event_id, event_id);
    assert_eq!(retry.recorded, 1);
    assert_eq!(retry.skipped, 2);
    assert!(retry.failures.is_empty());
    assert_eq!(ledger_total(flaky.as_ref(), 2).await, Some(9000));
    assert_eq!(ledger_total(flaky.as_ref(), 3).await, Some(18000));
    let ranks: Vec<i32> = flaky
        .event_rankings(event_id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.ranking)
        .collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

struct UnreachableNotifier;

#[async_trait]
impl Notifier for UnreachableNotifier {
    async fn notify(&self, _notification: Notification) -> Result<()> {
        Err(CompetitionError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn notification_failure_keeps_the_payout() {
    let store = MemoryStore::new();
    let comp = Competition::new(
        Arc::new(store.clone()),
        Arc::new(UnreachableNotifier),
        Arc::new(three_rank_table()),
        PRIZE_POOL,
    );
    let event_id = three_competitors(&comp).await;

    let report = comp.payout.run_payout_at(event_id, after_close()).await.unwrap();

    assert_eq!(report.recorded, 3);
    assert!(report.failures.is_empty());
    assert_eq!(report.total_paid_out, PRIZE_POOL);
    assert_eq!(store.event_rankings(event_id).await.unwrap().len(), 3);
    assert_eq!(ledger_total(&store, 3).await, Some(18000));
    assert_eq!(ledger_total(&store, 2).await, Some(9000));
    assert_eq!(ledger_total(&store, 1).await, Some(3000));
}
