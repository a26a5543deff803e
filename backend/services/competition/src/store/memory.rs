use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::CompetitionStore;
use crate::error::Result;
use crate::types::{
    Competitor, Event, EventRanking, HistoryQuery, NewCompetitor, NewEvent, NewEventRanking,
    PointLedger, RankedVideo, VoteDirection,
};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    writes: u64,
    events: BTreeMap<i64, Event>,
    competitors: BTreeMap<i64, Competitor>,
    rankings: BTreeMap<i64, EventRanking>,
    ledgers: HashMap<i64, PointLedger>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Every call holds one lock for its whole body, which
/// gives the same all-or-nothing behaviour as a database transaction.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls that changed state so far.
    pub fn write_count(&self) -> u64 {
        self.state().writes
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ranked(state: &MemoryState, event_id: i64) -> Vec<Competitor> {
    let mut competitors: Vec<Competitor> = state
        .competitors
        .values()
        .filter(|c| c.event_id == event_id && c.is_active)
        .cloned()
        .collect();
    competitors.sort_by(|a, b| {
        b.upvotes
            .cmp(&a.upvotes)
            .then(a.downvotes.cmp(&b.downvotes))
            .then(a.id.cmp(&b.id))
    });
    competitors
}

fn has_unranked(state: &MemoryState, event_id: i64) -> bool {
    state
        .competitors
        .values()
        .filter(|c| c.event_id == event_id && c.is_active)
        .any(|c| {
            !state
                .rankings
                .values()
                .any(|r| r.event_id == event_id && r.competitor_id == c.id)
        })
}

#[async_trait]
impl CompetitionStore for MemoryStore {
    async fn find_event_by_title(&self, event_type: &str, title: &str) -> Result<Option<Event>> {
        let state = self.state();
        Ok(state
            .events
            .values()
            .find(|e| e.event_type == event_type && e.title == title)
            .cloned())
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event> {
        let mut state = self.state();
        if let Some(existing) = state
            .events
            .values()
            .find(|e| e.event_type == event.event_type && e.title == event.title)
        {
            return Ok(existing.clone());
        }

        let id = state.next_id();
        let created = Event {
            id,
            title: event.title,
            event_type: event.event_type,
            start_date: event.start_date,
            end_date: event.end_date,
            competitor_count: 0,
            upvotes: 0,
            downvotes: 0,
            is_active: true,
            paid_at: None,
            created_at: Utc::now(),
        };
        state.events.insert(id, created.clone());
        state.writes += 1;
        Ok(created)
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>> {
        Ok(self.state().events.get(&event_id).cloned())
    }

    async fn events_pending_payout(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let state = self.state();
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.end_date < now && (e.paid_at.is_none() || has_unranked(&state, e.id)))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.end_date, e.id));
        Ok(events)
    }

    async fn mark_event_paid(&self, event_id: i64, paid_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state();
        if let Some(event) = state.events.get_mut(&event_id) {
            event.paid_at.get_or_insert(paid_at);
            event.is_active = false;
            state.writes += 1;
        }
        Ok(())
    }

    async fn insert_competitor(&self, competitor: NewCompetitor) -> Result<Option<Competitor>> {
        let mut state = self.state();
        let duplicate = state
            .competitors
            .values()
            .any(|c| c.video_id == competitor.video_id && c.event_id == competitor.event_id);
        if duplicate {
            return Ok(None);
        }

        let id = state.next_id();
        let created = Competitor {
            id,
            user_id: competitor.user_id,
            video_id: competitor.video_id,
            event_id: competitor.event_id,
            upvotes: 0,
            downvotes: 0,
            vote_end_date: competitor.vote_end_date,
            is_active: true,
            created_at: Utc::now(),
        };
        state.competitors.insert(id, created.clone());
        if let Some(event) = state.events.get_mut(&competitor.event_id) {
            event.competitor_count += 1;
        }
        state.writes += 1;
        Ok(Some(created))
    }

    async fn find_competitor_by_video(&self, video_id: i64) -> Result<Option<Competitor>> {
        let state = self.state();
        Ok(state
            .competitors
            .values()
            .rev()
            .find(|c| c.video_id == video_id && c.is_active)
            .cloned())
    }

    async fn deactivate_competitor(&self, video_id: i64) -> Result<bool> {
        let mut state = self.state();
        let mut changed = false;
        for competitor in state.competitors.values_mut() {
            if competitor.video_id == video_id && competitor.is_active {
                competitor.is_active = false;
                changed = true;
            }
        }
        if changed {
            state.writes += 1;
        }
        Ok(changed)
    }

    async fn increment_votes(
        &self,
        competitor_id: i64,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state();
        let event_id = match state.competitors.get_mut(&competitor_id) {
            Some(competitor) if competitor.is_active && competitor.is_vote_updateable(now) => {
                match direction {
                    VoteDirection::Up => competitor.upvotes += 1,
                    VoteDirection::Down => competitor.downvotes += 1,
                }
                competitor.event_id
            }
            _ => return Ok(false),
        };
        if let Some(event) = state.events.get_mut(&event_id) {
            match direction {
                VoteDirection::Up => event.upvotes += 1,
                VoteDirection::Down => event.downvotes += 1,
            }
        }
        state.writes += 1;
        Ok(true)
    }

    async fn ranked_competitors(&self, event_id: i64) -> Result<Vec<Competitor>> {
        Ok(ranked(&self.state(), event_id))
    }

    async fn ranking_exists(&self, event_id: i64, competitor_id: i64) -> Result<bool> {
        Ok(self
            .state()
            .rankings
            .values()
            .any(|r| r.event_id == event_id && r.competitor_id == competitor_id))
    }

    async fn record_payout(&self, ranking: NewEventRanking) -> Result<Option<EventRanking>> {
        let mut state = self.state();
        let exists = state
            .rankings
            .values()
            .any(|r| r.event_id == ranking.event_id && r.competitor_id == ranking.competitor_id);
        if exists {
            return Ok(None);
        }

        let id = state.next_id();
        let created = EventRanking {
            id,
            event_id: ranking.event_id,
            competitor_id: ranking.competitor_id,
            user_id: ranking.user_id,
            ranking: ranking.ranking,
            pay_out: ranking.pay_out,
            total_votes: ranking.total_votes,
            is_paid: ranking.is_paid(),
            created_at: Utc::now(),
        };
        state.rankings.insert(id, created.clone());

        if ranking.pay_out > 0 {
            let ledger = state
                .ledgers
                .entry(ranking.user_id)
                .or_insert_with(|| PointLedger {
                    user_id: ranking.user_id,
                    total: 0,
                    total_lifetime: 0,
                });
            ledger.total += ranking.pay_out;
            ledger.total_lifetime += ranking.pay_out;
        }
        state.writes += 1;
        Ok(Some(created))
    }

    async fn event_rankings(&self, event_id: i64) -> Result<Vec<EventRanking>> {
        let state = self.state();
        let mut rankings: Vec<EventRanking> = state
            .rankings
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        rankings.sort_by_key(|r| r.ranking);
        Ok(rankings)
    }

    async fn get_ledger(&self, user_id: i64) -> Result<Option<PointLedger>> {
        Ok(self.state().ledgers.get(&user_id).cloned())
    }

    async fn history(&self, query: HistoryQuery) -> Result<Vec<RankedVideo>> {
        let state = self.state();
        let offset = query.offset.max(0) as usize;
        let limit = query.limit.max(0) as usize;
        Ok(ranked(&state, query.event_id)
            .into_iter()
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(idx, c)| RankedVideo {
                rank: idx as i64 + 1,
                competitor_id: c.id,
                video_id: c.video_id,
                user_id: c.user_id,
                upvotes: c.upvotes,
                downvotes: c.downvotes,
                vote_end_date: c.vote_end_date,
                title: None,
                thumbnail_url: None,
                publisher_name: None,
                boost_count: 0,
                viewer_vote: None,
            })
            .collect())
    }
}
