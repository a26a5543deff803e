use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

use super::notifier::Notifier;
use crate::error::{CompetitionError, Result};
use crate::payout_table::PayoutTable;
use crate::store::CompetitionStore;
use crate::types::{Competitor, EventRanking, NewEventRanking, Notification};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PayoutFailure {
    pub competitor_id: i64,
    pub user_id: i64,
    pub reason: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PayoutReport {
    pub event_id: i64,
    pub entrants: usize,
    /// Rankings written by this run.
    pub recorded: usize,
    /// Competitors already ranked by an earlier run.
    pub skipped: usize,
    pub failures: Vec<PayoutFailure>,
    pub total_paid_out: i64,
}

/// Closes a finished week: ranks its competitors, splits the prize pool with the
/// payout table, credits the winners and snapshots the final ranking.
#[derive(Clone)]
pub struct PayoutCalculator {
    store: Arc<dyn CompetitionStore>,
    notifier: Arc<dyn Notifier>,
    table: Arc<PayoutTable>,
    prize_pool: i64,
}

impl PayoutCalculator {
    pub fn new(
        store: Arc<dyn CompetitionStore>,
        notifier: Arc<dyn Notifier>,
        table: Arc<PayoutTable>,
        prize_pool: i64,
    ) -> Self {
        Self {
            store,
            notifier,
            table,
            prize_pool,
        }
    }

    pub fn prize_pool(&self) -> i64 {
        self.prize_pool
    }

    pub async fn run_payout(&self, event_id: i64) -> Result<PayoutReport> {
        self.run_payout_at(event_id, Utc::now()).await
    }

    /// Pays out one closed event.
    ///
    /// Safe to re-run: competitors that already have a ranking are skipped, and
    /// a failure for one competitor is logged and does not stop the others. The
    /// event is marked paid once every competitor has been attempted and keeps
    /// its first `paid_at`; the pending sweep picks up whoever failed.
    pub async fn run_payout_at(&self, event_id: i64, now: DateTime<Utc>) -> Result<PayoutReport> {
        if event_id == 0 {
            return Err(CompetitionError::MissingId("event_id"));
        }

        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(CompetitionError::EventNotFound(event_id))?;

        if now <= event.end_date {
            return Err(CompetitionError::NotYetClosed {
                event_id,
                ends_at: event.end_date,
            });
        }

        let competitors = self.store.ranked_competitors(event_id).await?;
        let entrants = u32::try_from(competitors.len()).unwrap_or(u32::MAX);
        let per_rank = self.table.payouts(self.prize_pool, entrants);

        let mut report = PayoutReport {
            event_id,
            entrants: competitors.len(),
            ..Default::default()
        };

        for (idx, competitor) in competitors.iter().enumerate() {
            let payout = per_rank.get(idx).copied().unwrap_or(0);

            match self.settle(competitor, idx + 1, payout).await {
                Ok(Some(ranking)) => {
                    report.recorded += 1;
                    report.total_paid_out += ranking.pay_out;
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    error!(
                        "Payout failed: event_id={}, competitor_id={}, user_id={}, error={}",
                        event_id, competitor.id, competitor.user_id, e
                    );
                    report.failures.push(PayoutFailure {
                        competitor_id: competitor.id,
                        user_id: competitor.user_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.store.mark_event_paid(event_id, now).await?;

        info!(
            "Payout finished: event_id={}, entrants={}, recorded={}, skipped={}, failed={}, total_paid_out={}",
            event_id,
            report.entrants,
            report.recorded,
            report.skipped,
            report.failures.len(),
            report.total_paid_out
        );
        Ok(report)
    }

    pub async fn run_pending_payouts(&self) -> Result<Vec<PayoutReport>> {
        self.run_pending_payouts_at(Utc::now()).await
    }

    /// Runs [`Self::run_payout_at`] for every closed event that is unpaid or
    /// still has unranked competitors from an earlier partial run.
    pub async fn run_pending_payouts_at(&self, now: DateTime<Utc>) -> Result<Vec<PayoutReport>> {
        let events = self.store.events_pending_payout(now).await?;
        info!("Pending payouts: count={}", events.len());

        let mut reports = Vec::with_capacity(events.len());
        for event in events {
            match self.run_payout_at(event.id, now).await {
                Ok(report) => reports.push(report),
                Err(e) => error!("Payout run failed: event_id={}, error={}", event.id, e),
            }
        }
        Ok(reports)
    }

    async fn settle(
        &self,
        competitor: &Competitor,
        rank: usize,
        payout: i64,
    ) -> Result<Option<EventRanking>> {
        if self
            .store
            .ranking_exists(competitor.event_id, competitor.id)
            .await?
        {
            info!(
                "Ranking already recorded, skipping: event_id={}, competitor_id={}",
                competitor.event_id, competitor.id
            );
            return Ok(None);
        }

        let recorded = self
            .store
            .record_payout(NewEventRanking {
                event_id: competitor.event_id,
                competitor_id: competitor.id,
                user_id: competitor.user_id,
                ranking: i32::try_from(rank).unwrap_or(i32::MAX),
                pay_out: payout,
                total_votes: competitor.total_votes(),
            })
            .await?;

        let Some(ranking) = recorded else {
            return Ok(None);
        };

        info!(
            "Ranking recorded: event_id={}, competitor_id={}, ranking={}, pay_out={}",
            ranking.event_id, ranking.competitor_id, ranking.ranking, ranking.pay_out
        );

        if let Err(e) = self
            .notifier
            .notify(Notification::voting_ended(ranking.user_id, ranking.id))
            .await
        {
            warn!(
                "Failed to send voting_ended notification: event_ranking_id={}, error={}",
                ranking.id, e
            );
        }

        Ok(Some(ranking))
    }
}
