use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::info;

use super::scheduler::{EventScheduler, EVENT_DURATION_HOURS};
use crate::error::{CompetitionError, Result};
use crate::store::CompetitionStore;
use crate::types::{Competitor, NewCompetitor, Video};

/// Enters new videos into the current week's leaderboard.
#[derive(Clone)]
pub struct CompetitorRegistry {
    store: Arc<dyn CompetitionStore>,
    scheduler: EventScheduler,
}

impl CompetitorRegistry {
    pub fn new(store: Arc<dyn CompetitionStore>, scheduler: EventScheduler) -> Self {
        Self { store, scheduler }
    }

    pub async fn register(&self, video: Video) -> Result<Competitor> {
        self.register_at(video, Utc::now()).await
    }

    pub async fn register_at(&self, video: Video, now: DateTime<Utc>) -> Result<Competitor> {
        if video.user_id == 0 {
            return Err(CompetitionError::MissingValue("user_id"));
        }
        if video.id == 0 {
            return Err(CompetitionError::MissingValue("video_id"));
        }

        let event = self.scheduler.get_or_create_active_event(now).await?;

        let competitor = self
            .store
            .insert_competitor(NewCompetitor {
                user_id: video.user_id,
                video_id: video.id,
                event_id: event.id,
                vote_end_date: now + Duration::hours(EVENT_DURATION_HOURS),
            })
            .await?
            .ok_or(CompetitionError::AlreadyExists("video_id"))?;

        info!(
            "Competitor registered: competitor_id={}, video_id={}, event_id={}",
            competitor.id, competitor.video_id, competitor.event_id
        );
        Ok(competitor)
    }

    /// Takes a removed video out of the competition. Unknown videos are ignored.
    pub async fn withdraw(&self, video_id: i64) -> Result<bool> {
        if video_id == 0 {
            return Err(CompetitionError::MissingId("video_id"));
        }

        let withdrawn = self.store.deactivate_competitor(video_id).await?;
        if withdrawn {
            info!("Competitor withdrawn: video_id={}", video_id);
        }
        Ok(withdrawn)
    }
}
