use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::error::{CompetitionError, Result};
use crate::store::CompetitionStore;
use crate::types::VoteDirection;

#[derive(Clone)]
pub struct VoteTally {
    store: Arc<dyn CompetitionStore>,
}

impl VoteTally {
    pub fn new(store: Arc<dyn CompetitionStore>) -> Self {
        Self { store }
    }

    pub async fn apply_vote(&self, video_id: i64, direction: VoteDirection) -> Result<bool> {
        self.apply_vote_at(video_id, direction, Utc::now()).await
    }

    /// Counts an already accepted vote towards the video's competitor and its
    /// event. Videos outside any competition and votes after the competitor's
    /// window are skipped without error. Returns whether the tally moved.
    pub async fn apply_vote_at(
        &self,
        video_id: i64,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if video_id == 0 {
            return Err(CompetitionError::MissingId("video_id"));
        }

        let Some(competitor) = self.store.find_competitor_by_video(video_id).await? else {
            debug!("Vote ignored, video not competing: video_id={}", video_id);
            return Ok(false);
        };

        if !competitor.is_vote_updateable(now) {
            debug!(
                "Vote ignored, window closed: competitor_id={}, vote_end_date={}",
                competitor.id, competitor.vote_end_date
            );
            return Ok(false);
        }

        let counted = self
            .store
            .increment_votes(competitor.id, direction, now)
            .await?;

        if counted {
            info!(
                "Vote counted: competitor_id={}, event_id={}, direction={:?}",
                competitor.id, competitor.event_id, direction
            );
        }
        Ok(counted)
    }
}
