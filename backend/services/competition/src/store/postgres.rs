use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use super::CompetitionStore;
use crate::error::Result;
use crate::types::{
    Competitor, Event, EventRanking, HistoryQuery, NewCompetitor, NewEvent, NewEventRanking,
    PointLedger, RankedVideo, VoteDirection, LEADERBOARD_EVENT_TYPE,
};

const EVENT_COLUMNS: &str = "id, title, event_type, start_date, end_date, competitor_count, \
     upvotes, downvotes, is_active, paid_at, created_at";

const COMPETITOR_COLUMNS: &str =
    "id, user_id, video_id, event_id, upvotes, downvotes, vote_end_date, is_active, created_at";

const RANKING_COLUMNS: &str =
    "id, event_id, competitor_id, user_id, ranking, pay_out, total_votes, is_paid, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct HistoryRow {
    rank: i64,
    competitor_id: i64,
    video_id: i64,
    user_id: i64,
    upvotes: i64,
    downvotes: i64,
    vote_end_date: DateTime<Utc>,
    title: Option<String>,
    thumbnail_url: Option<String>,
    publisher_name: Option<String>,
    boost_count: i64,
    viewer_vote: Option<i16>,
}

impl From<HistoryRow> for RankedVideo {
    fn from(row: HistoryRow) -> Self {
        RankedVideo {
            rank: row.rank,
            competitor_id: row.competitor_id,
            video_id: row.video_id,
            user_id: row.user_id,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            vote_end_date: row.vote_end_date,
            title: row.title,
            thumbnail_url: row.thumbnail_url,
            publisher_name: row.publisher_name,
            boost_count: row.boost_count,
            viewer_vote: row
                .viewer_vote
                .and_then(|direction| VoteDirection::try_from(direction).ok()),
        }
    }
}

fn vote_column(direction: VoteDirection) -> &'static str {
    match direction {
        VoteDirection::Up => "upvotes",
        VoteDirection::Down => "downvotes",
    }
}

#[async_trait]
impl CompetitionStore for PgStore {
    async fn find_event_by_title(&self, event_type: &str, title: &str) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE event_type = $1 AND title = $2",
            EVENT_COLUMNS
        ))
        .bind(event_type)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event> {
        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, event_type, start_date, end_date, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (event_type, title) DO NOTHING
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(&event.title)
        .bind(&event.event_type)
        .bind(event.start_date)
        .bind(event.end_date)
        .fetch_optional(&self.pool)
        .await?;

        match created {
            Some(created) => Ok(created),
            None => {
                let existing = sqlx::query_as::<_, Event>(&format!(
                    "SELECT {} FROM events WHERE event_type = $1 AND title = $2",
                    EVENT_COLUMNS
                ))
                .bind(&event.event_type)
                .bind(&event.title)
                .fetch_one(&self.pool)
                .await?;
                Ok(existing)
            }
        }
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn events_pending_payout(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {}
            FROM events
            WHERE event_type = $1
              AND end_date < $2
              AND (
                paid_at IS NULL
                OR EXISTS (
                    SELECT 1
                    FROM competitors c
                    WHERE c.event_id = events.id
                      AND c.is_active
                      AND NOT EXISTS (
                          SELECT 1
                          FROM event_rankings r
                          WHERE r.event_id = c.event_id AND r.competitor_id = c.id
                      )
                )
              )
            ORDER BY end_date ASC, id ASC
            "#,
            EVENT_COLUMNS
        ))
        .bind(LEADERBOARD_EVENT_TYPE)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn mark_event_paid(&self, event_id: i64, paid_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE events SET paid_at = COALESCE(paid_at, $2), is_active = FALSE WHERE id = $1",
        )
            .bind(event_id)
            .bind(paid_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_competitor(&self, competitor: NewCompetitor) -> Result<Option<Competitor>> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Competitor>(&format!(
            r#"
            INSERT INTO competitors (user_id, video_id, event_id, upvotes, downvotes, vote_end_date, is_active)
            VALUES ($1, $2, $3, 0, 0, $4, TRUE)
            ON CONFLICT (video_id, event_id) DO NOTHING
            RETURNING {}
            "#,
            COMPETITOR_COLUMNS
        ))
        .bind(competitor.user_id)
        .bind(competitor.video_id)
        .bind(competitor.event_id)
        .bind(competitor.vote_end_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(created) = created else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE events SET competitor_count = competitor_count + 1 WHERE id = $1")
            .bind(competitor.event_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn find_competitor_by_video(&self, video_id: i64) -> Result<Option<Competitor>> {
        let competitor = sqlx::query_as::<_, Competitor>(&format!(
            r#"
            SELECT {}
            FROM competitors
            WHERE video_id = $1 AND is_active
            ORDER BY id DESC
            LIMIT 1
            "#,
            COMPETITOR_COLUMNS
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(competitor)
    }

    async fn deactivate_competitor(&self, video_id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE competitors SET is_active = FALSE WHERE video_id = $1 AND is_active")
                .bind(video_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_votes(
        &self,
        competitor_id: i64,
        direction: VoteDirection,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let column = vote_column(direction);
        let mut tx = self.pool.begin().await?;

        let event_id: Option<i64> = sqlx::query_scalar(&format!(
            r#"
            UPDATE competitors
            SET {column} = {column} + 1
            WHERE id = $1 AND is_active AND vote_end_date >= $2
            RETURNING event_id
            "#,
            column = column
        ))
        .bind(competitor_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event_id) = event_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query(&format!(
            "UPDATE events SET {column} = {column} + 1 WHERE id = $1",
            column = column
        ))
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn ranked_competitors(&self, event_id: i64) -> Result<Vec<Competitor>> {
        let competitors = sqlx::query_as::<_, Competitor>(&format!(
            r#"
            SELECT {}
            FROM competitors
            WHERE event_id = $1 AND is_active
            ORDER BY upvotes DESC, downvotes ASC, id ASC
            "#,
            COMPETITOR_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(competitors)
    }

    async fn ranking_exists(&self, event_id: i64, competitor_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM event_rankings WHERE event_id = $1 AND competitor_id = $2)",
        )
        .bind(event_id)
        .bind(competitor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn record_payout(&self, ranking: NewEventRanking) -> Result<Option<EventRanking>> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, EventRanking>(&format!(
            r#"
            INSERT INTO event_rankings (event_id, competitor_id, user_id, ranking, pay_out, total_votes, is_paid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (event_id, competitor_id) DO NOTHING
            RETURNING {}
            "#,
            RANKING_COLUMNS
        ))
        .bind(ranking.event_id)
        .bind(ranking.competitor_id)
        .bind(ranking.user_id)
        .bind(ranking.ranking)
        .bind(ranking.pay_out)
        .bind(ranking.total_votes)
        .bind(ranking.is_paid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(created) = created else {
            tx.rollback().await?;
            return Ok(None);
        };

        if ranking.pay_out > 0 {
            sqlx::query(
                r#"
                INSERT INTO points (user_id, total, total_lifetime)
                VALUES ($1, $2, $2)
                ON CONFLICT (user_id) DO UPDATE
                SET total = points.total + EXCLUDED.total,
                    total_lifetime = points.total_lifetime + EXCLUDED.total_lifetime
                "#,
            )
            .bind(ranking.user_id)
            .bind(ranking.pay_out)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn event_rankings(&self, event_id: i64) -> Result<Vec<EventRanking>> {
        let rankings = sqlx::query_as::<_, EventRanking>(&format!(
            "SELECT {} FROM event_rankings WHERE event_id = $1 ORDER BY ranking ASC",
            RANKING_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rankings)
    }

    async fn get_ledger(&self, user_id: i64) -> Result<Option<PointLedger>> {
        let ledger = sqlx::query_as::<_, PointLedger>(
            "SELECT user_id, total, total_lifetime FROM points WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ledger)
    }

    async fn history(&self, query: HistoryQuery) -> Result<Vec<RankedVideo>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT ranked.rank,
                   ranked.id AS competitor_id,
                   ranked.video_id,
                   ranked.user_id,
                   ranked.upvotes,
                   ranked.downvotes,
                   ranked.vote_end_date,
                   v.title,
                   v.thumbnail_url,
                   u.username AS publisher_name,
                   (SELECT COUNT(*) FROM boosts b WHERE b.video_id = ranked.video_id) AS boost_count,
                   viewer.direction AS viewer_vote
            FROM (
                SELECT c.id, c.video_id, c.user_id, c.upvotes, c.downvotes, c.vote_end_date,
                       ROW_NUMBER() OVER (ORDER BY c.upvotes DESC, c.downvotes ASC, c.id ASC) AS rank
                FROM competitors c
                WHERE c.event_id = $1 AND c.is_active
            ) ranked
            LEFT JOIN videos v ON v.id = ranked.video_id
            LEFT JOIN users u ON u.id = ranked.user_id
            LEFT JOIN votes viewer ON viewer.video_id = ranked.video_id AND viewer.user_id = $2
            ORDER BY ranked.rank ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.event_id)
        .bind(query.viewer_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RankedVideo::from).collect())
    }
}
