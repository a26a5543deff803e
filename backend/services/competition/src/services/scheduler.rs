use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::{America::Los_Angeles, Tz};
use log::info;

use crate::error::Result;
use crate::store::CompetitionStore;
use crate::types::{Event, NewEvent, LEADERBOARD_EVENT_TYPE};

/// Weeks start on Monday midnight in this zone.
pub const COMPETITION_TIMEZONE: Tz = Los_Angeles;
pub const EVENT_DURATION_HOURS: i64 = 168;

const TITLE_FORMAT: &str = "%Y-%m-%d";

/// The most recent Monday 00:00 in [`COMPETITION_TIMEZONE`] at or before `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&COMPETITION_TIMEZONE).date_naive();
    let days_since_monday = local_date.weekday().number_from_monday() - 1;
    let monday = local_date - Duration::days(days_since_monday as i64);
    let midnight = monday.and_time(NaiveTime::MIN);

    COMPETITION_TIMEZONE
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| COMPETITION_TIMEZONE.from_utc_datetime(&midnight))
        .with_timezone(&Utc)
}

pub fn event_title(week_start: DateTime<Utc>) -> String {
    week_start
        .with_timezone(&COMPETITION_TIMEZONE)
        .format(TITLE_FORMAT)
        .to_string()
}

#[derive(Clone)]
pub struct EventScheduler {
    store: Arc<dyn CompetitionStore>,
}

impl EventScheduler {
    pub fn new(store: Arc<dyn CompetitionStore>) -> Self {
        Self { store }
    }

    /// Returns this week's leaderboard event, creating it on first use.
    pub async fn get_or_create_active_event(&self, now: DateTime<Utc>) -> Result<Event> {
        let start = week_start(now);
        let title = event_title(start);

        if let Some(event) = self
            .store
            .find_event_by_title(LEADERBOARD_EVENT_TYPE, &title)
            .await?
        {
            return Ok(event);
        }

        let event = self
            .store
            .insert_event(NewEvent {
                title,
                event_type: LEADERBOARD_EVENT_TYPE.to_string(),
                start_date: start,
                end_date: start + Duration::hours(EVENT_DURATION_HOURS),
            })
            .await?;

        info!(
            "Leaderboard event ready: event_id={}, title={}, end_date={}",
            event.id, event.title, event.end_date
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::FixedOffset;

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn wednesday_maps_to_preceding_monday_midnight() {
        // Wednesday 2024-05-15 03:00 PDT
        let start = week_start(utc("2024-05-15T10:00:00Z"));
        assert_eq!(start, utc("2024-05-13T07:00:00Z"));
        assert_eq!(event_title(start), "2024-05-13");
    }

    #[test]
    fn input_timezone_does_not_matter() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let instant = tokyo.with_ymd_and_hms(2024, 5, 15, 19, 0, 0).unwrap();
        assert_eq!(
            week_start(instant.with_timezone(&Utc)),
            utc("2024-05-13T07:00:00Z")
        );
    }

    #[test]
    fn sunday_belongs_to_the_week_before() {
        // Sunday 20:00 PDT is already Monday in UTC
        let start = week_start(utc("2024-05-20T03:00:00Z"));
        assert_eq!(start, utc("2024-05-13T07:00:00Z"));
    }

    #[test]
    fn monday_midnight_starts_a_new_week() {
        assert_eq!(
            week_start(utc("2024-05-13T07:00:00Z")),
            utc("2024-05-13T07:00:00Z")
        );
        assert_eq!(
            week_start(utc("2024-05-13T06:59:59Z")),
            utc("2024-05-06T07:00:00Z")
        );
    }

    #[test]
    fn week_start_follows_daylight_saving() {
        // DST began Sunday 2024-03-10
        assert_eq!(
            week_start(utc("2024-03-10T19:00:00Z")),
            utc("2024-03-04T08:00:00Z")
        );
        assert_eq!(
            week_start(utc("2024-03-13T19:00:00Z")),
            utc("2024-03-11T07:00:00Z")
        );
    }

    #[tokio::test]
    async fn same_week_returns_same_event() {
        let scheduler = EventScheduler::new(Arc::new(MemoryStore::new()));

        let monday = scheduler
            .get_or_create_active_event(utc("2024-05-13T08:00:00Z"))
            .await
            .unwrap();
        let sunday = scheduler
            .get_or_create_active_event(utc("2024-05-20T05:00:00Z"))
            .await
            .unwrap();

        assert_eq!(monday.id, sunday.id);
        assert_eq!(monday.title, "2024-05-13");
        assert_eq!(monday.event_type, LEADERBOARD_EVENT_TYPE);
        assert!(monday.is_active);
        assert_eq!(monday.end_date - monday.start_date, Duration::hours(168));
    }

    #[tokio::test]
    async fn next_week_gets_a_new_event() {
        let scheduler = EventScheduler::new(Arc::new(MemoryStore::new()));

        let this_week = scheduler
            .get_or_create_active_event(utc("2024-05-15T10:00:00Z"))
            .await
            .unwrap();
        let next_week = scheduler
            .get_or_create_active_event(utc("2024-05-22T10:00:00Z"))
            .await
            .unwrap();

        assert_ne!(this_week.id, next_week.id);
        assert_eq!(next_week.title, "2024-05-20");
    }
}
