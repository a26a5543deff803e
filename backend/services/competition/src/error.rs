use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::payout_table::PayoutTableError;

#[derive(Error, Debug)]
pub enum CompetitionError {
    #[error("Missing id: {0}")]
    MissingId(&'static str),

    #[error("Missing value: {0}")]
    MissingValue(&'static str),

    #[error("Incorrect value: {0}")]
    IncorrectValue(&'static str),

    #[error("Already exists: {0}")]
    AlreadyExists(&'static str),

    #[error("Event {event_id} is still open until {ends_at}")]
    NotYetClosed {
        event_id: i64,
        ends_at: DateTime<Utc>,
    },

    #[error("Event not found: {0}")]
    EventNotFound(i64),

    #[error("Failed to load payout table: {0}")]
    LoadFailure(#[from] PayoutTableError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, CompetitionError>;
