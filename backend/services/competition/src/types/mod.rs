pub mod competitor_types;
pub mod event_types;
pub mod notification_types;
pub mod ranking_types;

pub use competitor_types::{Competitor, NewCompetitor, Video, VoteDirection};
pub use event_types::{Event, EventStatus, NewEvent, LEADERBOARD_EVENT_TYPE};
pub use notification_types::{Notification, NotificationObject, Verb};
pub use ranking_types::{EventRanking, HistoryQuery, NewEventRanking, PointLedger, RankedVideo};
