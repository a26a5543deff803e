use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    VotingEnded,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::VotingEnded => "voting_ended",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "object_type", content = "object_id", rename_all = "snake_case")]
pub enum NotificationObject {
    Video(i64),
    Comment(i64),
    Event(i64),
    EventRanking(i64),
    Competitor(i64),
}

impl NotificationObject {
    pub fn object_type(&self) -> &'static str {
        match self {
            NotificationObject::Video(_) => "video",
            NotificationObject::Comment(_) => "comment",
            NotificationObject::Event(_) => "event",
            NotificationObject::EventRanking(_) => "event_ranking",
            NotificationObject::Competitor(_) => "competitor",
        }
    }

    pub fn object_id(&self) -> i64 {
        match *self {
            NotificationObject::Video(id)
            | NotificationObject::Comment(id)
            | NotificationObject::Event(id)
            | NotificationObject::EventRanking(id)
            | NotificationObject::Competitor(id) => id,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub verb: Verb,
    pub object: NotificationObject,
}

impl Notification {
    pub fn voting_ended(user_id: i64, ranking_id: i64) -> Self {
        Self {
            sender_id: user_id,
            receiver_id: user_id,
            verb: Verb::VotingEnded,
            object: NotificationObject::EventRanking(ranking_id),
        }
    }
}
