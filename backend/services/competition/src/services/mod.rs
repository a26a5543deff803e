pub mod leaderboard;
pub mod notifier;
pub mod payout;
pub mod registry;
pub mod scheduler;
pub mod tally;

pub use leaderboard::Leaderboard;
pub use notifier::{MemoryNotifier, Notifier, PgNotifier};
pub use payout::{PayoutCalculator, PayoutFailure, PayoutReport};
pub use registry::CompetitorRegistry;
pub use scheduler::{week_start, EventScheduler, COMPETITION_TIMEZONE, EVENT_DURATION_HOURS};
pub use tally::VoteTally;
