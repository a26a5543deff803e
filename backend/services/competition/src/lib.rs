//! Weekly video leaderboard.
//!
//! Every video created during a week is entered into that week's leaderboard
//! event. Votes move the competitor's tally until its vote window closes, and
//! once the week is over the payout batch ranks the competitors and splits the
//! prize pool according to the [`PayoutTable`].
//!
//! Persistence goes through [`store::CompetitionStore`]; [`store::PgStore`] is
//! the production implementation and [`store::MemoryStore`] backs tests.

pub mod config;
pub mod error;
pub mod payout_table;
pub mod services;
pub mod store;
pub mod types;

use std::sync::Arc;

pub use config::Config;
pub use error::{CompetitionError, Result};
pub use payout_table::{PayoutTable, PayoutTableError};
pub use services::{
    CompetitorRegistry, EventScheduler, Leaderboard, Notifier, PayoutCalculator, PayoutReport,
    VoteTally,
};
pub use store::CompetitionStore;

/// All competition services wired to one store.
#[derive(Clone)]
pub struct Competition {
    pub scheduler: EventScheduler,
    pub registry: CompetitorRegistry,
    pub tally: VoteTally,
    pub payout: PayoutCalculator,
    pub leaderboard: Leaderboard,
}

impl Competition {
    pub fn new(
        store: Arc<dyn CompetitionStore>,
        notifier: Arc<dyn Notifier>,
        table: Arc<PayoutTable>,
        prize_pool: i64,
    ) -> Self {
        let scheduler = EventScheduler::new(store.clone());
        Self {
            registry: CompetitorRegistry::new(store.clone(), scheduler.clone()),
            tally: VoteTally::new(store.clone()),
            payout: PayoutCalculator::new(store.clone(), notifier, table.clone(), prize_pool),
            leaderboard: Leaderboard::new(store, scheduler.clone(), table),
            scheduler,
        }
    }
}
