use std::sync::Arc;

use competition::services::PgNotifier;
use competition::store::PgStore;
use competition::{Competition, Config, PayoutReport, PayoutTable};
use dotenvy::dotenv;
use log::{error, info, warn};

fn log_report(report: &PayoutReport) {
    info!(
        "Event settled: event_id={}, entrants={}, recorded={}, skipped={}, total_paid_out={}",
        report.event_id, report.entrants, report.recorded, report.skipped, report.total_paid_out
    );
    for failure in &report.failures {
        warn!(
            "Unpaid competitor, rerun to retry: event_id={}, competitor_id={}, user_id={}, reason={}",
            report.event_id, failure.competitor_id, failure.user_id, failure.reason
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::load();

    let store = PgStore::connect(&config.database_url, config.db_max_connections).await?;
    info!("Connected to Postgres Database");

    let table = PayoutTable::load(&config.payout_table_path)?;
    let notifier = PgNotifier::new(store.pool().clone());

    let competition = Competition::new(
        Arc::new(store),
        Arc::new(notifier),
        Arc::new(table),
        config.prize_pool,
    );

    match config.payout_event_id {
        Some(event_id) => {
            info!("Running payout: event_id={}", event_id);
            match competition.payout.run_payout(event_id).await {
                Ok(report) => log_report(&report),
                Err(e) => {
                    error!("Payout failed: event_id={}, error={}", event_id, e);
                    return Err(e.into());
                }
            }
        }
        None => {
            let reports = competition.payout.run_pending_payouts().await?;
            if reports.is_empty() {
                info!("No events waiting for payout");
            }
            reports.iter().for_each(log_report);
        }
    }

    Ok(())
}
