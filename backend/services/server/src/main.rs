mod controllers;
mod middleware;
mod state;
mod types;
mod utils;

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use competition::services::PgNotifier;
use competition::store::PgStore;
use competition::{Competition, Config, PayoutTable};
use dotenvy::dotenv;
use log::info;

use crate::controllers::admin_controller::run_payout;
use crate::controllers::competition_controller::{
    apply_vote, get_current_event, get_history, payout_preview, register_competitor,
    withdraw_competitor,
};
use crate::middleware::admin::AdminMiddleware;
use crate::state::AppState;

async fn health() -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/json")
        .body(r#"{"status": "Ok"}"#)
}

async fn run() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::load();

    let store = PgStore::connect(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to create Postgres pool");
    info!("Connected to Postgres Database");

    let table = PayoutTable::load(&config.payout_table_path).expect("Failed to load payout table");
    info!(
        "Payout table loaded: path={}, rank_keys={}, entrant_keys={}",
        config.payout_table_path,
        table.rank_keys().len(),
        table.entrance_keys().len()
    );

    let notifier = PgNotifier::new(store.pool().clone());
    let state = web::Data::new(AppState {
        competition: Competition::new(
            Arc::new(store),
            Arc::new(notifier),
            Arc::new(table),
            config.prize_pool,
        ),
    });
    let admin_token = config.admin_token.clone();

    info!("Starting server on {}", config.bind_addr);
    HttpServer::new(move || {
        let admin_scope = web::scope("/admin")
            .wrap(AdminMiddleware::new(admin_token.clone()))
            .service(run_payout);

        App::new()
            .app_data(state.clone())
            .service(admin_scope)
            .service(get_current_event)
            .service(register_competitor)
            .service(withdraw_competitor)
            .service(apply_vote)
            .service(get_history)
            .service(payout_preview)
            .route("/health", web::get().to(health))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

fn main() -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime");
    runtime.block_on(run())
}
