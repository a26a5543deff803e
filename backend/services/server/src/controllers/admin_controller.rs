use actix_web::{post, web, HttpResponse, Responder};
use log::info;
use serde_json::json;

use crate::state::AppState;
use crate::utils::responses::error_response;

#[post("/competition/events/{event_id}/payout")]
pub async fn run_payout(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let event_id = path.into_inner();
    info!("Admin payout requested: event_id={}", event_id);

    match state.competition.payout.run_payout(event_id).await {
        Ok(report) => HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "Payout completed",
            "report": report
        })),
        Err(e) => error_response(e),
    }
}
