use actix_web::{delete, get, post, web, HttpResponse, Responder};
use chrono::Utc;
use competition::types::Video;
use serde_json::json;
use validator::Validate;

use crate::state::AppState;
use crate::types::competition_types::{
    ApplyVoteRequest, HistoryQueryParams, PayoutPreviewParams, RegisterCompetitorRequest,
};
use crate::utils::responses::{error_response, validation_error};

#[get("/competition/events/current")]
pub async fn get_current_event(state: web::Data<AppState>) -> impl Responder {
    match state.competition.leaderboard.current_event(Utc::now()).await {
        Ok(event) => {
            let status = event.status(Utc::now());
            HttpResponse::Ok().json(json!({
                "status": "success",
                "event": event,
                "event_status": status
            }))
        }
        Err(e) => error_response(e),
    }
}

#[post("/competition/competitors")]
pub async fn register_competitor(
    state: web::Data<AppState>,
    req: web::Json<RegisterCompetitorRequest>,
) -> impl Responder {
    let video = Video {
        id: req.video_id,
        user_id: req.user_id,
    };

    match state.competition.registry.register(video).await {
        Ok(competitor) => HttpResponse::Created().json(json!({
            "status": "success",
            "message": "Video entered into this week's competition",
            "competitor": competitor
        })),
        Err(e) => error_response(e),
    }
}

#[delete("/competition/competitors/{video_id}")]
pub async fn withdraw_competitor(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    let video_id = path.into_inner();

    match state.competition.registry.withdraw(video_id).await {
        Ok(withdrawn) => HttpResponse::Ok().json(json!({
            "status": "success",
            "withdrawn": withdrawn
        })),
        Err(e) => error_response(e),
    }
}

#[post("/competition/votes")]
pub async fn apply_vote(
    state: web::Data<AppState>,
    req: web::Json<ApplyVoteRequest>,
) -> impl Responder {
    match state
        .competition
        .tally
        .apply_vote(req.video_id, req.direction)
        .await
    {
        Ok(counted) => HttpResponse::Ok().json(json!({
            "status": "success",
            "counted": counted
        })),
        Err(e) => error_response(e),
    }
}

#[get("/competition/events/{event_id}/history")]
pub async fn get_history(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<HistoryQueryParams>,
) -> impl Responder {
    if let Err(e) = query.validate() {
        return validation_error(e);
    }
    let event_id = path.into_inner();

    match state
        .competition
        .leaderboard
        .history(event_id, query.user_id, query.limit, query.offset)
        .await
    {
        Ok(videos) => HttpResponse::Ok().json(json!({
            "status": "success",
            "event_id": event_id,
            "videos": videos,
            "count": videos.len()
        })),
        Err(e) => error_response(e),
    }
}

#[get("/competition/payouts/preview")]
pub async fn payout_preview(
    state: web::Data<AppState>,
    query: web::Query<PayoutPreviewParams>,
) -> impl Responder {
    if let Err(e) = query.validate() {
        return validation_error(e);
    }
    let prize_pool = query
        .prize_pool
        .unwrap_or_else(|| state.competition.payout.prize_pool());

    match state
        .competition
        .leaderboard
        .payout_preview(prize_pool, query.entrants)
    {
        Ok(payouts) => HttpResponse::Ok().json(json!({
            "status": "success",
            "prize_pool": prize_pool,
            "entrants": query.entrants,
            "payouts": payouts
        })),
        Err(e) => error_response(e),
    }
}
