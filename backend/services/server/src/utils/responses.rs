use actix_web::HttpResponse;
use competition::CompetitionError;
use log::error;
use serde_json::json;

pub fn error_response(err: CompetitionError) -> HttpResponse {
    let message = err.to_string();
    let mut builder = match &err {
        CompetitionError::MissingId(_)
        | CompetitionError::MissingValue(_)
        | CompetitionError::IncorrectValue(_) => HttpResponse::BadRequest(),
        CompetitionError::AlreadyExists(_) | CompetitionError::NotYetClosed { .. } => {
            HttpResponse::Conflict()
        }
        CompetitionError::EventNotFound(_) => HttpResponse::NotFound(),
        CompetitionError::LoadFailure(_) | CompetitionError::Database(_) => {
            error!("Competition request failed: {}", err);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Internal server error"
            }));
        }
    };

    builder.json(json!({
        "status": "error",
        "message": message
    }))
}

pub fn validation_error(err: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "status": "error",
        "message": err.to_string()
    }))
}
