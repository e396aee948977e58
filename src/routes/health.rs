use actix_web::{HttpResponse, get};
use chrono::Utc;

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "time": Utc::now(),
    }))
}
