use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::app::AppState;

/// Health check endpoint
///
/// Reports whether the store answers, plus the current server time.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            log::error!("health check query failed: {}", e);
            "unavailable"
        }
    };

    let body = json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now()
    });

    if database == "ok" {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
