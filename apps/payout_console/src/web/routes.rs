// apps/payout_console/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::{
  account_handlers, commission_handlers, payout_handlers, settlement_handlers, webhook_handlers,
};

/// Liveness plus a database round trip.
async fn health_check_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  sqlx::query("SELECT 1").execute(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/order-items/{id}")
          .route(
            "/settlement-preview",
            web::get().to(settlement_handlers::settlement_preview_handler),
          )
          .route("/payout", web::post().to(settlement_handlers::request_payout_handler)),
      )
      .service(
        web::scope("/payouts")
          .route("", web::get().to(payout_handlers::list_payouts_handler))
          .route("/stats", web::get().to(payout_handlers::payout_stats_handler))
          .route("/reconcile", web::post().to(payout_handlers::reconcile_handler)),
      )
      .service(
        web::scope("/commission-rates")
          .route("", web::get().to(commission_handlers::list_commission_rates_handler))
          .route(
            "/{category}",
            web::put().to(commission_handlers::upsert_commission_rate_handler),
          ),
      )
      .service(
        web::scope("/sellers/{id}/connected-account")
          .route("", web::post().to(account_handlers::create_account_handler))
          .route("", web::get().to(account_handlers::get_account_handler))
          .route("/refresh", web::post().to(account_handlers::refresh_account_handler))
          .route(
            "/onboarding-link",
            web::post().to(account_handlers::onboarding_link_handler),
          ),
      )
      .service(
        web::scope("/webhooks").route(
          "/processor",
          web::post().to(webhook_handlers::processor_webhook_handler),
        ),
      ),
  );
}
