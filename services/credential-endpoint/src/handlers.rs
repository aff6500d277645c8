use crate::errors::EndpointError;
use actix_web::{web, HttpResponse};
use ledger_core::LedgerHandle;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreateUserQuery {
    pub email: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "credential-endpoint",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Mint a credential for `email` and append it to the ledger.
///
/// There is no existence check here: calling twice with the same email
/// leaves two records. Idempotent issuance goes through the reconciler.
pub async fn create_user(
    ledger: web::Data<LedgerHandle>,
    query: web::Query<CreateUserQuery>,
) -> Result<HttpResponse, EndpointError> {
    let email = match query.into_inner().email {
        Some(email) if !email.trim().is_empty() => email,
        _ => return Err(EndpointError::MissingEmail),
    };

    let record = ledger.issue(email).await?;
    info!("Issued credential for {}", record.email);

    Ok(HttpResponse::Ok().json(record))
}

/// Prometheus metrics endpoint
pub async fn metrics(ledger: web::Data<LedgerHandle>) -> Result<HttpResponse, EndpointError> {
    let body = ledger.metrics().encode_text()?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/create_user", web::get().to(create_user))
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics));
}
