use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::gateway::{order_hub, OrderGateway};
use crate::metrics::Metrics;

// ============================================================================
// HTTP Server - realtime hub, metrics and health on one listener
// ============================================================================

const SERVICE_NAME: &str = "order-broadcast";

pub async fn run(
    config: AppConfig,
    gateway: web::Data<OrderGateway>,
    metrics: Arc<Metrics>,
) -> std::io::Result<()> {
    let bind_addr = config.bind_addr.clone();
    let config = web::Data::new(config);
    let metrics = web::Data::from(metrics);

    tracing::info!("🌐 Order hub listening on ws://{}/orderHub", bind_addr);
    tracing::info!("📊 Metrics on http://{}/metrics", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(gateway.clone())
            .app_data(config.clone())
            .app_data(metrics.clone())
            .route("/orderHub", web::get().to(order_hub))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}

async fn metrics_handler(metrics: web::Data<Metrics>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(gateway: web::Data<OrderGateway>) -> impl Responder {
    match gateway.connected_clients().await {
        Ok(clients) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "connectedClients": clients,
            "checkedAt": chrono::Utc::now(),
        })),
        Err(e) => {
            tracing::error!("Broadcast hub unreachable: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": SERVICE_NAME,
                "checkedAt": chrono::Utc::now(),
            }))
        }
    }
}
