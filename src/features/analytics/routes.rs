use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::analytics::handlers;
use crate::features::analytics::services::AnalyticsService;

pub fn routes(analytics_service: Arc<AnalyticsService>) -> Router {
    Router::new()
        .route("/api/analytics", get(handlers::get_breakdown))
        .route("/api/analytics/summary", get(handlers::get_summary))
        .with_state(analytics_service)
}
