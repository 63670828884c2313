use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;

/// Report routes; every route requires the auth middleware applied by the caller
pub fn routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route(
            "/api/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route("/api/reports/stream", get(handlers::stream_reports))
        .route("/api/reports/governorates", get(handlers::list_governorates))
        .route("/api/reports/export", get(handlers::export_reports))
        .route("/api/reports/import", post(handlers::import_reports))
        .route("/api/reports/bulk-delete", post(handlers::bulk_delete_reports))
        .route(
            "/api/reports/{id}",
            get(handlers::get_report)
                .put(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .with_state(service)
}
