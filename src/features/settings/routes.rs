use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::settings::handlers;
use crate::features::settings::services::SettingsService;

pub fn routes(settings_service: Arc<SettingsService>) -> Router {
    Router::new()
        .route(
            "/api/settings/database",
            get(handlers::get_database_settings)
                .put(handlers::save_database_settings)
                .delete(handlers::clear_database_settings),
        )
        .route(
            "/api/settings/database/test",
            post(handlers::test_database_connection),
        )
        .route("/api/settings/database/sync", post(handlers::sync_local_data))
        .with_state(settings_service)
}
