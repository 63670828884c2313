use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::settings::dtos::{DatabaseStatusDto, SaveDatabaseConfigDto};
use crate::features::settings::services::SettingsService;
use crate::modules::datastore::SyncSummary;
use crate::shared::types::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/settings/database",
    responses(
        (status = 200, description = "Current storage mode and configuration", body = ApiResponse<DatabaseStatusDto>),
        (status = 403, description = "Admin access required")
    ),
    tag = "settings",
    security(("bearer_auth" = []))
)]
pub async fn get_database_settings(
    _admin: RequireAdmin,
    State(service): State<Arc<SettingsService>>,
) -> Result<Json<ApiResponse<DatabaseStatusDto>>> {
    let status = service.status().await?;
    Ok(Json(ApiResponse::success(Some(status), None, None)))
}

/// Save the remote connection and switch to it
#[utoipa::path(
    put,
    path = "/api/settings/database",
    request_body = SaveDatabaseConfigDto,
    responses(
        (status = 200, description = "Configuration saved; mode shows whether the connection succeeded", body = ApiResponse<DatabaseStatusDto>),
        (status = 400, description = "Invalid configuration"),
        (status = 403, description = "Admin access required")
    ),
    tag = "settings",
    security(("bearer_auth" = []))
)]
pub async fn save_database_settings(
    _admin: RequireAdmin,
    State(service): State<Arc<SettingsService>>,
    AppJson(dto): AppJson<SaveDatabaseConfigDto>,
) -> Result<Json<ApiResponse<DatabaseStatusDto>>> {
    let status = service.save(dto).await?;
    Ok(Json(ApiResponse::success(
        Some(status),
        Some("Database configuration saved".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/settings/database",
    responses(
        (status = 200, description = "Configuration removed, local storage in use", body = ApiResponse<DatabaseStatusDto>),
        (status = 403, description = "Admin access required")
    ),
    tag = "settings",
    security(("bearer_auth" = []))
)]
pub async fn clear_database_settings(
    _admin: RequireAdmin,
    State(service): State<Arc<SettingsService>>,
) -> Result<Json<ApiResponse<DatabaseStatusDto>>> {
    let status = service.clear().await?;
    Ok(Json(ApiResponse::success(
        Some(status),
        Some("Switched to local storage".to_string()),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/settings/database/test",
    responses(
        (status = 200, description = "Remote store reachable"),
        (status = 400, description = "Not connected to the remote store"),
        (status = 502, description = "Remote store query failed"),
        (status = 403, description = "Admin access required")
    ),
    tag = "settings",
    security(("bearer_auth" = []))
)]
pub async fn test_database_connection(
    _admin: RequireAdmin,
    State(service): State<Arc<SettingsService>>,
) -> Result<Json<ApiResponse<()>>> {
    service.test_connection().await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Connection successful".to_string()),
        None,
    )))
}

/// Copy every local report and user to the remote store
#[utoipa::path(
    post,
    path = "/api/settings/database/sync",
    responses(
        (status = 200, description = "Local data merged into the remote store", body = ApiResponse<SyncSummary>),
        (status = 400, description = "Not connected to the remote store"),
        (status = 502, description = "A batch failed; earlier batches stay committed"),
        (status = 403, description = "Admin access required")
    ),
    tag = "settings",
    security(("bearer_auth" = []))
)]
pub async fn sync_local_data(
    _admin: RequireAdmin,
    State(service): State<Arc<SettingsService>>,
) -> Result<Json<ApiResponse<SyncSummary>>> {
    let summary = service.sync().await?;
    let message = format!(
        "Synced {} reports and {} users",
        summary.reports, summary.users
    );
    Ok(Json(ApiResponse::success(Some(summary), Some(message), None)))
}

#[cfg(test)]
mod tests {
    use crate::features::settings::{routes, SettingsService};
    use crate::shared::test_helpers::{local_database, with_admin_auth, with_bank_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_local_mode_status_and_remote_operations() {
        let (_dir, db) = local_database().await;
        let app = with_admin_auth(routes(Arc::new(SettingsService::new(db))));
        let server = TestServer::new(app).unwrap();

        let body: Value = server.get("/api/settings/database").await.json();
        assert_eq!(body["data"]["mode"], "local");
        assert_eq!(body["data"]["configured"], false);

        server
            .post("/api/settings/database/test")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/api/settings/database/sync")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let (_dir, db) = local_database().await;
        let app = with_admin_auth(routes(Arc::new(SettingsService::new(db))));
        let server = TestServer::new(app).unwrap();

        server
            .put("/api/settings/database")
            .json(&json!({ "raw": "apiKey: 'abc'" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let body: Value = server.get("/api/settings/database").await.json();
        assert_eq!(body["data"]["configured"], false);
    }

    #[tokio::test]
    async fn test_bank_user_cannot_touch_settings() {
        let (_dir, db) = local_database().await;
        let app = with_bank_auth(routes(Arc::new(SettingsService::new(db))));
        let server = TestServer::new(app).unwrap();

        server
            .get("/api/settings/database")
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete("/api/settings/database")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
