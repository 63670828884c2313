use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::analytics::dtos::{AnalyticsBreakdownDto, AnalyticsSummaryDto, BreakdownParams};
use crate::features::analytics::services::AnalyticsService;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::ApiResponse;

/// Dashboard header figures
#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = "analytics",
    responses(
        (status = 200, description = "Report summary", body = ApiResponse<AnalyticsSummaryDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_summary(
    _user: AuthenticatedUser,
    State(service): State<Arc<AnalyticsService>>,
) -> Result<Json<ApiResponse<AnalyticsSummaryDto>>, AppError> {
    let summary = service.summary().await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}

/// Counts per category and governorate for a period
#[utoipa::path(
    get,
    path = "/api/analytics",
    tag = "analytics",
    params(BreakdownParams),
    responses(
        (status = 200, description = "Report breakdown", body = ApiResponse<AnalyticsBreakdownDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_breakdown(
    _user: AuthenticatedUser,
    State(service): State<Arc<AnalyticsService>>,
    Query(params): Query<BreakdownParams>,
) -> Result<Json<ApiResponse<AnalyticsBreakdownDto>>, AppError> {
    let breakdown = service.breakdown(&params).await?;
    Ok(Json(ApiResponse::success(Some(breakdown), None, None)))
}

#[cfg(test)]
mod tests {
    use crate::features::analytics::{routes, AnalyticsService};
    use crate::shared::test_helpers::{local_database, sample_new_report, with_bank_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_bank_user_reads_analytics() {
        let (_dir, db) = local_database().await;
        db.add_report(sample_new_report()).await.unwrap();
        let app = with_bank_auth(routes(Arc::new(AnalyticsService::new(db))));
        let server = TestServer::new(app).unwrap();

        let body: Value = server.get("/api/analytics/summary").await.json();
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["corrective"], 1);

        let body: Value = server
            .get("/api/analytics")
            .add_query_param("period", "all")
            .await
            .json();
        assert_eq!(body["data"]["total_category_instances"], 1);

        server
            .get("/api/analytics")
            .add_query_param("period", "7d")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
