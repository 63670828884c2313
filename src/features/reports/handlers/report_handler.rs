use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    BulkDeleteDto, BulkDeleteResultDto, GovernorateOptionsDto, ImportRequestDto,
    ImportResultDto, ReportFormDto, ReportQueryParams,
};
use crate::features::reports::models::Report;
use crate::features::reports::services::{IncrementalReveal, ReportRow, ReportService};
use crate::shared::constants::{BANK_REVEAL_PAGE_SIZE, REVEAL_PAGE_SIZE};
use crate::shared::sse::snapshot_stream;
use crate::shared::types::{ApiResponse, Meta};

/// List reports, filtered and sorted, revealing `pages` pages of 20 (24 for bank viewers)
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Revealed reports with total and has_more", body = ApiResponse<Vec<Report>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Query(params): Query<ReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<Report>>>> {
    // Bank viewers can also search by category name
    let filter = params.filter(!user.is_admin());
    let page_size = if user.is_admin() {
        REVEAL_PAGE_SIZE
    } else {
        BANK_REVEAL_PAGE_SIZE
    };
    let reveal = IncrementalReveal::with_pages(params.pages.unwrap_or(1)).page_size(page_size);

    let page = service.list(&filter, params.sort, &reveal).await?;
    let meta = Meta::revealed(page.total, page.has_more);
    Ok(Json(ApiResponse::success(Some(page.reports), None, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(
        ("id" = String, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<Report>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn get_report(
    _user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Report>>> {
    let report = service.get(&id).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = ReportFormDto,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<Report>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn create_report(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<ReportFormDto>,
) -> Result<(StatusCode, Json<ApiResponse<Report>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(report),
            Some("Report saved".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    params(
        ("id" = String, Path, description = "Report ID")
    ),
    request_body = ReportFormDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<Report>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn update_report(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<ReportFormDto>,
) -> Result<Json<ApiResponse<Report>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.update(&id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(report),
        Some("Report updated".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    params(
        ("id" = String, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn delete_report(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Report deleted".to_string()),
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/reports/bulk-delete",
    request_body = BulkDeleteDto,
    responses(
        (status = 200, description = "Reports deleted", body = ApiResponse<BulkDeleteResultDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn bulk_delete_reports(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<BulkDeleteDto>,
) -> Result<Json<ApiResponse<BulkDeleteResultDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let deleted = service.bulk_delete(&dto.ids).await?;
    Ok(Json(ApiResponse::success(
        Some(BulkDeleteResultDto { deleted }),
        Some(format!("{} reports deleted", deleted)),
        None,
    )))
}

/// Import spreadsheet rows; invalid rows are skipped and listed in `errors`
#[utoipa::path(
    post,
    path = "/api/reports/import",
    request_body = ImportRequestDto,
    responses(
        (status = 200, description = "Import finished", body = ApiResponse<ImportResultDto>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn import_reports(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<ImportRequestDto>,
) -> Result<Json<ApiResponse<ImportResultDto>>> {
    let result = service.import(&dto.rows).await?;
    let message = format!("Imported {} reports", result.success_count);
    Ok(Json(ApiResponse::success(Some(result), Some(message), None)))
}

/// Export the filtered and sorted list as importable rows
#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Report rows", body = ApiResponse<Vec<ReportRow>>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn export_reports(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    Query(params): Query<ReportQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReportRow>>>> {
    let rows = service.export(&params.filter(false), params.sort).await?;
    let meta = Meta::total(rows.len());
    Ok(Json(ApiResponse::success(Some(rows), None, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/reports/governorates",
    responses(
        (status = 200, description = "Distinct governorates", body = ApiResponse<GovernorateOptionsDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_governorates(
    _user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
) -> Result<Json<ApiResponse<GovernorateOptionsDto>>> {
    let governorates = service.governorates().await?;
    Ok(Json(ApiResponse::success(
        Some(GovernorateOptionsDto { governorates }),
        None,
        None,
    )))
}

/// Live report list: one `reports` event with every report now and after every change
#[utoipa::path(
    get,
    path = "/api/reports/stream",
    responses(
        (status = 200, description = "SSE stream of report snapshots", content_type = "text/event-stream"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn stream_reports(
    _user: AuthenticatedUser,
    State(service): State<Arc<ReportService>>,
) -> Response {
    let (tx, rx) = tokio::sync::watch::channel(None);
    let subscription = service.subscribe(move |reports| {
        tx.send_replace(Some(reports));
    });
    snapshot_stream("reports", rx, subscription).into_response()
}

#[cfg(test)]
mod tests {
    use crate::features::reports::routes;
    use crate::features::reports::services::ReportService;
    use crate::shared::test_helpers::{
        local_database, sample_new_report, with_admin_auth, with_bank_auth,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn report_body(name: &str, governorate: &str) -> Value {
        json!({
            "atm_name": name,
            "atm_number": "ATM-55",
            "serial_number": "SN-55",
            "governorate": governorate,
            "address": "El Horreya Rd",
            "maintenance_date": "2024-05-01",
            "technical_report": "Fixed lighting",
            "before_photos": ["data:image/jpeg;base64,AAAA", ""],
            "category": ["corrective"]
        })
    }

    #[tokio::test]
    async fn test_admin_creates_and_filters_reports() {
        let (_dir, db) = local_database().await;
        let app = with_admin_auth(routes::routes(Arc::new(ReportService::new(db))));
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/reports")
            .json(&report_body("Sidi Gaber", "Alexandria"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Value = response.json();
        assert_eq!(created["data"]["before_photos"].as_array().unwrap().len(), 1);

        server
            .post("/api/reports")
            .json(&report_body("Tahrir", "Cairo"))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = server
            .get("/api/reports")
            .add_query_param("governorate", "Cairo")
            .await
            .json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["meta"]["has_more"], false);
        assert_eq!(body["data"][0]["atm_name"], "Tahrir");

        let body: Value = server.get("/api/reports/governorates").await.json();
        assert_eq!(
            body["data"]["governorates"],
            json!(["Alexandria", "Cairo"])
        );
    }

    #[tokio::test]
    async fn test_create_without_category_is_rejected() {
        let (_dir, db) = local_database().await;
        let app = with_admin_auth(routes::routes(Arc::new(ReportService::new(db))));
        let server = TestServer::new(app).unwrap();

        let mut body = report_body("Heliopolis", "Cairo");
        body["category"] = json!([]);
        server
            .post("/api/reports")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bank_user_reads_but_cannot_write() {
        let (_dir, db) = local_database().await;
        let service = Arc::new(ReportService::new(db));
        let admin = TestServer::new(with_admin_auth(routes::routes(service.clone()))).unwrap();
        let bank = TestServer::new(with_bank_auth(routes::routes(service))).unwrap();

        admin
            .post("/api/reports")
            .json(&report_body("Mohandessin", "Giza"))
            .await
            .assert_status(StatusCode::CREATED);

        // Bank viewers match category names in search
        let body: Value = bank
            .get("/api/reports")
            .add_query_param("search", "corrective")
            .await
            .json();
        assert_eq!(body["meta"]["total"], 1);

        bank.post("/api/reports")
            .json(&report_body("Dokki", "Giza"))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        bank.post("/api/reports/bulk-delete")
            .json(&json!({ "ids": ["report-1"] }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        bank.get("/api/reports/export")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reveal_page_size_depends_on_role() {
        let (_dir, db) = local_database().await;
        db.add_reports(vec![sample_new_report(); 30]).await.unwrap();
        let service = Arc::new(ReportService::new(db));
        let admin = TestServer::new(with_admin_auth(routes::routes(service.clone()))).unwrap();
        let bank = TestServer::new(with_bank_auth(routes::routes(service))).unwrap();

        let body: Value = admin.get("/api/reports").await.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 20);
        assert_eq!(body["meta"]["has_more"], true);

        let body: Value = bank.get("/api/reports").await.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 24);
        assert_eq!(body["meta"]["total"], 30);

        let body: Value = bank
            .get("/api/reports")
            .add_query_param("pages", 2)
            .await
            .json();
        assert_eq!(body["data"].as_array().unwrap().len(), 30);
        assert_eq!(body["meta"]["has_more"], false);
    }

    #[tokio::test]
    async fn test_import_reports_partial_success() {
        let (_dir, db) = local_database().await;
        let app = with_admin_auth(routes::routes(Arc::new(ReportService::new(db))));
        let server = TestServer::new(app).unwrap();

        let body: Value = server
            .post("/api/reports/import")
            .json(&json!({
                "rows": [
                    {
                        "atm_name": "Mansoura Central",
                        "atm_number": "ATM-3",
                        "serial_number": "SN-3",
                        "governorate": "Dakahlia",
                        "address": "El Gomhoria St",
                        "maintenance_date": "15/02/2024",
                        "category": "corrective, modern",
                        "technical_report": "Full refit"
                    },
                    {
                        "atm_name": "Tanta",
                        "atm_number": "ATM-4",
                        "serial_number": "SN-4",
                        "governorate": "Gharbia",
                        "address": "El Bahr St",
                        "maintenance_date": "2024-02-15",
                        "category": "cosmetic",
                        "technical_report": "Paint"
                    }
                ]
            }))
            .await
            .json();

        assert_eq!(body["data"]["success_count"], 1);
        assert_eq!(
            body["data"]["errors"],
            json!(["Row 3: invalid category value(s) 'cosmetic'"])
        );

        let body: Value = server.get("/api/reports/export").await.json();
        assert_eq!(body["data"][0]["category"], "corrective, modern");
        assert_eq!(body["data"][0]["maintenance_date"], "2024-02-15");
    }
}
