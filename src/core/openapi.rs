use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::analytics::{dtos as analytics_dtos, handlers as analytics_handlers};
use crate::features::auth::{dtos as auth_dtos, handlers as auth_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
    services as reports_services,
};
use crate::features::settings::{dtos as settings_dtos, handlers as settings_handlers};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::modules::datastore::SyncSummary;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth_handlers::register,
        auth_handlers::login,
        auth_handlers::get_me,
        // Reports
        reports_handlers::list_reports,
        reports_handlers::get_report,
        reports_handlers::create_report,
        reports_handlers::update_report,
        reports_handlers::delete_report,
        reports_handlers::bulk_delete_reports,
        reports_handlers::import_reports,
        reports_handlers::export_reports,
        reports_handlers::list_governorates,
        reports_handlers::stream_reports,
        // Users (admin)
        users_handlers::list_users,
        users_handlers::create_user,
        users_handlers::update_user,
        users_handlers::delete_user,
        users_handlers::stream_users,
        // Analytics
        analytics_handlers::get_summary,
        analytics_handlers::get_breakdown,
        // Settings (admin)
        settings_handlers::get_database_settings,
        settings_handlers::save_database_settings,
        settings_handlers::clear_database_settings,
        settings_handlers::test_database_connection,
        settings_handlers::sync_local_data,
    ),
    components(
        schemas(
            Meta,
            // ApiResponse<()> omitted: utoipa 5 derive panics on non-path generic args ("TypeTree must have a path")
            // Auth
            auth_dtos::LoginRequestDto,
            auth_dtos::AuthResponseDto,
            auth_dtos::MeResponseDto,
            ApiResponse<auth_dtos::AuthResponseDto>,
            ApiResponse<auth_dtos::MeResponseDto>,
            // Users
            users_models::UserRole,
            users_dtos::UserDto,
            users_dtos::CreateUserDto,
            users_dtos::UpdateUserDto,
            ApiResponse<users_dtos::UserDto>,
            ApiResponse<Vec<users_dtos::UserDto>>,
            // Reports
            reports_models::Report,
            reports_models::ReportCategory,
            reports_services::SortOption,
            reports_services::ReportRow,
            reports_dtos::ReportFormDto,
            reports_dtos::BulkDeleteDto,
            reports_dtos::BulkDeleteResultDto,
            reports_dtos::ImportRequestDto,
            reports_dtos::ImportResultDto,
            reports_dtos::GovernorateOptionsDto,
            ApiResponse<reports_models::Report>,
            ApiResponse<Vec<reports_models::Report>>,
            ApiResponse<Vec<reports_services::ReportRow>>,
            ApiResponse<reports_dtos::BulkDeleteResultDto>,
            ApiResponse<reports_dtos::ImportResultDto>,
            ApiResponse<reports_dtos::GovernorateOptionsDto>,
            // Analytics
            analytics_dtos::Period,
            analytics_dtos::MonthCount,
            analytics_dtos::CategoryCount,
            analytics_dtos::GovernorateCount,
            analytics_dtos::AnalyticsSummaryDto,
            analytics_dtos::AnalyticsBreakdownDto,
            ApiResponse<analytics_dtos::AnalyticsSummaryDto>,
            ApiResponse<analytics_dtos::AnalyticsBreakdownDto>,
            // Settings
            settings_dtos::StorageMode,
            settings_dtos::DatabaseStatusDto,
            settings_dtos::SaveDatabaseConfigDto,
            SyncSummary,
            ApiResponse<settings_dtos::DatabaseStatusDto>,
            ApiResponse<SyncSummary>,
        )
    ),
    tags(
        (name = "auth", description = "Login, registration and current user"),
        (name = "reports", description = "ATM maintenance reports"),
        (name = "users", description = "User management (admin only)"),
        (name = "analytics", description = "Report statistics"),
        (name = "settings", description = "Remote database connection (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "ATM Maintenance API",
        version = "0.1.0",
        description = "API documentation for ATM maintenance reports",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
