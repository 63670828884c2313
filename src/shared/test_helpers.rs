#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};
#[cfg(test)]
use chrono::{TimeZone, Utc};
#[cfg(test)]
use fake::faker::address::en::{CityName, StreetName};
#[cfg(test)]
use fake::faker::company::en::CompanyName;
#[cfg(test)]
use fake::Fake;
#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;
#[cfg(test)]
use crate::features::reports::models::{NewReport, Report, ReportCategory};
#[cfg(test)]
use crate::features::users::models::UserRole;
#[cfg(test)]
use crate::modules::datastore::{DatabaseService, DatastoreSettings, LocalStore};

#[cfg(test)]
pub fn admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "user-1".to_string(),
        username: "admin".to_string(),
        name: "Test Admin".to_string(),
        role: UserRole::Admin,
    }
}

#[cfg(test)]
pub fn bank_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "user-2".to_string(),
        username: "bank".to_string(),
        name: "Test Bank".to_string(),
        role: UserRole::Bank,
    }
}

#[cfg(test)]
async fn inject_admin_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(admin_user());
    next.run(request).await
}

#[cfg(test)]
async fn inject_bank_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(bank_user());
    next.run(request).await
}

/// Router whose requests arrive authenticated as an admin
#[cfg(test)]
pub fn with_admin_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_admin_middleware))
}

#[cfg(test)]
pub fn with_bank_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_bank_middleware))
}

/// Empty local-mode database in a temporary directory. Keep the `TempDir` alive
/// for the duration of the test.
#[cfg(test)]
pub async fn local_database() -> (TempDir, Arc<DatabaseService>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = LocalStore::open(dir.path()).await.expect("local store");
    let settings = DatastoreSettings {
        poll_interval: Duration::from_secs(3600),
        seed_demo_data: false,
    };
    let db = DatabaseService::init(Arc::new(store), settings)
        .await
        .expect("database service");
    (dir, db)
}

#[cfg(test)]
pub fn sample_new_report() -> NewReport {
    NewReport {
        atm_name: "Nasr City Branch".to_string(),
        atm_number: "ATM-104".to_string(),
        serial_number: "SN-99812".to_string(),
        governorate: "Cairo".to_string(),
        address: "12 Abbas El Akkad St".to_string(),
        maintenance_date: Utc.with_ymd_and_hms(2024, 5, 14, 9, 30, 0).unwrap(),
        technical_report: "Replaced fascia panel".to_string(),
        notes: String::new(),
        before_photos: vec![],
        after_photos: vec![],
        category: vec![ReportCategory::Corrective],
    }
}

/// `count` generated reports with unique ids
#[cfg(test)]
pub fn fake_reports(count: usize) -> Vec<Report> {
    (0..count)
        .map(|i| {
            let mut report = sample_new_report().with_id(format!("report-fake-{}", i));
            report.atm_name = CompanyName().fake();
            report.governorate = CityName().fake();
            report.address = StreetName().fake();
            report.serial_number = format!("SN-{}", (10_000..99_999).fake::<u32>());
            report.maintenance_date =
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours((0..8_000).fake::<i64>());
            report
        })
        .collect()
}
