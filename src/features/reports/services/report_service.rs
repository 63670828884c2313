use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::{ImportResultDto, ReportFormDto};
use crate::features::reports::models::Report;
use crate::features::reports::services::import_service::{self, ReportRow};
use crate::features::reports::services::report_query::{
    filter_and_sort, governorate_options, IncrementalReveal, ReportFilter, SortOption,
};
use crate::modules::datastore::{DatabaseService, Subscription};

/// Revealed prefix of a filtered report list
#[derive(Debug, Clone)]
pub struct ReportPage {
    pub reports: Vec<Report>,
    pub total: usize,
    pub has_more: bool,
}

/// Service for maintenance report operations
pub struct ReportService {
    db: Arc<DatabaseService>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filter: &ReportFilter,
        sort: SortOption,
        reveal: &IncrementalReveal,
    ) -> Result<ReportPage> {
        let reports = self.db.fetch_reports().await?;
        let matched = filter_and_sort(&reports, filter, sort);
        let total = matched.len();

        Ok(ReportPage {
            reports: reveal.window(&matched).to_vec(),
            total,
            has_more: reveal.has_more(total),
        })
    }

    pub async fn get(&self, id: &str) -> Result<Report> {
        self.db
            .fetch_reports()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    pub async fn create(&self, dto: ReportFormDto) -> Result<Report> {
        let new_report = dto.into_new_report(Utc::now())?;
        let report = self.db.add_report(new_report).await?;
        tracing::info!("Created report {} for ATM {}", report.id, report.atm_number);
        Ok(report)
    }

    /// Replace every field of an existing report, keeping its id
    pub async fn update(&self, id: &str, dto: ReportFormDto) -> Result<Report> {
        let report = dto.into_new_report(Utc::now())?.with_id(id.to_string());

        if !self.db.update_report(&report).await? {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }

        tracing::info!("Updated report {}", id);
        Ok(report)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.db.delete_reports(&[id.to_string()]).await? == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }
        tracing::info!("Deleted report {}", id);
        Ok(())
    }

    /// Delete every listed report that exists; unknown ids are ignored
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<usize> {
        let deleted = self.db.delete_reports(ids).await?;
        tracing::info!("Bulk deleted {} of {} reports", deleted, ids.len());
        Ok(deleted)
    }

    /// Add every valid row; invalid rows are reported and skipped
    pub async fn import(&self, rows: &[Map<String, Value>]) -> Result<ImportResultDto> {
        let parsed = import_service::parse_rows(rows);

        let success_count = if parsed.reports.is_empty() {
            0
        } else {
            self.db.add_reports(parsed.reports).await?.len()
        };

        tracing::info!(
            "Imported {} reports, {} rows rejected",
            success_count,
            parsed.errors.len()
        );

        Ok(ImportResultDto {
            success_count,
            errors: parsed.errors,
        })
    }

    pub async fn export(&self, filter: &ReportFilter, sort: SortOption) -> Result<Vec<ReportRow>> {
        let reports = self.db.fetch_reports().await?;
        Ok(import_service::export_rows(&filter_and_sort(
            &reports, filter, sort,
        )))
    }

    pub async fn governorates(&self) -> Result<Vec<String>> {
        let reports = self.db.fetch_reports().await?;
        Ok(governorate_options(&reports))
    }

    /// Live feed of the full report list
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<Report>) + Send + Sync + 'static,
    {
        self.db.subscribe_reports(callback)
    }
}
