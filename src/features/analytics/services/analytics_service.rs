use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};

use crate::core::error::Result;
use crate::features::analytics::dtos::{
    AnalyticsBreakdownDto, AnalyticsSummaryDto, BreakdownParams, CategoryCount,
    GovernorateCount, MonthCount,
};
use crate::features::reports::models::{Report, ReportCategory};
use crate::features::reports::services::report_query::{compare_text, governorate_options};
use crate::modules::datastore::DatabaseService;

/// Read-only statistics over the report collection
pub struct AnalyticsService {
    db: Arc<DatabaseService>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn summary(&self) -> Result<AnalyticsSummaryDto> {
        let reports = self.db.fetch_reports().await?;
        Ok(summarize(&reports, Utc::now()))
    }

    pub async fn breakdown(&self, params: &BreakdownParams) -> Result<AnalyticsBreakdownDto> {
        let reports = self.db.fetch_reports().await?;
        Ok(break_down(&reports, params, Utc::now()))
    }
}

pub fn summarize(reports: &[Report], now: DateTime<Utc>) -> AnalyticsSummaryDto {
    // (year, month) keys, newest first after sorting
    let mut months: Vec<((i32, u32), usize)> = Vec::new();
    for report in reports {
        let date = report.maintenance_date;
        let key = (date.year(), date.month());
        match months.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => months.push((key, 1)),
        }
    }
    months.sort_by(|a, b| b.0.cmp(&a.0));

    let current = (now.year(), now.month());

    AnalyticsSummaryDto {
        total: reports.len(),
        corrective: count_with(reports, ReportCategory::Corrective),
        modern: count_with(reports, ReportCategory::Modern),
        this_month: months
            .iter()
            .find(|(k, _)| *k == current)
            .map_or(0, |(_, count)| *count),
        recent_months: months
            .iter()
            .take(3)
            .map(|((year, month), count)| MonthCount {
                month: format!("{:04}-{:02}", year, month),
                count: *count,
            })
            .collect(),
    }
}

pub fn break_down(
    reports: &[Report],
    params: &BreakdownParams,
    now: DateTime<Utc>,
) -> AnalyticsBreakdownDto {
    let governorate = params
        .governorate
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty() && *g != "all");
    let max_age = params.period.max_age_days();

    let selected: Vec<&Report> = reports
        .iter()
        .filter(|r| governorate.is_none_or(|g| r.governorate == g))
        .filter(|r| {
            // Reports dated in the future always fall inside the window
            max_age.is_none_or(|days| {
                (now - r.maintenance_date).num_milliseconds() <= days * 86_400_000
            })
        })
        .collect();

    let by_category: Vec<CategoryCount> = ReportCategory::ALL
        .iter()
        .map(|category| CategoryCount {
            category: *category,
            label: category.label().to_string(),
            count: selected
                .iter()
                .filter(|r| r.has_category(*category))
                .count(),
        })
        .collect();

    let mut by_governorate: Vec<GovernorateCount> = Vec::new();
    for report in &selected {
        match by_governorate
            .iter_mut()
            .find(|g| g.governorate == report.governorate)
        {
            Some(entry) => entry.count += 1,
            None => by_governorate.push(GovernorateCount {
                governorate: report.governorate.clone(),
                count: 1,
            }),
        }
    }
    by_governorate.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| compare_text(&a.governorate, &b.governorate))
    });

    AnalyticsBreakdownDto {
        report_count: selected.len(),
        total_category_instances: by_category.iter().map(|c| c.count).sum(),
        by_category,
        by_governorate,
        governorate_options: governorate_options(reports),
    }
}

fn count_with(reports: &[Report], category: ReportCategory) -> usize {
    reports.iter().filter(|r| r.has_category(category)).count()
}
