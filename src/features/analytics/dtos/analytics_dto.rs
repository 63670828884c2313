use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::reports::models::ReportCategory;

/// Reporting window measured back from now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Period {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl Period {
    pub fn max_age_days(&self) -> Option<i64> {
        match self {
            Period::All => None,
            Period::Last30Days => Some(30),
            Period::Last90Days => Some(90),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct BreakdownParams {
    /// all, 30d or 90d (default: all)
    #[serde(default)]
    pub period: Period,
    /// Exact governorate; omit or "all" for every governorate
    pub governorate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthCount {
    /// YYYY-MM
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSummaryDto {
    pub total: usize,
    pub corrective: usize,
    pub modern: usize,
    /// Three most recent months that have reports, newest first
    pub recent_months: Vec<MonthCount>,
    pub this_month: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryCount {
    pub category: ReportCategory,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GovernorateCount {
    pub governorate: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsBreakdownDto {
    pub report_count: usize,
    pub by_category: Vec<CategoryCount>,
    /// Sum of category tags; a report with both categories counts twice
    pub total_category_instances: usize,
    /// Busiest governorate first
    pub by_governorate: Vec<GovernorateCount>,
    pub governorate_options: Vec<String>,
}
