use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::core::error::AppError;
use crate::features::reports::models::{NewReport, ReportCategory};
use crate::features::reports::services::{ReportFilter, SortOption};
use crate::shared::constants::MAX_PHOTO_SLOTS;

/// Request DTO for creating or editing a report
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReportFormDto {
    #[validate(
        length(max = 200, message = "ATM name is too long"),
        custom(function = "validate_not_blank", message = "ATM name is required")
    )]
    pub atm_name: String,

    #[validate(
        length(max = 100, message = "ATM number is too long"),
        custom(function = "validate_not_blank", message = "ATM number is required")
    )]
    pub atm_number: String,

    #[validate(
        length(max = 100, message = "Serial number is too long"),
        custom(function = "validate_not_blank", message = "Serial number is required")
    )]
    pub serial_number: String,

    #[validate(
        length(max = 100, message = "Governorate is too long"),
        custom(function = "validate_not_blank", message = "Governorate is required")
    )]
    pub governorate: String,

    #[validate(
        length(max = 500, message = "Address is too long"),
        custom(function = "validate_not_blank", message = "Address is required")
    )]
    pub address: String,

    /// `YYYY-MM-DD` or RFC 3339; defaults to now
    #[serde(default)]
    pub maintenance_date: Option<String>,

    #[validate(custom(function = "validate_not_blank", message = "Technical report is required"))]
    pub technical_report: String,

    #[serde(default)]
    pub notes: String,

    /// Photo slots as data URLs; empty slots are dropped
    #[serde(default)]
    #[validate(custom(function = "validate_photo_slots"))]
    pub before_photos: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_photo_slots"))]
    pub after_photos: Vec<String>,

    #[validate(length(min = 1, message = "Select at least one category"))]
    pub category: Vec<ReportCategory>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Only filled slots count toward the cap
fn validate_photo_slots(photos: &[String]) -> Result<(), ValidationError> {
    if photos.iter().filter(|p| !p.trim().is_empty()).count() > MAX_PHOTO_SLOTS {
        return Err(ValidationError::new("photo_slots")
            .with_message(format!("At most {} photos per section", MAX_PHOTO_SLOTS).into()));
    }
    Ok(())
}

impl ReportFormDto {
    /// Resolve the submitted form against the current instant
    pub fn into_new_report(self, now: DateTime<Utc>) -> Result<NewReport, AppError> {
        let maintenance_date = match self.maintenance_date.as_deref().map(str::trim) {
            None | Some("") => now,
            Some(value) => parse_form_date(value, now).ok_or_else(|| {
                AppError::Validation(format!(
                    "maintenance_date '{}' must be YYYY-MM-DD or RFC 3339",
                    value
                ))
            })?,
        };

        let mut category = Vec::with_capacity(self.category.len());
        for c in self.category {
            if !category.contains(&c) {
                category.push(c);
            }
        }

        Ok(NewReport {
            atm_name: self.atm_name.trim().to_string(),
            atm_number: self.atm_number.trim().to_string(),
            serial_number: self.serial_number.trim().to_string(),
            governorate: self.governorate.trim().to_string(),
            address: self.address.trim().to_string(),
            maintenance_date,
            technical_report: self.technical_report,
            notes: self.notes,
            before_photos: filled_slots(self.before_photos),
            after_photos: filled_slots(self.after_photos),
            category,
        })
    }
}

fn filled_slots(photos: Vec<String>) -> Vec<String> {
    photos.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// A bare date keeps the current UTC time of day
fn parse_form_date(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(now.time()).and_utc())
}

/// Query parameters for listing and exporting reports
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ReportQueryParams {
    /// Case-insensitive search over name, serial, governorate, number and address
    pub search: Option<String>,
    /// Inclusive lower bound (YYYY-MM-DD)
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound (YYYY-MM-DD)
    pub date_to: Option<NaiveDate>,
    pub category: Option<ReportCategory>,
    pub governorate: Option<String>,
    /// Sort order (default: date-desc)
    #[serde(default)]
    pub sort: SortOption,
    /// Number of revealed pages of 20 reports, 24 for bank viewers (default: 1)
    #[param(minimum = 1)]
    pub pages: Option<usize>,
}

impl ReportQueryParams {
    pub fn filter(&self, match_categories: bool) -> ReportFilter {
        ReportFilter {
            search: non_empty(&self.search),
            date_from: self.date_from,
            date_to: self.date_to,
            category: self.category,
            governorate: non_empty(&self.governorate),
            match_categories,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Request DTO for deleting several reports at once
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkDeleteDto {
    #[validate(length(min = 1, message = "Select at least one report"))]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResultDto {
    pub deleted: usize,
}

/// Spreadsheet rows decoded to JSON objects, keyed by column name
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportRequestDto {
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportResultDto {
    pub success_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GovernorateOptionsDto {
    pub governorates: Vec<String>,
}
