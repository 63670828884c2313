//! Tabular import and export of reports.
//!
//! Rows are JSON objects keyed by the fixed column names. Decoding spreadsheet
//! files into rows happens outside this service.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::features::reports::models::{NewReport, Report, ReportCategory};

/// Columns every imported row must fill
const REQUIRED_COLUMNS: [&str; 8] = [
    "atm_name",
    "atm_number",
    "serial_number",
    "governorate",
    "address",
    "maintenance_date",
    "category",
    "technical_report",
];

/// Day zero of spreadsheet serial dates
const SERIAL_DATE_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// One exported report, in the same column layout the importer accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportRow {
    pub atm_name: String,
    pub atm_number: String,
    pub serial_number: String,
    pub governorate: String,
    pub address: String,
    /// YYYY-MM-DD
    pub maintenance_date: String,
    /// Comma separated category names
    pub category: String,
    pub technical_report: String,
    pub notes: String,
}

impl From<&Report> for ReportRow {
    fn from(report: &Report) -> Self {
        Self {
            atm_name: report.atm_name.clone(),
            atm_number: report.atm_number.clone(),
            serial_number: report.serial_number.clone(),
            governorate: report.governorate.clone(),
            address: report.address.clone(),
            maintenance_date: report.maintenance_date.format("%Y-%m-%d").to_string(),
            category: report
                .category
                .iter()
                .map(ReportCategory::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            technical_report: report.technical_report.clone(),
            notes: report.notes.clone(),
        }
    }
}

/// Valid rows converted to new reports, plus one message per rejected row
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub reports: Vec<NewReport>,
    pub errors: Vec<String>,
}

pub fn parse_rows(rows: &[Map<String, Value>]) -> ParsedRows {
    let mut parsed = ParsedRows::default();
    for (index, row) in rows.iter().enumerate() {
        // Header row plus 1-based numbering
        match parse_row(row, index + 2) {
            Ok(report) => parsed.reports.push(report),
            Err(message) => parsed.errors.push(message),
        }
    }
    parsed
}

pub fn export_rows(reports: &[Report]) -> Vec<ReportRow> {
    reports.iter().map(ReportRow::from).collect()
}

fn parse_row(row: &Map<String, Value>, row_number: usize) -> Result<NewReport, String> {
    if REQUIRED_COLUMNS
        .iter()
        .any(|column| is_blank(row.get(*column)))
    {
        return Err(format!(
            "Row {}: one or more required fields are empty",
            row_number
        ));
    }

    let raw_categories = cell_text(row.get("category"));
    let names: Vec<&str> = raw_categories
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if names.is_empty() {
        return Err(format!("Row {}: category is required", row_number));
    }

    let unknown: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| ReportCategory::parse(name).is_none())
        .collect();
    if !unknown.is_empty() {
        return Err(format!(
            "Row {}: invalid category value(s) '{}'",
            row_number,
            unknown.join(", ")
        ));
    }
    let mut category: Vec<ReportCategory> = Vec::with_capacity(names.len());
    for parsed in names.iter().filter_map(|name| ReportCategory::parse(name)) {
        if !category.contains(&parsed) {
            category.push(parsed);
        }
    }

    let date_cell = row.get("maintenance_date");
    let maintenance_date = parse_date(date_cell).ok_or_else(|| {
        format!(
            "Row {}: invalid date '{}', use YYYY-MM-DD",
            row_number,
            cell_text(date_cell)
        )
    })?;

    Ok(NewReport {
        atm_name: cell_text(row.get("atm_name")),
        atm_number: cell_text(row.get("atm_number")),
        serial_number: cell_text(row.get("serial_number")),
        governorate: cell_text(row.get("governorate")),
        address: cell_text(row.get("address")),
        maintenance_date,
        technical_report: cell_text(row.get("technical_report")),
        notes: if is_blank(row.get("notes")) {
            String::new()
        } else {
            cell_text(row.get("notes"))
        },
        before_photos: Vec::new(),
        after_photos: Vec::new(),
        category,
    })
}

/// Absent, null, empty text, `false` and zero all count as empty
fn is_blank(cell: Option<&Value>) -> bool {
    match cell {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn parse_date(cell: Option<&Value>) -> Option<DateTime<Utc>> {
    match cell? {
        Value::Number(n) => from_serial(n.as_f64()?),
        Value::String(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    text.parse::<f64>().ok().and_then(from_serial)
}

/// Spreadsheet serial day number; the fraction is the time of day
fn from_serial(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let (year, month, day) = SERIAL_DATE_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .checked_add_signed(Duration::milliseconds(millis))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    fn valid_row() -> Map<String, Value> {
        row(json!({
            "atm_name": "Heliopolis Branch",
            "atm_number": 2041,
            "serial_number": "SN-4431",
            "governorate": "Cairo",
            "address": "3 Baghdad St",
            "maintenance_date": "2024-06-01",
            "category": "corrective, الديكورات الحديثة",
            "technical_report": "Replaced card reader bezel",
        }))
    }

    #[test]
    fn test_valid_row_becomes_report() {
        let parsed = parse_rows(&[valid_row()]);

        assert!(parsed.errors.is_empty());
        let report = &parsed.reports[0];
        assert_eq!(report.atm_number, "2041");
        assert_eq!(
            report.category,
            vec![ReportCategory::Corrective, ReportCategory::Modern]
        );
        assert_eq!(
            report.maintenance_date,
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(report.notes.is_empty());
        assert!(report.before_photos.is_empty() && report.after_photos.is_empty());
    }

    #[test]
    fn test_rows_are_numbered_from_two_and_rejected_individually() {
        let mut missing = valid_row();
        missing.insert("address".to_string(), json!(""));
        let mut zero = valid_row();
        zero.insert("atm_number".to_string(), json!(0));
        let mut bad_category = valid_row();
        bad_category.insert("category".to_string(), json!("cosmetic, modern, paint"));
        let mut bad_date = valid_row();
        bad_date.insert("maintenance_date".to_string(), json!("next tuesday"));
        let mut only_commas = valid_row();
        only_commas.insert("category".to_string(), json!(" , ,"));

        let parsed = parse_rows(&[valid_row(), missing, zero, bad_category, bad_date, only_commas]);

        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(
            parsed.errors,
            vec![
                "Row 3: one or more required fields are empty",
                "Row 4: one or more required fields are empty",
                "Row 5: invalid category value(s) 'cosmetic, paint'",
                "Row 6: invalid date 'next tuesday', use YYYY-MM-DD",
                "Row 7: category is required",
            ]
        );
    }

    #[test]
    fn test_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date(Some(&json!("01/06/2024"))), Some(expected));
        assert_eq!(
            parse_date(Some(&json!("2024-06-01T08:15:00Z"))),
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 15, 0).single()
        );
        assert_eq!(
            parse_date(Some(&json!("2024-06-01 08:15:00"))),
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 15, 0).single()
        );
        // 45444 is 2024-06-01 in spreadsheet serial days
        assert_eq!(parse_date(Some(&json!(45444))), Some(expected));
        assert_eq!(
            parse_date(Some(&json!(45444.5))),
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single()
        );
        assert_eq!(parse_date(Some(&json!("2024-13-40"))), None);
    }

    #[test]
    fn test_export_rows_reimport_unchanged() {
        let parsed = parse_rows(&[valid_row()]);
        let report = parsed.reports[0].clone().with_id("report-1".to_string());

        let exported = export_rows(&[report.clone()]);
        assert_eq!(exported[0].maintenance_date, "2024-06-01");
        assert_eq!(exported[0].category, "corrective, modern");

        let as_row = row(serde_json::to_value(&exported[0]).unwrap());
        let reimported = parse_rows(&[as_row]);
        assert!(reimported.errors.is_empty());
        assert_eq!(reimported.reports[0].clone().with_id("report-1".to_string()), report);
    }
}
