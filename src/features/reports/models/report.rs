use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maintenance category tag. Records written by the legacy front-end carry the
/// Arabic display labels, which are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ReportCategory {
    #[serde(rename = "corrective", alias = "الديكورات التصحيحية")]
    Corrective,
    #[serde(rename = "modern", alias = "الديكورات الحديثة")]
    Modern,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 2] = [ReportCategory::Corrective, ReportCategory::Modern];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Corrective => "corrective",
            ReportCategory::Modern => "modern",
        }
    }

    /// Arabic display label
    pub fn label(&self) -> &'static str {
        match self {
            ReportCategory::Corrective => "الديكورات التصحيحية",
            ReportCategory::Modern => "الديكورات الحديثة",
        }
    }

    /// Parse either the canonical name (case-insensitive) or the display label
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value) || c.label() == value)
    }
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored maintenance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub id: String,
    pub atm_name: String,
    pub atm_number: String,
    pub serial_number: String,
    pub governorate: String,
    pub address: String,
    pub maintenance_date: DateTime<Utc>,
    pub technical_report: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub before_photos: Vec<String>,
    #[serde(default)]
    pub after_photos: Vec<String>,
    #[serde(default)]
    pub category: Vec<ReportCategory>,
}

impl Report {
    pub fn has_category(&self, category: ReportCategory) -> bool {
        self.category.contains(&category)
    }
}

/// Data for creating a new report; the active backend assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub atm_name: String,
    pub atm_number: String,
    pub serial_number: String,
    pub governorate: String,
    pub address: String,
    pub maintenance_date: DateTime<Utc>,
    pub technical_report: String,
    pub notes: String,
    pub before_photos: Vec<String>,
    pub after_photos: Vec<String>,
    pub category: Vec<ReportCategory>,
}

impl NewReport {
    pub fn with_id(self, id: String) -> Report {
        Report {
            id,
            atm_name: self.atm_name,
            atm_number: self.atm_number,
            serial_number: self.serial_number,
            governorate: self.governorate,
            address: self.address,
            maintenance_date: self.maintenance_date,
            technical_report: self.technical_report,
            notes: self.notes,
            before_photos: self.before_photos,
            after_photos: self.after_photos,
            category: self.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_accepts_names_and_labels() {
        assert_eq!(
            ReportCategory::parse("corrective"),
            Some(ReportCategory::Corrective)
        );
        assert_eq!(ReportCategory::parse(" Modern "), Some(ReportCategory::Modern));
        assert_eq!(
            ReportCategory::parse("الديكورات الحديثة"),
            Some(ReportCategory::Modern)
        );
        assert_eq!(ReportCategory::parse("cosmetic"), None);
    }

    #[test]
    fn test_report_deserializes_legacy_document() {
        let json = r#"{
            "id": "report-1",
            "atm_name": "Nasr City Branch",
            "atm_number": "ATM-104",
            "serial_number": "SN-99812",
            "governorate": "Cairo",
            "address": "12 Abbas El Akkad St",
            "maintenance_date": "2024-05-14T09:30:00.000Z",
            "technical_report": "Replaced fascia panel",
            "category": ["الديكورات التصحيحية"]
        }"#;

        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.category, vec![ReportCategory::Corrective]);
        assert!(report.notes.is_empty());
        assert!(report.before_photos.is_empty());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["category"][0], "corrective");
    }
}
