//! Filtering, sorting and incremental reveal over an in-memory report list.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::reports::models::{Report, ReportCategory};
use crate::shared::constants::{MAX_REVEAL_PAGES, REVEAL_PAGE_SIZE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SortOption {
    #[default]
    #[serde(rename = "date-desc")]
    DateDesc,
    #[serde(rename = "date-asc")]
    DateAsc,
    #[serde(rename = "name-asc")]
    NameAsc,
    #[serde(rename = "name-desc")]
    NameDesc,
    #[serde(rename = "serial-asc")]
    SerialAsc,
    #[serde(rename = "serial-desc")]
    SerialDesc,
}

impl SortOption {
    fn compare(&self, a: &Report, b: &Report) -> Ordering {
        match self {
            SortOption::DateDesc => b.maintenance_date.cmp(&a.maintenance_date),
            SortOption::DateAsc => a.maintenance_date.cmp(&b.maintenance_date),
            SortOption::NameAsc => compare_text(&a.atm_name, &b.atm_name),
            SortOption::NameDesc => compare_text(&b.atm_name, &a.atm_name),
            SortOption::SerialAsc => compare_text(&a.serial_number, &b.serial_number),
            SortOption::SerialDesc => compare_text(&b.serial_number, &a.serial_number),
        }
    }
}

/// Case-folded comparison with code point order as the tie breaker
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub search: Option<String>,
    /// Inclusive, compared against the UTC calendar date
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub category: Option<ReportCategory>,
    pub governorate: Option<String>,
    /// Also match the search term against category names and labels
    pub match_categories: bool,
}

impl ReportFilter {
    pub fn matches(&self, report: &Report) -> bool {
        let date = report.maintenance_date.date_naive();
        if self.date_from.is_some_and(|from| date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| date > to) {
            return false;
        }

        if let Some(category) = self.category {
            if !report.has_category(category) {
                return false;
            }
        }

        if let Some(governorate) = &self.governorate {
            if &report.governorate != governorate {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => self.matches_term(report, &term.to_lowercase()),
        }
    }

    fn matches_term(&self, report: &Report, term: &str) -> bool {
        let fields = [
            &report.atm_name,
            &report.serial_number,
            &report.governorate,
            &report.atm_number,
            &report.address,
        ];
        if fields.iter().any(|f| f.to_lowercase().contains(term)) {
            return true;
        }

        self.match_categories
            && report.category.iter().any(|c| {
                c.as_str().contains(term) || c.label().to_lowercase().contains(term)
            })
    }
}

/// Filtered copy of `reports`, stably sorted
pub fn filter_and_sort(reports: &[Report], filter: &ReportFilter, sort: SortOption) -> Vec<Report> {
    let mut matched: Vec<Report> = reports
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    matched.sort_by(|a, b| sort.compare(a, b));
    matched
}

/// Distinct non-empty governorates in display order
pub fn governorate_options(reports: &[Report]) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for report in reports {
        let governorate = report.governorate.trim();
        if !governorate.is_empty() && !options.iter().any(|g| g == governorate) {
            options.push(governorate.to_string());
        }
    }
    options.sort_by(|a, b| compare_text(a, b));
    options
}

/// Visible prefix of a result list that grows one page at a time.
///
/// Any change of filter or sort criteria shrinks it back to the first page.
#[derive(Debug, Clone)]
pub struct IncrementalReveal {
    pages: usize,
    page_size: usize,
    criteria: Option<(ReportFilter, SortOption)>,
}

impl Default for IncrementalReveal {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalReveal {
    pub fn new() -> Self {
        Self {
            pages: 1,
            page_size: REVEAL_PAGE_SIZE,
            criteria: None,
        }
    }

    /// State with `pages` pages already revealed, clamped to a sane range
    pub fn with_pages(pages: usize) -> Self {
        Self {
            pages: pages.clamp(1, MAX_REVEAL_PAGES),
            page_size: REVEAL_PAGE_SIZE,
            criteria: None,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn visible_count(&self, total: usize) -> usize {
        (self.pages * self.page_size).min(total)
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.visible_count(total) < total
    }

    /// Grow by one page when more items exist. Returns whether anything changed.
    pub fn reveal_more(&mut self, total: usize) -> bool {
        if self.has_more(total) && self.pages < MAX_REVEAL_PAGES {
            self.pages += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.pages = 1;
    }

    /// Record the criteria in effect, resetting when they differ from the last ones
    pub fn set_criteria(&mut self, filter: &ReportFilter, sort: SortOption) {
        let changed = match &self.criteria {
            Some((f, s)) => f != filter || *s != sort,
            None => false,
        };
        if changed {
            self.reset();
        }
        self.criteria = Some((filter.clone(), sort));
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.visible_count(items.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{fake_reports, sample_new_report};
    use chrono::{TimeZone, Utc};

    fn report(id: &str, name: &str, serial: &str, governorate: &str, day: u32) -> Report {
        let mut report = sample_new_report().with_id(id.to_string());
        report.atm_name = name.to_string();
        report.serial_number = serial.to_string();
        report.governorate = governorate.to_string();
        report.maintenance_date = Utc.with_ymd_and_hms(2024, 3, day, 23, 30, 0).unwrap();
        report
    }

    fn ids(reports: &[Report]) -> Vec<&str> {
        reports.iter().map(|r| r.id.as_str()).collect()
    }

    fn fixture() -> Vec<Report> {
        vec![
            report("a", "beta Branch", "SN-2", "Giza", 10),
            report("b", "Alpha Branch", "sn-1", "Cairo", 12),
            report("c", "alpha branch", "SN-3", "Cairo", 11),
        ]
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let sorted = filter_and_sort(&fixture(), &ReportFilter::default(), SortOption::default());
        assert_eq!(ids(&sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_name_sort_is_case_insensitive_and_stable() {
        let sorted = filter_and_sort(&fixture(), &ReportFilter::default(), SortOption::NameAsc);
        // "Alpha Branch" < "alpha branch" on the tie breaker, both before "beta"
        assert_eq!(ids(&sorted), vec!["b", "c", "a"]);

        let sorted = filter_and_sort(&fixture(), &ReportFilter::default(), SortOption::SerialDesc);
        assert_eq!(ids(&sorted), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_descending_sorts_reverse_ascending_ones() {
        let reports: Vec<Report> = fake_reports(30)
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.atm_name = format!("{} {:02}", r.atm_name, i);
                r.serial_number = format!("SN-{:05}", (i * 7919) % 100_000);
                r
            })
            .collect();
        let filter = ReportFilter::default();

        let mut name_asc = filter_and_sort(&reports, &filter, SortOption::NameAsc);
        let name_desc = filter_and_sort(&reports, &filter, SortOption::NameDesc);
        name_asc.reverse();
        assert_eq!(ids(&name_desc), ids(&name_asc));

        let mut serial_asc = filter_and_sort(&reports, &filter, SortOption::SerialAsc);
        let serial_desc = filter_and_sort(&reports, &filter, SortOption::SerialDesc);
        assert!(serial_asc.windows(2).all(|w| w[0].serial_number < w[1].serial_number));
        serial_asc.reverse();
        assert_eq!(ids(&serial_desc), ids(&serial_asc));
    }

    #[test]
    fn test_equal_names_keep_input_order() {
        let reports = vec![
            report("first", "Maadi Branch", "SN-9", "Cairo", 1),
            report("other", "Dokki Branch", "SN-5", "Giza", 2),
            report("second", "Maadi Branch", "SN-1", "Cairo", 3),
        ];
        let filter = ReportFilter::default();

        let asc = filter_and_sort(&reports, &filter, SortOption::NameAsc);
        assert_eq!(ids(&asc), vec!["other", "first", "second"]);

        let desc = filter_and_sort(&reports, &filter, SortOption::NameDesc);
        assert_eq!(ids(&desc), vec!["first", "second", "other"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let filter = ReportFilter {
            search: Some("GIZ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&fixture(), &filter, SortOption::DateAsc)), vec!["a"]);

        let filter = ReportFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_and_sort(&fixture(), &filter, SortOption::DateAsc).len(), 3);
    }

    #[test]
    fn test_category_search_only_when_enabled() {
        let mut reports = fixture();
        reports[0].category = vec![ReportCategory::Modern];
        reports[1].category = vec![ReportCategory::Corrective];
        reports[2].category = vec![ReportCategory::Corrective];

        let mut filter = ReportFilter {
            search: Some("modern".to_string()),
            ..Default::default()
        };
        assert!(filter_and_sort(&reports, &filter, SortOption::DateAsc).is_empty());

        filter.match_categories = true;
        assert_eq!(ids(&filter_and_sort(&reports, &filter, SortOption::DateAsc)), vec!["a"]);

        filter.search = Some("الحديثة".to_string());
        assert_eq!(ids(&filter_and_sort(&reports, &filter, SortOption::DateAsc)), vec!["a"]);
    }

    #[test]
    fn test_date_range_is_inclusive_on_calendar_date() {
        let filter = ReportFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 11),
            date_to: NaiveDate::from_ymd_opt(2024, 3, 11),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&fixture(), &filter, SortOption::DateAsc)), vec!["c"]);

        let filter = ReportFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 11),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_and_sort(&fixture(), &filter, SortOption::DateAsc)),
            vec!["c", "b"]
        );
    }

    #[test]
    fn test_category_and_governorate_filters() {
        let mut reports = fixture();
        reports[1].category = vec![ReportCategory::Modern, ReportCategory::Corrective];

        let filter = ReportFilter {
            category: Some(ReportCategory::Modern),
            governorate: Some("Cairo".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&reports, &filter, SortOption::DateAsc)), vec!["b"]);
    }

    #[test]
    fn test_governorate_options_are_distinct_and_sorted() {
        let mut reports = fixture();
        reports.push(report("d", "x", "y", "", 1));
        assert_eq!(governorate_options(&reports), vec!["Cairo", "Giza"]);
    }

    #[test]
    fn test_reveal_with_custom_page_size() {
        let mut reveal = IncrementalReveal::with_pages(1).page_size(24);
        assert_eq!(reveal.visible_count(50), 24);
        assert!(reveal.reveal_more(50));
        assert_eq!(reveal.visible_count(50), 48);
        assert!(reveal.has_more(50));

        assert_eq!(IncrementalReveal::with_pages(2).visible_count(50), 40);
    }

    #[test]
    fn test_reveal_grows_by_page_and_resets_on_criteria_change() {
        let mut reveal = IncrementalReveal::new();
        let filter = ReportFilter::default();
        reveal.set_criteria(&filter, SortOption::DateDesc);

        assert_eq!(reveal.visible_count(45), 20);
        assert!(reveal.reveal_more(45));
        assert!(reveal.reveal_more(45));
        assert_eq!(reveal.visible_count(45), 45);
        assert!(!reveal.has_more(45));
        assert!(!reveal.reveal_more(45));

        // Same criteria keep the revealed pages
        reveal.set_criteria(&filter, SortOption::DateDesc);
        assert_eq!(reveal.visible_count(45), 45);

        reveal.set_criteria(&filter, SortOption::NameAsc);
        assert_eq!(reveal.visible_count(45), 20);
    }

    #[test]
    fn test_reveal_window() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(IncrementalReveal::new().window(&items).len(), 20);
        assert_eq!(IncrementalReveal::with_pages(0).window(&items).len(), 20);
        assert_eq!(IncrementalReveal::with_pages(3).window(&items).len(), 25);
        assert!(IncrementalReveal::new().window::<u32>(&[]).is_empty());
    }
}
