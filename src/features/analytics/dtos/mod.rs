mod analytics_dto;

pub use analytics_dto::{
    AnalyticsBreakdownDto, AnalyticsSummaryDto, BreakdownParams, CategoryCount,
    GovernorateCount, MonthCount, Period,
};
