mod analytics_service;

pub use analytics_service::{break_down, summarize, AnalyticsService};
