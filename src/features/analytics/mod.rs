//! Report statistics for the admin and bank dashboards.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::AnalyticsService;
