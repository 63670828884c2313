//! ATM maintenance reports.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Role | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/reports` | any | Filter, sort and reveal reports 20 at a time |
//! | GET | `/api/reports/{id}` | any | Single report |
//! | GET | `/api/reports/governorates` | any | Governorate filter options |
//! | GET | `/api/reports/stream` | any | Live report list over SSE |
//! | POST | `/api/reports` | admin | Create a report |
//! | PUT | `/api/reports/{id}` | admin | Replace a report |
//! | DELETE | `/api/reports/{id}` | admin | Delete a report |
//! | POST | `/api/reports/bulk-delete` | admin | Delete selected reports |
//! | POST | `/api/reports/import` | admin | Import spreadsheet rows |
//! | GET | `/api/reports/export` | admin | Export filtered rows |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::ReportService;
