//! Admin settings for the remote database connection.
//!
//! Saving a configuration switches the whole service to the remote store when it
//! connects; clearing it returns to local storage.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::SettingsService;
