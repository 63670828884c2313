pub mod analytics;
pub mod auth;
pub mod reports;
pub mod settings;
pub mod users;
