//! User account management.
//!
//! ## Endpoints (admin only)
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users` | List users (passwords never returned) |
//! | POST | `/api/users` | Create a user with a unique username |
//! | PUT | `/api/users/{id}` | Update a user; omitted password is kept |
//! | DELETE | `/api/users/{id}` | Delete a user |
//! | GET | `/api/users/stream` | Live user list over SSE |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::UserService;
