//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the data-access adapter that switches between the remote document
//! store and local persistent storage.

pub mod datastore;
