//! Core of a content-catalog query service: filtered/paginated title queries,
//! cache-aside rating/poster enrichment against an external provider, a genre
//! index, and genre-overlap recommendations.
//!
//! The HTTP layer, authentication, and bulk data loading live outside this
//! crate; they embed [`Services`] and call into the service structs it wires.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use services::Services;
