//! HTTP handlers, grouped by resource.

pub mod applications;
pub mod auth;
pub mod categories;
pub mod reports;
