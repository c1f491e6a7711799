//! Request extractors: authentication and role gating.

pub mod auth;
pub mod rbac;
