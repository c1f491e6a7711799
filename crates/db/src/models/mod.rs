//! Entity row models and DTOs.

pub mod application;
pub mod category;
pub mod session;
pub mod user;
