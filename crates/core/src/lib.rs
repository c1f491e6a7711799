//! Domain logic for the atelier work-request service.
//!
//! Pure types and rules, no I/O: the error taxonomy, the application
//! status workflow, and the field-level validation used by the API forms.

pub mod error;
pub mod types;
pub mod validation;
pub mod workflow;
