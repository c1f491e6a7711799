//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod application_repo;
pub mod category_repo;
pub mod session_repo;
pub mod user_repo;

pub use application_repo::ApplicationRepo;
pub use category_repo::CategoryRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
