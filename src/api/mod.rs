//! HTTP API for the review UI.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use handlers::EXPORT_SKIPPED_HEADER;
pub use server::{build_router, run};
