pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ErrorBody};
pub use routes::{router, RestState, UsersApiDoc};
