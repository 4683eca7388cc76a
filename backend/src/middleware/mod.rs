//! Request middleware and extractors

pub mod auth;
pub mod language;

pub use auth::{auth_middleware, CurrentUser};
pub use language::RequestLanguage;
