//! Request middleware

pub mod auth;

pub use auth::{auth_middleware, issue_session_token, AuthUser, Claims, CurrentUser};
