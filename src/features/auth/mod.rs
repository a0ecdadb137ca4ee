//! Bearer token authentication collaborator.
//!
//! Tokens are issued by the login service; this feature only validates them
//! and exposes the caller to handlers.

mod validator;

pub mod guards;
pub mod model;

pub use validator::JwtValidator;
