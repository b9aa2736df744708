//! Session guard: Gmail login, signed session tokens, and request admission.

pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod secret;

pub use identity::{Identity, LoginError};
pub use jwt::SessionTokens;
pub use middleware::AuthUser;
