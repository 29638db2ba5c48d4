//! Session tokens and password hashing.

mod jwt;
mod password;

pub use jwt::{DEFAULT_SECRET, JwtConfig, JwtTokenService};
pub use password::Argon2PasswordService;
