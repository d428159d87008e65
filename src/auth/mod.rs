//! Authentication primitives: HS256 bearer tokens and argon2id password hashes

pub mod jwt;
pub mod password;

pub use jwt::{issue_token, validate_token, Claims};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
