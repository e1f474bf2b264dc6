//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token generation and validation.
//!
//! Tokens are issued by the user service; this server only verifies them.
//! [`jwt::generate_access_token`] exists for tooling and tests.

pub mod jwt;
