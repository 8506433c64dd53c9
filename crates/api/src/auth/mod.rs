//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access tokens and refresh-token hashing.
//! - [`bootstrap`] -- creates the initial account on startup.

pub mod bootstrap;
pub mod jwt;
pub mod password;
