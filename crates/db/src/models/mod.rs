//! Row structs, request DTOs and response shapes.
//!
//! Each submodule contains:
//! - `FromRow` entity structs matching table rows or listing rows
//! - `Deserialize` DTOs for inserts and patches
//! - `Serialize` response shapes and the mapping from rows into them

pub mod collection;
pub mod episode;
pub mod media;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod title;
pub mod transaction;
pub mod user;
