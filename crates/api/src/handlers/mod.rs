pub mod auth;
pub mod collections;
pub mod episodes;
pub mod settings;
pub mod telemetry;
pub mod titles;
pub mod transactions;
