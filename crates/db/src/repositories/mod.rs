//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod collection_repo;
pub mod episode_repo;
pub mod media_repo;
pub mod session_repo;
pub mod settings_repo;
pub mod telemetry_repo;
pub mod title_repo;
pub mod transaction_repo;
pub mod user_repo;

pub use collection_repo::CollectionRepo;
pub use episode_repo::EpisodeRepo;
pub use media_repo::MediaRepo;
pub use session_repo::SessionRepo;
pub use settings_repo::SettingsRepo;
pub use telemetry_repo::TelemetryRepo;
pub use title_repo::TitleRepo;
pub use transaction_repo::TransactionRepo;
pub use user_repo::UserRepo;
