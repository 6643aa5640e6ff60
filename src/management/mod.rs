mod auth;
mod playlist;
mod store;

pub use auth::EXPIRY_MARGIN_SECS;
pub use auth::TokenManager;
pub use auth::TokenState;
pub use playlist::BATCH_SIZE;
pub use playlist::MAX_COVER_BYTES;
pub use playlist::PlaylistReconciler;
pub use playlist::ReconcileReport;
pub use playlist::ShowReport;
pub use store::CredentialStore;
