pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod pages;
pub mod prefs;
pub mod render;
pub mod surface;

pub use api::{ApiClient, DatasetUpload};
pub use config::{ApiConfig, InsightsConfig, StorageConfig, UiConfig};
pub use error::{ApiError, ErrorKind, InsightsError, NETWORK_ERROR_MESSAGE};
pub use export::{ConversationFormat, Delivery, ExportArtifact, InsightsFormat};
pub use pages::PageContext;
pub use prefs::{FontSize, PreferenceStore, UserPreferences};
pub use surface::{Level, Notification, Overlay, Region, Surface};
