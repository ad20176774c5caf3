//! Configuration and settings management.
//!
//! Settings are stored as JSON; secrets come from the environment.

mod credentials;
mod settings;

pub use credentials::{openai_api_key, MailCredentials};
pub use settings::{
    ConfigError, ConfigResult, EmbeddingBackend, EmbeddingSettings, NotificationSettings,
    ScreeningSettings, Settings, SourceSettings, MAX_TOP_K,
};
