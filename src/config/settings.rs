//! Application settings and configuration types.
//!
//! Settings are read from `~/.config/tenderwatch/settings.json` (or XDG
//! equivalent) unless a path is given. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::embedding::{DistanceMetric, RankerConfig};
use crate::providers::ai::DEFAULT_EMBEDDING_MODEL;
use crate::providers::source::{ListingConfig, DEFAULT_TEXT_COLUMN, HAD_URL};
use crate::services::{
    Denylist, DigestConfig, EmailTemplate, DEFAULT_LOW_CONFIDENCE_THRESHOLD, DEFAULT_TOP_K,
};

/// Largest number of results a user may ask for.
pub const MAX_TOP_K: usize = 10;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ranking and digest selection.
    pub screening: ScreeningSettings,
    /// Embedding provider configuration.
    pub embedding: EmbeddingSettings,
    /// Tender listing retrieval.
    pub source: SourceSettings,
    /// Digest email delivery.
    pub notification: NotificationSettings,
}

/// Ranking and digest selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningSettings {
    /// File with the institutional profile text used as the query.
    pub profile_path: PathBuf,
    /// File with comma-separated denylist terms.
    pub denylist_path: Option<PathBuf>,
    /// Comma-separated denylist terms, merged with the file.
    pub denylist: Option<String>,
    /// Number of best-ranked tenders considered (1 to 10).
    pub top_k: usize,
    /// Best-match distance above which a low-confidence warning is shown.
    pub low_confidence_threshold: f64,
    /// Distance metric for ranking.
    pub metric: DistanceMetric,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self {
            profile_path: PathBuf::from("assets/profile.txt"),
            denylist_path: Some(PathBuf::from("assets/negative_keywords.txt")),
            denylist: None,
            top_k: DEFAULT_TOP_K,
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
            metric: DistanceMetric::Cosine,
        }
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAi,
    Ollama,
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingBackend,
    /// Custom API endpoint (for self-hosted or compatible APIs).
    pub base_url: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Maximum embedding requests in flight.
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::OpenAi,
            base_url: None,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            concurrency: 4,
            timeout_secs: 30,
        }
    }
}

/// Tender listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Listing search form URL.
    pub url: String,
    /// Form fields submitted with the search.
    pub form: BTreeMap<String, String>,
    /// Header of the column with the tender description.
    pub text_column: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        let listing = ListingConfig::default();
        Self {
            url: HAD_URL.to_string(),
            form: listing.form,
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            timeout_secs: listing.timeout.as_secs(),
        }
    }
}

/// Digest email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Where to send the digest. No email when unset.
    pub recipient: Option<String>,
    pub subject: String,
    /// Line placed above the digest in the email body.
    pub header: String,
    /// SMTP server, overridden by `SMTP_SERVER`.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    /// Implicit TLS (true) or STARTTLS (false).
    pub use_tls: bool,
    /// Domain for generated Message-ID headers.
    pub message_id_domain: String,
    /// Pause after sending, in seconds.
    pub settle_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        let template = EmailTemplate::default();
        Self {
            recipient: None,
            subject: template.subject,
            header: template.header,
            smtp_host: None,
            smtp_port: 465,
            use_tls: true,
            message_id_domain: "ai4ki.org".to_string(),
            settle_secs: 5,
        }
    }
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "ai4ki", "tenderwatch")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Writes settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        let screening = &self.screening;
        if !(1..=MAX_TOP_K).contains(&screening.top_k) {
            return Err(ConfigError::Invalid {
                field: "screening.top_k",
                message: format!("must be between 1 and {}, got {}", MAX_TOP_K, screening.top_k),
            });
        }
        if !screening.low_confidence_threshold.is_finite() {
            return Err(ConfigError::Invalid {
                field: "screening.low_confidence_threshold",
                message: "must be a finite number".to_string(),
            });
        }
        if self.embedding.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "embedding.concurrency",
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(ref base_url) = self.embedding.base_url {
            url::Url::parse(base_url).map_err(|e| ConfigError::Invalid {
                field: "embedding.base_url",
                message: e.to_string(),
            })?;
        }
        url::Url::parse(&self.source.url).map_err(|e| ConfigError::Invalid {
            field: "source.url",
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Denylist from the configured file and inline terms.
    ///
    /// A configured file that does not exist contributes no terms.
    pub fn denylist(&self) -> ConfigResult<Denylist> {
        let from_file = match self.screening.denylist_path {
            Some(ref path) => match Denylist::from_file(path) {
                Ok(denylist) => denylist,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %path.display(), "Denylist file not found");
                    Denylist::default()
                }
                Err(source) => {
                    return Err(ConfigError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            },
            None => Denylist::default(),
        };
        let inline = self
            .screening
            .denylist
            .as_deref()
            .map(Denylist::parse)
            .unwrap_or_default();
        Ok(from_file.merge(inline))
    }

    /// Reads the profile text used as the ranking query.
    pub fn profile(&self) -> ConfigResult<String> {
        let path = &self.screening.profile_path;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "screening.profile_path",
                message: format!("{} is empty", path.display()),
            });
        }
        Ok(text)
    }

    pub fn ranker_config(&self) -> RankerConfig {
        RankerConfig {
            metric: self.screening.metric,
            concurrency: self.embedding.concurrency,
            timeout: Duration::from_secs(self.embedding.timeout_secs),
        }
    }

    pub fn digest_config(&self) -> ConfigResult<DigestConfig> {
        Ok(DigestConfig {
            top_k: self.screening.top_k,
            denylist: self.denylist()?,
            low_confidence_threshold: self.screening.low_confidence_threshold,
        })
    }

    pub fn listing_config(&self) -> ListingConfig {
        ListingConfig {
            url: self.source.url.clone(),
            form: self.source.form.clone(),
            text_column: self.source.text_column.clone(),
            timeout: Duration::from_secs(self.source.timeout_secs),
        }
    }

    pub fn email_template(&self) -> EmailTemplate {
        EmailTemplate {
            subject: self.notification.subject.clone(),
            header: self.notification.header.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.screening.top_k, 3);
        assert_eq!(settings.screening.low_confidence_threshold, 0.18);
        assert_eq!(settings.screening.metric, DistanceMetric::Cosine);
        assert_eq!(settings.embedding.model, "text-embedding-ada-002");
        assert_eq!(settings.notification.smtp_port, 465);
        assert_eq!(settings.notification.settle_secs, 5);
    }

    #[test]
    fn top_k_out_of_range() {
        for top_k in [0, 11] {
            let mut settings = Settings::default();
            settings.screening.top_k = top_k;
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::Invalid { field: "screening.top_k", .. })
            ));
        }
    }

    #[test]
    fn rejects_bad_values() {
        let mut settings = Settings::default();
        settings.screening.low_confidence_threshold = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.embedding.concurrency = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.source.url = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"screening": {{"top_k": 5, "metric": "L2"}}, "notification": {{"recipient": "a@b.de"}}}}"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.screening.top_k, 5);
        assert_eq!(settings.screening.metric, DistanceMetric::L2);
        assert_eq!(settings.screening.low_confidence_threshold, 0.18);
        assert_eq!(settings.notification.recipient.as_deref(), Some("a@b.de"));
        assert_eq!(settings.notification.subject, "Newsletter-Auswertung");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings.screening.top_k, 3);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(Settings::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingBackend::Ollama;
        settings.screening.denylist = Some("bau,reinigung".to_string());
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.embedding.provider, EmbeddingBackend::Ollama);
        assert_eq!(loaded.screening.denylist.as_deref(), Some("bau,reinigung"));
    }

    #[test]
    fn denylist_merges_file_and_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Catering, Winterdienst").unwrap();

        let mut settings = Settings::default();
        settings.screening.denylist_path = Some(file.path().to_path_buf());
        settings.screening.denylist = Some("druck".to_string());

        let denylist = settings.denylist().unwrap();
        assert_eq!(denylist.len(), 3);
        assert!(!denylist.passes("Druckerzeugnisse"));
    }

    #[test]
    fn missing_denylist_file_is_empty() {
        let mut settings = Settings::default();
        settings.screening.denylist_path = Some(PathBuf::from("/nonexistent/keywords.txt"));
        assert!(settings.denylist().unwrap().is_empty());
    }

    #[test]
    fn profile_must_not_be_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut settings = Settings::default();
        settings.screening.profile_path = file.path().to_path_buf();
        assert!(matches!(settings.profile(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn derived_configs() {
        let mut settings = Settings::default();
        settings.embedding.concurrency = 8;
        settings.source.timeout_secs = 20;

        assert_eq!(settings.ranker_config().concurrency, 8);
        assert_eq!(settings.listing_config().timeout, Duration::from_secs(20));
        assert_eq!(settings.email_template().subject, "Newsletter-Auswertung");
    }

    #[test]
    fn listing_form_fields_come_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"source": {{"form": {{"L_CAT": "SQLB", "L_ROWS": "500"}}}}}}"#).unwrap();

        let listing = Settings::load(file.path()).unwrap().listing_config();
        assert_eq!(listing.form.get("L_ROWS").map(String::as_str), Some("500"));
        assert_eq!(listing.form.get("L_CAT").map(String::as_str), Some("SQLB"));
        assert_eq!(listing.text_column, "VerfahrenLeistung");
    }

    #[test]
    fn backend_serialization() {
        assert_eq!(serde_json::to_string(&EmbeddingBackend::OpenAi).unwrap(), "\"openai\"");
        let backend: EmbeddingBackend = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(backend, EmbeddingBackend::Ollama);
    }
}
