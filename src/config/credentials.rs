//! Secrets read from the environment.

use super::{ConfigError, ConfigResult};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const EMAIL: &str = "EMAIL";
pub const PASSWORD: &str = "PASSWORD";
pub const SMTP_SERVER: &str = "SMTP_SERVER";

/// Sender account for digest emails.
#[derive(Clone)]
pub struct MailCredentials {
    pub email: String,
    pub password: String,
    pub smtp_server: Option<String>,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("smtp_server", &self.smtp_server)
            .finish()
    }
}

impl MailCredentials {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            email: get(EMAIL).ok_or(ConfigError::MissingEnv(EMAIL))?,
            password: get(PASSWORD).ok_or(ConfigError::MissingEnv(PASSWORD))?,
            smtp_server: get(SMTP_SERVER),
        })
    }
}

/// API key for the OpenAI embedding endpoint.
pub fn openai_api_key() -> ConfigResult<String> {
    std::env::var(OPENAI_API_KEY)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingEnv(OPENAI_API_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_mail_credentials() {
        let creds = MailCredentials::from_lookup(lookup(&[
            ("EMAIL", "screening@ai4ki.org"),
            ("PASSWORD", "secret"),
            ("SMTP_SERVER", "smtp.example.org"),
        ]))
        .unwrap();

        assert_eq!(creds.email, "screening@ai4ki.org");
        assert_eq!(creds.smtp_server.as_deref(), Some("smtp.example.org"));
        assert!(!format!("{:?}", creds).contains("secret"));
    }

    #[test]
    fn missing_password() {
        let result = MailCredentials::from_lookup(lookup(&[("EMAIL", "a@b.de"), ("PASSWORD", " ")]));
        assert!(matches!(result, Err(ConfigError::MissingEnv("PASSWORD"))));
    }
}
