//! Server configuration read from the environment

use std::net::SocketAddr;

use anyhow::{Context, bail};
use auth::AuthConfig;
use blog::BlogConfig;
use platform::genai::GeminiConfig;
use platform::image::ImageHostConfig;
use platform::mail::BrevoConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
const DEFAULT_MONGODB_DATABASE: &str = "blog";
const DEFAULT_IMAGE_HOST_URL: &str = "https://api.imgbb.com/1/upload";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    pub blog: BlogConfig,
    /// Absent means mail goes to the in-process outbox
    pub brevo: Option<BrevoConfig>,
    /// Absent means avatars are kept in memory
    pub image_host: Option<ImageHostConfig>,
    /// Absent means AI endpoints answer with a scripted draft
    pub gemini: Option<GeminiConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(cfg!(debug_assertions), |key| {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        })
    }

    /// Build from any key lookup. Without `development`, secrets are required.
    pub fn from_lookup<F>(development: bool, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| -> anyhow::Result<Option<Vec<u8>>> {
            match lookup(key) {
                Some(value) => Ok(Some(value.into_bytes())),
                None if development => Ok(None),
                None => bail!("{key} must be set in production"),
            }
        };

        let base = if development {
            AuthConfig::development()
        } else {
            AuthConfig::default()
        };

        let mut auth = AuthConfig {
            password_pepper: lookup("PASSWORD_PEPPER").map(String::into_bytes),
            ..base
        };
        if let Some(key) = secret("JWT_ACCESS_SECRET")? {
            auth.access_secret = key;
        }
        if let Some(key) = secret("JWT_REFRESH_SECRET")? {
            auth.refresh_secret = key;
        }
        if let Some(salt) = secret("OTP_SALT")? {
            auth.otp_salt = salt;
        }
        if auth.access_secret == auth.refresh_secret {
            bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ");
        }
        if let Some(url) = lookup("FRONTEND_URL") {
            auth.frontend_url = url.trim_end_matches('/').to_string();
        }

        let blog = if development {
            BlogConfig::development()
        } else {
            BlogConfig::default()
        };

        let brevo = match (lookup("BREVO_API_KEY"), lookup("BREVO_SENDER_EMAIL")) {
            (Some(key), Some(sender)) => Some(BrevoConfig {
                sender_name: lookup("BREVO_SENDER_NAME"),
                ..BrevoConfig::new(key, sender)
            }),
            (Some(_), None) => bail!("BREVO_SENDER_EMAIL is required with BREVO_API_KEY"),
            _ => None,
        };

        let image_host = lookup("IMAGE_HOST_API_KEY").map(|api_key| ImageHostConfig {
            upload_url: lookup("IMAGE_HOST_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_HOST_URL.to_string()),
            api_key,
        });

        let gemini = lookup("GEMINI_API_KEY").map(|key| {
            let mut config = GeminiConfig::new(key);
            if let Some(model) = lookup("GEMINI_MODEL") {
                config.model = model;
            }
            config
        });

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let frontend_origins = lookup("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            mongodb_uri: lookup("MONGODB_URI").unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
            mongodb_database: lookup("MONGODB_DATABASE")
                .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
            frontend_origins,
            auth,
            blog,
            brevo,
            image_host,
            gemini,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = AppConfig::from_lookup(true, lookup_from(&[])).unwrap();

        assert_eq!(config.bind_addr.port(), 31113);
        assert_eq!(config.mongodb_database, "blog");
        assert_eq!(config.frontend_origins.len(), 2);
        assert_eq!(config.auth.access_secret.len(), 32);
        assert_ne!(config.auth.access_secret, config.auth.refresh_secret);
        assert!(config.brevo.is_none());
        assert!(config.image_host.is_none());
        assert!(config.gemini.is_none());
    }

    #[test]
    fn test_production_requires_secrets() {
        let err = AppConfig::from_lookup(false, lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("JWT_ACCESS_SECRET"));

        let config = AppConfig::from_lookup(
            false,
            lookup_from(&[
                ("JWT_ACCESS_SECRET", "access-key"),
                ("JWT_REFRESH_SECRET", "refresh-key"),
                ("OTP_SALT", "salt"),
                ("FRONTEND_URL", "https://blog.example.com/"),
            ]),
        )
        .unwrap();
        assert_eq!(config.auth.access_secret, b"access-key");
        assert!(config.auth.cookie_secure);
        assert_eq!(config.auth.frontend_url, "https://blog.example.com");
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let err = AppConfig::from_lookup(
            true,
            lookup_from(&[("JWT_ACCESS_SECRET", "same"), ("JWT_REFRESH_SECRET", "same")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_providers_enabled_by_keys() {
        let config = AppConfig::from_lookup(
            true,
            lookup_from(&[
                ("BREVO_API_KEY", "brevo"),
                ("BREVO_SENDER_EMAIL", "noreply@example.com"),
                ("BREVO_SENDER_NAME", "Blog"),
                ("IMAGE_HOST_API_KEY", "img"),
                ("GEMINI_API_KEY", "gem"),
                ("GEMINI_MODEL", "gemini-2.0-flash"),
                ("FRONTEND_ORIGINS", "https://a.example, ,https://b.example"),
            ]),
        )
        .unwrap();

        let brevo = config.brevo.unwrap();
        assert_eq!(brevo.sender_name.as_deref(), Some("Blog"));
        assert_eq!(config.image_host.unwrap().upload_url, DEFAULT_IMAGE_HOST_URL);
        assert_eq!(config.gemini.unwrap().model, "gemini-2.0-flash");
        assert_eq!(config.frontend_origins, ["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_bad_bind_addr() {
        assert!(AppConfig::from_lookup(true, lookup_from(&[("BIND_ADDR", "nowhere")])).is_err());
    }
}
