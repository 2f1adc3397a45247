//! Service configuration loaded from environment variables.
//!
//! Required: `DATABASE_URL`, `AUTH_SECRET`, `CASHFREE_CLIENT_ID`,
//! `CASHFREE_CLIENT_SECRET`, `CASHFREE_WEBHOOK_SECRET`.
//! Optional: `HOST` (default 0.0.0.0), `PORT` (default 8083),
//! `CASHFREE_BASE_URL` (default sandbox), `CURRENCY` (default INR),
//! `IMAGE_HOST_URL` (prefix for stored image filenames), `NATS_URL`, and
//! the SMTP block (`SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`,
//! `SMTP_PASSWORD`, `MAIL_FROM`) — without it, confirmation email is
//! disabled.

use thiserror::Error;

const DEFAULT_GATEWAY_BASE_URL: &str = "https://sandbox.cashfree.com/pg";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Shared secret the session tokens are signed with.
    pub auth_secret: String,
    pub currency: String,
    /// Base URL of the image host; stored filenames are resolved against it.
    pub image_host_url: Option<String>,
    pub gateway: GatewayConfig,
    pub smtp: Option<SmtpConfig>,
    pub nats_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub webhook_secret: String,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl Config {
    /// Load configuration from the environment, after `dotenvy` has run.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: or_default("HOST", "0.0.0.0"),
            port: parse_port("PORT", "8083")?,
            auth_secret: required("AUTH_SECRET")?,
            currency: or_default("CURRENCY", "INR"),
            image_host_url: optional("IMAGE_HOST_URL"),
            gateway: GatewayConfig {
                base_url: or_default("CASHFREE_BASE_URL", DEFAULT_GATEWAY_BASE_URL),
                client_id: required("CASHFREE_CLIENT_ID")?,
                client_secret: required("CASHFREE_CLIENT_SECRET")?,
                webhook_secret: required("CASHFREE_WEBHOOK_SECRET")?,
            },
            smtp: SmtpConfig::from_env()?,
            nats_url: optional("NATS_URL"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = optional("SMTP_HOST") else {
            return Ok(None);
        };
        Ok(Some(Self {
            host,
            port: parse_port("SMTP_PORT", "2525")?,
            username: required("SMTP_USERNAME")?,
            password: required("SMTP_PASSWORD")?,
            from_address: or_default("MAIL_FROM", "Electech <no-reply@electech.example>"),
        }))
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_port(key: &str, default: &str) -> Result<u16, ConfigError> {
    or_default(key, default)
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
