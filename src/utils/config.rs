use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context as _;

impl Config {
    /// Load a `.toml` file from disk and parse it as a [`Config`].
    pub async fn load(file: &str) -> anyhow::Result<Config> {
        async fn load_inner(file: &str) -> anyhow::Result<Config> {
            let contents = tokio::fs::read_to_string(file).await?;
            Ok(toml::from_str(&contents)?)
        }
        load_inner(file).await.with_context(|| format!("loading config={file}"))
    }
}

/// Bag of app configuration values, parsed from a TOML file with serde.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub db: DbConfig,
    pub net: NetConfig,
    pub acme: Option<AcmeConfig>,
}

/// Webapp configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AppConfig {
    /// Public facing URL, e.g. `https://site.com`.
    pub url: String,
    /// How long a session cookie stays valid.
    #[serde(default = "default_session_expiry_days")]
    pub session_expiry_days: u32,
}

fn default_session_expiry_days() -> u32 {
    30
}

/// Database configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DbConfig {
    /// Path to sqlite3 database file.
    pub file: PathBuf,
    /// Optional TOML file with users, profiles and login tokens to insert on startup.
    pub seed_data: Option<PathBuf>,
}

/// Networking configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct NetConfig {
    /// HTTP server bind address.
    pub http_addr: SocketAddr,
    /// HTTPS server bind address, used when ACME is configured.
    pub https_addr: SocketAddr,
}

/// LetsEncrypt ACME TLS certificate configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AcmeConfig {
    /// Domain to request a cert for.
    pub domain: String,
    /// Contact email.
    pub email: String,
    /// Directory to store certs and credentials in.
    pub dir: String,
    /// Whether to use the production or staging ACME server.
    pub prod: bool,
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        app: AppConfig {
            url: "http://localhost:8080".into(),
            session_expiry_days: 30,
        },
        db: DbConfig { file: ":memory:".into(), seed_data: None },
        net: NetConfig {
            http_addr: ([127, 0, 0, 1], 8080).into(),
            https_addr: ([127, 0, 0, 1], 8443).into(),
        },
        acme: None,
    }
}
