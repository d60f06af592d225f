//! # Application State
//!
//! Shared state for the Axum application: the checkout facade wired to its
//! repository and observers, plus the metrics collector served at
//! `/api/v1/metrics`.

use anyhow::Context;
use checkout_core::{
    Catalog, CheckoutConfig, CheckoutFacade, EventSubject, InMemoryRepository, JsonFileRepository,
    SharedRepository,
};
use checkout_notify::{register_observers, MetricsCollector, RegisteredObservers};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

const CHECKOUT_CONFIG_PATHS: [&str; 3] = [
    "config/checkout.toml",
    "../config/checkout.toml",
    "../../config/checkout.toml",
];

const CATALOG_PATHS: [&str; 3] = [
    "config/catalog.toml",
    "../config/catalog.toml",
    "../../config/catalog.toml",
];

/// Process-level settings read from the environment
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Explicit checkout config file; the default locations are searched when unset
    pub config_path: Option<String>,
    /// Explicit catalog file; the default locations are searched when unset
    pub catalog_path: Option<String>,
    /// Persist to this JSON file instead of memory
    pub data_file: Option<String>,
    /// `json` or `pretty`
    pub log_format: String,
    pub payment_timeout_secs: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub webhook_url: Option<String>,
}

impl AppConfig {
    /// Load from environment variables (and `.env`, if present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT").unwrap_or(8080),
            config_path: env_string("CHECKOUT_CONFIG"),
            catalog_path: env_string("CATALOG_PATH"),
            data_file: env_string("DATA_FILE"),
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            payment_timeout_secs: env_parse("PAYMENT_TIMEOUT_SECS"),
            retry_attempts: env_parse("RETRY_ATTEMPTS"),
            webhook_url: env_string("WEBHOOK_URL"),
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Apply environment overrides on top of the file config
    pub fn apply_overrides(&self, config: &mut CheckoutConfig) {
        if let Some(secs) = self.payment_timeout_secs {
            config.payment.timeout_secs = secs;
        }
        if let Some(attempts) = self.retry_attempts {
            config.payment.retry_attempts = attempts;
        }
        if let Some(url) = &self.webhook_url {
            config.notifications.webhook.url = url.clone();
            config.notifications.webhook.enabled = true;
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<CheckoutFacade>,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(facade: Arc<CheckoutFacade>, metrics: Arc<MetricsCollector>) -> Self {
        Self { facade, metrics }
    }

    /// Load config and catalog, open the repository and register observers.
    ///
    /// The returned observers must be shut down when the server stops.
    pub async fn build(app: &AppConfig) -> anyhow::Result<(Self, RegisteredObservers)> {
        let mut config = load_checkout_config(app.config_path.as_deref())?;
        app.apply_overrides(&mut config);
        let catalog = load_catalog(app.catalog_path.as_deref())?;

        let repo: SharedRepository = match &app.data_file {
            Some(path) => {
                let repo = JsonFileRepository::open(path)
                    .await
                    .with_context(|| format!("failed to open data file {path}"))?;
                let seeded = repo.seed(&catalog).await?;
                info!(path = %path, seeded, "Using JSON file repository");
                Arc::new(repo)
            }
            None => {
                info!(products = catalog.products.len(), "Using in-memory repository");
                Arc::new(InMemoryRepository::with_catalog(&catalog))
            }
        };

        let events = Arc::new(EventSubject::new());
        let observers = register_observers(&events, &config)
            .await
            .context("failed to register observers")?;

        let facade = Arc::new(CheckoutFacade::new(config, repo, events));
        Ok((Self::new(facade, observers.metrics.clone()), observers))
    }
}

/// Read the checkout config from `explicit`, or the first default location found
pub fn load_checkout_config(explicit: Option<&str>) -> anyhow::Result<CheckoutConfig> {
    match read_first(explicit, &CHECKOUT_CONFIG_PATHS)? {
        Some((path, content)) => {
            let config = CheckoutConfig::from_toml(&content)
                .with_context(|| format!("failed to parse {path}"))?;
            info!(path = %path, "Loaded checkout config");
            Ok(config)
        }
        None => {
            warn!("No checkout config found, using defaults");
            Ok(CheckoutConfig::default())
        }
    }
}

/// Read the catalog from `explicit`, or the first default location found.
/// Falls back to the built-in demo catalog.
pub fn load_catalog(explicit: Option<&str>) -> anyhow::Result<Catalog> {
    match read_first(explicit, &CATALOG_PATHS)? {
        Some((path, content)) => {
            let catalog =
                Catalog::from_toml(&content).with_context(|| format!("failed to parse {path}"))?;
            info!(
                path = %path,
                products = catalog.products.len(),
                customers = catalog.customers.len(),
                "Loaded catalog"
            );
            Ok(catalog)
        }
        None => {
            warn!("No catalog found, using built-in demo catalog");
            Ok(Catalog::demo())
        }
    }
}

/// An explicit path must exist; default locations are optional
fn read_first(explicit: Option<&str>, defaults: &[&str]) -> anyhow::Result<Option<(String, String)>> {
    if let Some(path) = explicit {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        return Ok(Some((path.to_string(), content)));
    }
    Ok(defaults.iter().find_map(|path| {
        std::fs::read_to_string(path)
            .ok()
            .map(|content| (path.to_string(), content))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..config
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let app = AppConfig {
            payment_timeout_secs: Some(5),
            retry_attempts: Some(1),
            webhook_url: Some("http://hooks.local/checkout".to_string()),
            ..AppConfig::default()
        };
        let mut config = CheckoutConfig::default();
        app.apply_overrides(&mut config);

        assert_eq!(config.payment.timeout_secs, 5);
        assert_eq!(config.payment.retry_attempts, 1);
        assert!(config.notifications.webhook.enabled);
        assert_eq!(config.notifications.webhook.url, "http://hooks.local/checkout");
    }

    #[test]
    fn test_load_explicit_files() {
        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(config_file, "[payment]\nretry_attempts = 7").unwrap();
        let config = load_checkout_config(config_file.path().to_str()).unwrap();
        assert_eq!(config.payment.retry_attempts, 7);

        let mut catalog_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            catalog_file,
            "[[products]]\nid = \"p-1\"\nname = \"Pen\"\nprice = \"1.50\"\nsku = \"PEN-1\"\nstock = 4"
        )
        .unwrap();
        let catalog = load_catalog(catalog_file.path().to_str()).unwrap();
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.products[0].stock, 4);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load_catalog(Some("/nonexistent/catalog.toml")).is_err());
    }

    #[tokio::test]
    async fn test_build_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            config_file,
            "[notifications.audit]\npath = \"{}\"",
            dir.path().join("audit.log").display()
        )
        .unwrap();

        let app = AppConfig {
            config_path: config_file.path().to_str().map(String::from),
            ..AppConfig::default()
        };
        let (state, observers) = AppState::build(&app).await.unwrap();

        let products = state.facade.repository().list_products().await.unwrap();
        assert!(!products.is_empty());
        assert!(state.facade.events().observer_count() >= 1);
        observers.shutdown().await;
    }
}
