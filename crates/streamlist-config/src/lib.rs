//! File configuration for streamlist embedders.
//!
//! TOML profiles loaded through figment, token resolution (env + keyring +
//! plaintext), translation to `streamlist_core::CatalogConfig` and a default
//! tracing subscriber. The core crate never reads files; this crate is the
//! only place that does.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use streamlist_core::config::{DEFAULT_GRAPH_URL, DEFAULT_LEGACY_URL, DEFAULT_REST_URL};
use streamlist_core::{Account, Backend, BackendEndpoint, CatalogConfig, ListingKind};

const KEYRING_SERVICE: &str = "streamlist";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The named profile, or the default one when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_batch_size")]
    pub enrichment_batch_size: usize,

    #[serde(default = "default_max_tag_pages")]
    pub max_tag_pages: u32,

    /// Tags requested per call when populating a tag catalog.
    #[serde(default = "default_tag_catalog_limit")]
    pub tag_catalog_limit: u32,

    #[serde(default = "default_backend_order")]
    pub backend_order: Vec<Backend>,

    /// Filter directive for `init_tracing` when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            enrichment_batch_size: default_batch_size(),
            max_tag_pages: default_max_tag_pages(),
            tag_catalog_limit: default_tag_catalog_limit(),
            backend_order: default_backend_order(),
            log_level: default_log_level(),
        }
    }
}

fn default_timeout() -> u64 {
    15
}
fn default_batch_size() -> usize {
    streamlist_core::enrich::DEFAULT_BATCH_SIZE
}
fn default_max_tag_pages() -> u32 {
    streamlist_core::tags::DEFAULT_MAX_TAG_PAGES
}
fn default_tag_catalog_limit() -> u32 {
    streamlist_core::tags::DEFAULT_TAG_CATALOG_LIMIT
}
fn default_backend_order() -> Vec<Backend> {
    vec![Backend::Graph, Backend::Rest, Backend::Legacy]
}
fn default_log_level() -> String {
    "info".into()
}

/// A named set of endpoints and credentials.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Sent as `Client-Id` to every backend.
    pub client_id: String,

    pub rest_url: Option<String>,
    pub graph_url: Option<String>,
    pub legacy_url: Option<String>,

    /// REST token (plaintext; prefer keyring or env var).
    pub rest_token: Option<String>,
    /// Environment variable holding the REST token.
    pub rest_token_env: Option<String>,

    /// Graph token (plaintext; prefer keyring or env var).
    pub graph_token: Option<String>,
    /// Environment variable holding the Graph token.
    pub graph_token_env: Option<String>,

    /// Signed-in account, for followed listings on REST.
    pub account_id: Option<String>,
    pub account_login: Option<String>,

    /// Overrides `defaults.backend_order`.
    pub backend_order: Option<Vec<Backend>>,

    /// Per-listing backend order, keyed by listing name (`game_clips`).
    #[serde(default)]
    pub listing_order: HashMap<String, Vec<Backend>>,

    /// Extra CA certificate to trust.
    pub ca_cert: Option<PathBuf>,

    /// Overrides `defaults.timeout`.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("tv", "streamlist", "streamlist").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("streamlist");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `STREAMLIST_` variables.
///
/// Nested keys use a double underscore: `STREAMLIST_DEFAULTS__TIMEOUT=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STREAMLIST_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve a backend token: named env var, then keyring, then plaintext.
///
/// Tokens are optional; `None` means the backend runs unauthenticated.
pub fn resolve_token(
    profile_name: &str,
    backend: Backend,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    // 1. Env var named by the profile
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    let account = format!("{profile_name}/{backend}-token");
    if let Ok(secret) =
        keyring::Entry::new(KEYRING_SERVICE, &account).and_then(|entry| entry.get_password())
    {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    plaintext.map(|token| SecretString::from(token.to_owned()))
}

// ── Translation ─────────────────────────────────────────────────────

fn endpoint(field: &str, url: Option<&str>, default: &str) -> Result<BackendEndpoint, ConfigError> {
    let url = url.unwrap_or(default);
    url::Url::parse(url).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL {url}: {e}"),
    })?;
    Ok(BackendEndpoint::new(url))
}

fn listing_order(
    raw: &HashMap<String, Vec<Backend>>,
) -> Result<HashMap<ListingKind, Vec<Backend>>, ConfigError> {
    raw.iter()
        .map(|(name, order)| {
            let kind: ListingKind = name.parse().map_err(|_| ConfigError::Validation {
                field: "listing_order".into(),
                reason: format!("unknown listing '{name}'"),
            })?;
            Ok((kind, order.clone()))
        })
        .collect()
}

/// Build a `CatalogConfig` from a profile, resolving its tokens.
pub fn profile_to_catalog_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<CatalogConfig, ConfigError> {
    if profile.client_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "client_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let mut rest = endpoint("rest_url", profile.rest_url.as_deref(), DEFAULT_REST_URL)?;
    rest.token = resolve_token(
        profile_name,
        Backend::Rest,
        profile.rest_token_env.as_deref(),
        profile.rest_token.as_deref(),
    );
    let mut graph = endpoint("graph_url", profile.graph_url.as_deref(), DEFAULT_GRAPH_URL)?;
    graph.token = resolve_token(
        profile_name,
        Backend::Graph,
        profile.graph_token_env.as_deref(),
        profile.graph_token.as_deref(),
    );
    let legacy = endpoint("legacy_url", profile.legacy_url.as_deref(), DEFAULT_LEGACY_URL)?;

    let account = profile.account_id.clone().map(|id| Account {
        id,
        login: profile.account_login.clone(),
    });

    Ok(CatalogConfig {
        rest,
        graph,
        legacy,
        client_id: profile.client_id.clone(),
        account,
        backend_order: profile
            .backend_order
            .clone()
            .unwrap_or_else(|| defaults.backend_order.clone()),
        listing_order: listing_order(&profile.listing_order)?,
        enrichment_batch_size: defaults
            .enrichment_batch_size
            .clamp(1, streamlist_core::enrich::MAX_BATCH_SIZE),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        max_tag_pages: defaults.max_tag_pages.max(1),
        tag_catalog_limit: defaults.tag_catalog_limit.max(1),
        ca_cert: profile.ca_cert.clone(),
    })
}

/// Load the config and translate the named (or default) profile.
pub fn load_catalog_config(profile: Option<&str>) -> Result<CatalogConfig, ConfigError> {
    let config = load_config()?;
    let (name, profile) = config.profile(profile)?;
    profile_to_catalog_config(profile, name, &config.defaults)
}

// ── Tracing ─────────────────────────────────────────────────────────

/// Install a `fmt` subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str) -> Result<(), ConfigError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ConfigError::Tracing(e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::Tracing(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile(client_id: &str) -> Profile {
        Profile {
            client_id: client_id.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn loads_profiles_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "home"

[defaults]
timeout = 30
backend_order = ["legacy", "graph"]

[profiles.home]
client_id = "abc123"
graph_token = "plain"

[profiles.home.listing_order]
game_clips = ["rest"]
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.defaults.timeout, 30);
        assert_eq!(config.defaults.max_tag_pages, 10);
        assert_eq!(config.defaults.tag_catalog_limit, 500);

        let (name, home) = config.profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(home.client_id, "abc123");
        assert_eq!(home.listing_order["game_clips"], vec![Backend::Rest]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert!(config.profiles.is_empty());
        assert!(matches!(
            config.profile(None),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.profiles.insert("default".into(), profile("xyz"));

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].client_id, "xyz");
    }

    #[test]
    fn translates_profile_to_catalog_config() {
        let mut home = profile("abc123");
        home.rest_url = Some("http://localhost:8080/helix/".into());
        home.graph_token = Some("plain".into());
        home.account_id = Some("42".into());
        home.listing_order
            .insert("game_clips".into(), vec![Backend::Legacy]);
        home.timeout = Some(5);

        let catalog = profile_to_catalog_config(&home, "test-profile", &Defaults::default()).unwrap();

        assert_eq!(catalog.rest.url, "http://localhost:8080/helix/");
        assert_eq!(catalog.graph.url, DEFAULT_GRAPH_URL);
        assert_eq!(
            catalog.graph.token.as_ref().map(|t| t.expose_secret().to_owned()),
            Some("plain".to_owned())
        );
        assert_eq!(catalog.account.clone().map(|a| a.id), Some("42".into()));
        assert_eq!(catalog.order_for(ListingKind::GameClips), &[Backend::Legacy]);
        assert_eq!(catalog.timeout, Duration::from_secs(5));
    }

    #[test]
    fn lookup_batch_is_capped_at_backend_limit() {
        let defaults = Defaults {
            enrichment_batch_size: 500,
            tag_catalog_limit: 0,
            ..Defaults::default()
        };

        let catalog = profile_to_catalog_config(&profile("abc"), "p", &defaults).unwrap();

        assert_eq!(catalog.enrichment_batch_size, 100);
        assert_eq!(catalog.tag_catalog_limit, 1);
    }

    #[test]
    fn rejects_bad_urls_and_listing_names() {
        let mut bad_url = profile("abc");
        bad_url.graph_url = Some("not a url".into());
        let err = profile_to_catalog_config(&bad_url, "p", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "graph_url"));

        let mut bad_listing = profile("abc");
        bad_listing
            .listing_order
            .insert("everything".into(), vec![Backend::Rest]);
        assert!(profile_to_catalog_config(&bad_listing, "p", &Defaults::default()).is_err());

        assert!(profile_to_catalog_config(&profile("  "), "p", &Defaults::default()).is_err());
    }

    #[test]
    fn token_env_var_wins_over_plaintext() {
        let token = resolve_token("p", Backend::Rest, Some("CARGO_PKG_NAME"), Some("plain"));
        assert_eq!(
            token.map(|t| t.expose_secret().to_owned()),
            Some("streamlist-config".to_owned())
        );
    }
}
