//! Configuration for the cpg CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation of a profile into `cpg_api::Settings`.

use std::collections::HashMap;
use std::num::NonZeroU32;
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

use cpg_api::{Settings, StorageCacheSettings, TlsMode};

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CPG_CONFIG";
/// Password fallback when the profile doesn't name its own variable.
pub const PASSWORD_ENV: &str = "CPG_PASSWORD";
/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "cpg";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named console profiles.
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
    /// Name of the profile to use: the explicit one, else `default_profile`,
    /// else `"default"`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Output format used when neither `-o` nor `CPG_OUTPUT` is given.
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    pub user_agent_prefix: Option<String>,
    pub user_agent_suffix: Option<String>,

    #[serde(default = "default_cache_capacity")]
    pub storage_cache_capacity: u64,

    #[serde(default = "default_cache_ttl")]
    pub storage_cache_ttl_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            page_size: default_page_size(),
            timeout: default_timeout(),
            insecure: false,
            user_agent_prefix: None,
            user_agent_suffix: None,
            storage_cache_capacity: default_cache_capacity(),
            storage_cache_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_page_size() -> u32 {
    cpg_api::DEFAULT_PAGE_SIZE.get()
}
fn default_timeout() -> u64 {
    60
}
fn default_cache_capacity() -> u64 {
    StorageCacheSettings::default().max_capacity
}
fn default_cache_ttl() -> u64 {
    StorageCacheSettings::default().time_to_live.as_secs()
}

/// A named console profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Console address, e.g. `https://console.us1.crashplan.com`.
    pub host: String,

    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring or an environment variable.
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Additional CA bundle (PEM).
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,
    pub timeout: Option<u64>,
    pub page_size: Option<u32>,
}

// ── Config file path ────────────────────────────────────────────────

/// `$CPG_CONFIG`, else the platform config dir (`…/cpg/config.toml`).
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "cpg", "cpg").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("cpg");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if any), then `CPG_*` variables
/// with `__` as the nesting separator (`CPG_DEFAULTS__PAGE_SIZE=100`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CPG_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical config path.
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

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a profile's password: `password_env` → `CPG_PASSWORD` →
/// keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the OS keyring under `cpg/{profile}/password`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Settings ────────────────────────────────────────────────────────

/// Build client `Settings` from the global defaults and a profile's
/// overrides. `insecure` wins over `ca_cert`.
pub fn profile_settings(defaults: &Defaults, profile: &Profile) -> Result<Settings, ConfigError> {
    let raw_page_size = profile.page_size.unwrap_or(defaults.page_size);
    let page_size = NonZeroU32::new(raw_page_size).ok_or_else(|| ConfigError::Validation {
        field: "page_size".into(),
        reason: "must be greater than zero".into(),
    })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    let mut settings = Settings::default()
        .with_page_size(page_size)
        .with_tls(tls)
        .with_timeout(timeout)
        .with_storage_cache(StorageCacheSettings {
            max_capacity: defaults.storage_cache_capacity,
            time_to_live: Duration::from_secs(defaults.storage_cache_ttl_secs),
        });
    if let Some(ref prefix) = defaults.user_agent_prefix {
        settings = settings.with_user_agent_prefix(prefix.clone());
    }
    if let Some(ref suffix) = defaults.user_agent_suffix {
        settings = settings.with_user_agent_suffix(suffix.clone());
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "us1"

                [defaults]
                page_size = 250

                [profiles.us1]
                host = "https://console.us1.crashplan.com"
                username = "admin@example.com"
                "#,
            )?;
            jail.set_env("CPG_DEFAULTS__TIMEOUT", "15");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.profile_name(None), "us1");
            assert_eq!(config.defaults.page_size, 250);
            assert_eq!(config.defaults.timeout, 15);
            assert_eq!(config.defaults.output, "table");
            let profile = &config.profiles["us1"];
            assert_eq!(profile.username.as_deref(), Some("admin@example.com"));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_config_from(Path::new("nope.toml")).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.profile_name(Some("eu")), "eu");
            Ok(())
        });
    }

    #[test]
    fn password_env_precedence() {
        Jail::expect_with(|jail| {
            jail.set_env("MY_CPG_PW", "from-profile-env");
            jail.set_env(PASSWORD_ENV, "from-global-env");
            let profile = Profile {
                password_env: Some("MY_CPG_PW".into()),
                password: Some("plaintext".into()),
                ..Profile::default()
            };
            let pw = resolve_password(&profile, "jail").unwrap();
            assert_eq!(secrecy::ExposeSecret::expose_secret(&pw), "from-profile-env");

            let profile = Profile {
                password: Some("plaintext".into()),
                ..Profile::default()
            };
            let pw = resolve_password(&profile, "jail").unwrap();
            assert_eq!(secrecy::ExposeSecret::expose_secret(&pw), "from-global-env");
            Ok(())
        });
    }

    #[test]
    fn settings_from_profile() {
        let defaults = Defaults {
            user_agent_prefix: Some("legal-ops".into()),
            ..Defaults::default()
        };
        let profile = Profile {
            host: "https://console.example.com".into(),
            ca_cert: Some("/etc/ssl/corp.pem".into()),
            page_size: Some(100),
            timeout: Some(5),
            ..Profile::default()
        };
        let settings = profile_settings(&defaults, &profile).unwrap();
        assert_eq!(settings.page_size.get(), 100);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.tls, TlsMode::CustomCa("/etc/ssl/corp.pem".into()));
        assert!(settings.user_agent().starts_with("legal-ops cpg-api/"));
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            ca_cert: Some("/etc/ssl/corp.pem".into()),
            insecure: Some(true),
            ..Profile::default()
        };
        let settings = profile_settings(&Defaults::default(), &profile).unwrap();
        assert_eq!(settings.tls, TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let profile = Profile {
            page_size: Some(0),
            ..Profile::default()
        };
        let err = profile_settings(&Defaults::default(), &profile).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "page_size"));
    }

    #[test]
    fn save_round_trips_through_load() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested/config.toml");
            let mut config = Config::default();
            config.profiles.insert(
                "default".into(),
                Profile {
                    host: "https://console.example.com".into(),
                    ..Profile::default()
                },
            );
            save_config_to(&config, &path).unwrap();
            assert_eq!(load_config_from(&path).unwrap(), config);
            Ok(())
        });
    }
}
