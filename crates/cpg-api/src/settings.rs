// ── Runtime client settings ──
//
// An immutable value handed to a `Connection` at construction time and
// shared (behind `Arc`) by every clone of it. Nothing here reads disk or
// the environment; `cpg-config` builds one from a profile.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

/// Items requested per page when the caller doesn't say otherwise.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(500) {
    Some(n) => n,
    None => unreachable!(),
};

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Verify against the platform's root store.
    #[default]
    System,
    /// Verify only against the certificates in this PEM bundle; the
    /// built-in roots are not consulted.
    CustomCa(PathBuf),
    /// Accept any certificate.
    DangerAcceptInvalid,
}

/// Bound for the per-destination storage service cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageCacheSettings {
    pub max_capacity: u64,
    pub time_to_live: Duration,
}

impl Default for StorageCacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 256,
            time_to_live: Duration::from_secs(60 * 60),
        }
    }
}

/// Client-wide settings: page size, TLS policy, timeout, user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub page_size: NonZeroU32,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub user_agent_prefix: Option<String>,
    pub user_agent_suffix: Option<String>,
    pub storage_cache: StorageCacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(60),
            user_agent_prefix: None,
            user_agent_suffix: None,
            storage_cache: StorageCacheSettings::default(),
        }
    }
}

impl Settings {
    pub fn with_page_size(mut self, page_size: NonZeroU32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into()).filter(|p: &String| !p.is_empty());
        self
    }

    pub fn with_user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn with_storage_cache(mut self, storage_cache: StorageCacheSettings) -> Self {
        self.storage_cache = storage_cache;
        self
    }

    /// `{prefix }cpg-api/{version} rust/{rust-version}{ suffix}`
    pub fn user_agent(&self) -> String {
        let mut agent = String::new();
        if let Some(prefix) = self.user_agent_prefix.as_deref() {
            agent.push_str(prefix);
            agent.push(' ');
        }
        agent.push_str(&base_user_agent());
        if let Some(suffix) = self.user_agent_suffix.as_deref() {
            agent.push(' ');
            agent.push_str(suffix);
        }
        agent
    }
}

fn base_user_agent() -> String {
    format!(
        "{}/{} rust/{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_RUST_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_has_sdk_and_runtime() {
        let agent = Settings::default().user_agent();
        assert_eq!(agent, base_user_agent());
        assert!(agent.starts_with("cpg-api/"));
        assert!(agent.contains(" rust/"));
    }

    #[test]
    fn prefix_and_suffix_are_space_separated() {
        let settings = Settings::default()
            .with_user_agent_prefix("example-prefix")
            .with_user_agent_suffix("example-suffix");
        assert_eq!(
            settings.user_agent(),
            format!("example-prefix {} example-suffix", base_user_agent())
        );
    }

    #[test]
    fn empty_prefix_clears_it() {
        let settings = Settings::default()
            .with_user_agent_prefix("x")
            .with_user_agent_prefix("");
        assert_eq!(settings.user_agent_prefix, None);
        assert_eq!(settings.user_agent(), base_user_agent());
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.page_size.get(), 500);
        assert_eq!(settings.tls, TlsMode::System);
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.storage_cache.max_capacity, 256);
    }
}
