//! CLI error types with miette diagnostics.
//!
//! Maps `cpg_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use cpg_api::Error as ApiError;
use cpg_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {host}")]
    #[diagnostic(
        code(cpg::connection_failed),
        help(
            "Check the console address and your network.\n\
             Host: {host}"
        )
    )]
    ConnectionFailed {
        host: String,
        #[source]
        source: ApiError,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(cpg::timeout),
        help("Increase the timeout with --timeout or set `timeout` in your profile.")
    )]
    Timeout {
        #[source]
        source: ApiError,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(cpg::tls),
        help("Check ca_cert in your profile, or use --insecure (-k) for test consoles.")
    )]
    Tls { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(cpg::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Accounts with two-factor login also need --totp.\n\
             Run: cpg login-config <username> to see the expected login type."
        )
    )]
    AuthFailed {
        profile: String,
        #[source]
        source: ApiError,
    },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(cpg::no_credentials),
        help(
            "Set a username with --username or in the profile, and a password via\n\
             CPG_PASSWORD, `cpg config set-password`, or the interactive prompt."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(cpg::not_found))]
    NotFound {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("{message}")]
    #[diagnostic(code(cpg::conflict))]
    Conflict {
        message: String,
        #[source]
        source: ApiError,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(cpg::api_error))]
    Api(ApiError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cpg::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No console address configured")]
    #[diagnostic(
        code(cpg::no_config),
        help(
            "Pass --host, set CPG_HOST, or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(code(cpg::profile_not_found), help("Available profiles: {available}"))]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(cpg::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(cpg::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the profile name to authentication failures.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { source, .. } => Self::AuthFailed {
                profile: profile.to_owned(),
                source,
            },
            other => other,
        }
    }
}

// ── ApiError → CliError mapping ──────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(ref e) if e.is_timeout() => Self::Timeout { source: err },
            ApiError::Transport(ref e) if e.is_connect() => {
                let host = e
                    .url()
                    .and_then(|u| u.host_str())
                    .unwrap_or("(unknown host)")
                    .to_owned();
                Self::ConnectionFailed { host, source: err }
            }
            ApiError::Tls(message) => Self::Tls { message },
            ApiError::Authentication { .. } | ApiError::Unauthorized(_) => Self::AuthFailed {
                profile: "current".into(),
                source: err,
            },
            ApiError::NotFoundOrPermissionDenied { .. }
            | ApiError::OrgNotFound { .. }
            | ApiError::NotFound(_)
            | ApiError::CurrentUserNotFound { .. }
            | ApiError::NoDestinationsFound { .. } => Self::NotFound {
                message: err.to_string(),
                source: err,
            },
            ApiError::MatterAlreadyActive { .. }
            | ApiError::MatterAlreadyDeactivated { .. }
            | ApiError::UserAlreadyAdded { .. }
            | ApiError::UserAlreadyExists { .. }
            | ApiError::ActiveLegalHold { .. } => Self::Conflict {
                message: err.to_string(),
                source: err,
            },
            ApiError::InvalidArgument { argument, reason } => Self::Validation {
                field: argument,
                reason,
            },
            other => Self::Api(other),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
