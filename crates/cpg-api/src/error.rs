use std::fmt;

use thiserror::Error;

/// A non-2xx response, captured verbatim.
///
/// Carried by every HTTP-status variant of [`Error`] and embedded as the
/// `#[source]` of every domain variant, so callers can always get back to
/// the status code and the raw body the server sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: u16,
    pub url: String,
    pub raw_text: String,
}

impl HttpFailure {
    /// Whether the raw body contains `token` (case-sensitive).
    pub fn body_contains(&self, token: &str) -> bool {
        self.raw_text.contains(token)
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status");
        write!(f, "HTTP {} {reason} for {}", self.status, self.url)?;
        if !self.raw_text.is_empty() {
            write!(f, ": {}", self.raw_text)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpFailure {}

/// Top-level error type for the `cpg-api` crate.
///
/// Covers transport failures, HTTP status failures (one variant per status
/// the services branch on), and the domain conditions the per-operation
/// translators derive from them.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration error (unreadable or invalid CA bundle).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, wrong second factor, bad token reply).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── HTTP status ─────────────────────────────────────────────────
    #[error("Bad request: {0}")]
    BadRequest(Box<HttpFailure>),

    #[error("Unauthorized: {0}")]
    Unauthorized(Box<HttpFailure>),

    #[error("Forbidden: {0}")]
    Forbidden(Box<HttpFailure>),

    #[error("Not found: {0}")]
    NotFound(Box<HttpFailure>),

    #[error("Too many requests: {0}")]
    TooManyRequests(Box<HttpFailure>),

    #[error("Internal server error: {0}")]
    InternalServer(Box<HttpFailure>),

    /// Any other non-2xx status.
    #[error("Request failed: {0}")]
    Http(Box<HttpFailure>),

    // ── Legal hold ──────────────────────────────────────────────────
    #[error("{source}; legal hold matter with ID={matter_uid} is already active")]
    MatterAlreadyActive {
        matter_uid: String,
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; legal hold matter with ID={matter_uid} has already been deactivated")]
    MatterAlreadyDeactivated {
        matter_uid: String,
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; user with ID {user_uid} is already on the {matter}")]
    UserAlreadyAdded {
        user_uid: String,
        /// `legal hold matter id=…, name=…`
        matter: String,
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; at least one criteria must be specified: matter uid, user uid, or user")]
    CriteriaMissing {
        #[source]
        source: Box<HttpFailure>,
    },

    /// The backend answers 403 both for "missing" and "not yours".
    #[error("{source}; {resource_kind} with UID '{resource_uid}' can not be found, or you do not have permission to access it")]
    NotFoundOrPermissionDenied {
        resource_kind: &'static str,
        resource_uid: String,
        #[source]
        source: Box<HttpFailure>,
    },

    // ── Users / devices / orgs ──────────────────────────────────────
    #[error("{source}; user already exists")]
    UserAlreadyExists {
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; cannot deactivate the {resource_kind} with ID={resource_id} as it is on an active legal hold matter")]
    ActiveLegalHold {
        resource_kind: &'static str,
        resource_id: String,
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; username must be an email address")]
    UsernameMustBeEmail {
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; '{email}' is not a valid email")]
    InvalidEmail {
        email: String,
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; invalid password")]
    InvalidPassword {
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; invalid username")]
    InvalidUsername {
        #[source]
        source: Box<HttpFailure>,
    },

    /// `User/my` only resolves for user sessions, not API clients.
    #[error("{source}; user not found (this lookup does not work with API client authentication)")]
    CurrentUserNotFound {
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; the organization with UID '{org_uid}' was not found")]
    OrgNotFound {
        org_uid: String,
        #[source]
        source: Box<HttpFailure>,
    },

    // ── Storage / restore ───────────────────────────────────────────
    #[error("{source}; unable to create restore session")]
    BadRestoreRequest {
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; invalid archive password")]
    InvalidArchivePassword {
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("{source}; invalid archive encryption key")]
    InvalidArchiveEncryptionKey {
        #[source]
        source: Box<HttpFailure>,
    },

    #[error("No destinations found for device guid: {device_guid}")]
    NoDestinationsFound { device_guid: String },

    #[error("Device with GUID '{device_guid}' is not currently connected to the Authority server")]
    DeviceNotConnected { device_guid: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A field the operation depends on was absent from the response.
    #[error("Response is missing expected field '{field}'")]
    MissingField { field: String },

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl Error {
    /// Map a non-2xx status to its transport-level variant.
    pub(crate) fn from_status(failure: HttpFailure) -> Self {
        let failure = Box::new(failure);
        match failure.status {
            400 => Self::BadRequest(failure),
            401 => Self::Unauthorized(failure),
            403 => Self::Forbidden(failure),
            404 => Self::NotFound(failure),
            429 => Self::TooManyRequests(failure),
            500 => Self::InternalServer(failure),
            _ => Self::Http(failure),
        }
    }

    /// The captured HTTP failure, for both status and domain variants.
    pub fn http_failure(&self) -> Option<&HttpFailure> {
        match self {
            Self::BadRequest(f)
            | Self::Unauthorized(f)
            | Self::Forbidden(f)
            | Self::NotFound(f)
            | Self::TooManyRequests(f)
            | Self::InternalServer(f)
            | Self::Http(f)
            | Self::MatterAlreadyActive { source: f, .. }
            | Self::MatterAlreadyDeactivated { source: f, .. }
            | Self::UserAlreadyAdded { source: f, .. }
            | Self::CriteriaMissing { source: f }
            | Self::NotFoundOrPermissionDenied { source: f, .. }
            | Self::OrgNotFound { source: f, .. }
            | Self::UserAlreadyExists { source: f }
            | Self::ActiveLegalHold { source: f, .. }
            | Self::UsernameMustBeEmail { source: f }
            | Self::InvalidEmail { source: f, .. }
            | Self::InvalidPassword { source: f }
            | Self::InvalidUsername { source: f }
            | Self::CurrentUserNotFound { source: f }
            | Self::BadRestoreRequest { source: f }
            | Self::InvalidArchivePassword { source: f }
            | Self::InvalidArchiveEncryptionKey { source: f } => Some(f),
            _ => None,
        }
    }

    /// HTTP status code, if this error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            other => other.http_failure().map(|f| f.status),
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Nothing in this crate retries; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::TooManyRequests(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Unauthorized(_))
    }
}
