// Session/connection layer
//
// A `Connection` is a host address plus an authenticated transport. All
// services issue their calls through `get`/`post`/`put`/`delete` here;
// non-2xx replies come back as the status-specific `Error` variants that
// the per-operation translators branch on.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, HttpFailure};
use crate::response::ApiResponse;
use crate::settings::Settings;
use crate::transport;

const JWT_PATH: &str = "/api/v3/auth/jwt";
const OAUTH_TOKEN_PATH: &str = "/api/v3/oauth/token";
const TOTP_HEADER: &str = "totp-auth";

// ── Query parameters ─────────────────────────────────────────────────

/// Ordered query parameters. `None` values are dropped rather than sent empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(&'static str, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    pub fn push_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    fn as_slice(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

// ── Authentication state ─────────────────────────────────────────────

enum Credentials {
    Password {
        username: String,
        password: SecretString,
    },
    ApiClient {
        client_id: String,
        secret: SecretString,
    },
    /// Pre-issued bearer token; cannot be renewed.
    Token,
}

/// Shared by every clone of a `Connection`. The token is the only thing
/// that ever changes, and only through `Connection::reauthenticate`.
struct SessionAuth {
    login_host: Url,
    credentials: Credentials,
    token: ArcSwapOption<SecretString>,
}

// ── Connection ───────────────────────────────────────────────────────

/// A host address bound to an (optionally) authenticated HTTP session.
///
/// Cheap to clone. [`Connection::clone_with_host`] retargets a clone at a
/// storage node while sharing the session: same `reqwest::Client` (pool and
/// cookie jar), same bearer token, same settings.
#[derive(Clone)]
pub struct Connection {
    http: reqwest::Client,
    host_address: Url,
    auth: Option<Arc<SessionAuth>>,
    settings: Arc<Settings>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host_address", &self.host_address.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Connection {
    // ── Constructors ─────────────────────────────────────────────────

    /// Log in with username/password (plus an optional TOTP second factor)
    /// and return a connection carrying the issued bearer token.
    ///
    /// `GET /api/v3/auth/jwt?useBody=true` with HTTP Basic credentials.
    pub async fn authenticate(
        host: &str,
        username: &str,
        password: &SecretString,
        second_factor: Option<&str>,
        settings: Settings,
    ) -> Result<Self, Error> {
        let credentials = Credentials::Password {
            username: username.to_owned(),
            password: password.clone(),
        };
        Self::login(host, credentials, second_factor, settings).await
    }

    /// Log in as an API client (OAuth client-credentials grant).
    ///
    /// `POST /api/v3/oauth/token?grant_type=client_credentials`
    pub async fn authenticate_api_client(
        host: &str,
        client_id: &str,
        secret: &SecretString,
        settings: Settings,
    ) -> Result<Self, Error> {
        let credentials = Credentials::ApiClient {
            client_id: client_id.to_owned(),
            secret: secret.clone(),
        };
        Self::login(host, credentials, None, settings).await
    }

    /// Wrap an already-issued bearer token. No network call is made.
    pub fn with_token(host: &str, token: SecretString, settings: Settings) -> Result<Self, Error> {
        let host_address = parse_host(host)?;
        let http = transport::build_client(&settings)?;
        let auth = SessionAuth {
            login_host: host_address.clone(),
            credentials: Credentials::Token,
            token: ArcSwapOption::from_pointee(token),
        };
        Ok(Self {
            http,
            host_address,
            auth: Some(Arc::new(auth)),
            settings: Arc::new(settings),
        })
    }

    /// A connection that sends no `Authorization` header, for the few
    /// endpoints that are reachable before login.
    pub fn anonymous(host: &str, settings: Settings) -> Result<Self, Error> {
        let host_address = parse_host(host)?;
        let http = transport::build_client(&settings)?;
        Ok(Self {
            http,
            host_address,
            auth: None,
            settings: Arc::new(settings),
        })
    }

    async fn login(
        host: &str,
        credentials: Credentials,
        second_factor: Option<&str>,
        settings: Settings,
    ) -> Result<Self, Error> {
        let host_address = parse_host(host)?;
        let http = transport::build_client(&settings)?;
        let token = fetch_token(&http, &host_address, &credentials, second_factor).await?;
        let auth = SessionAuth {
            login_host: host_address.clone(),
            credentials,
            token: ArcSwapOption::from_pointee(token),
        };
        Ok(Self {
            http,
            host_address,
            auth: Some(Arc::new(auth)),
            settings: Arc::new(settings),
        })
    }

    /// Re-run the original login flow and swap the new token into the
    /// shared session, so every clone picks it up.
    pub async fn reauthenticate(&self, second_factor: Option<&str>) -> Result<(), Error> {
        let auth = self.auth.as_ref().ok_or_else(|| Error::Authentication {
            message: "connection was created without credentials".into(),
        })?;
        let token = fetch_token(&self.http, &auth.login_host, &auth.credentials, second_factor).await?;
        auth.token.store(Some(Arc::new(token)));
        debug!(host = %auth.login_host, "session token renewed");
        Ok(())
    }

    /// A new connection to `host` that shares this one's session.
    ///
    /// Does not re-authenticate: storage nodes accept the console's token.
    pub fn clone_with_host(&self, host: &str) -> Result<Self, Error> {
        Ok(Self {
            http: self.http.clone(),
            host_address: parse_host(host)?,
            auth: self.auth.clone(),
            settings: Arc::clone(&self.settings),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn host_address(&self) -> &Url {
        &self.host_address
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.as_ref().is_some_and(|a| a.token.load().is_some())
    }

    /// Whether both connections ride on the same authenticated session.
    pub fn shares_session_with(&self, other: &Self) -> bool {
        match (&self.auth, &other.auth) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    // ── Request primitives ───────────────────────────────────────────

    pub async fn get(&self, path: &str, params: &Params) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={:?}", params.as_slice());
        self.send(self.http.get(url).query(params.as_slice())).await
    }

    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");
        self.send(self.http.post(url).json(body)).await
    }

    /// POST with a custom `Accept` header (CSV/CEF exports).
    pub async fn post_with_accept<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
        accept: &'static str,
    ) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("POST {url} accept={accept}");
        self.send(self.http.post(url).header(ACCEPT, accept).json(body))
            .await
    }

    /// POST without a body (state-change endpoints such as user block).
    pub async fn post_empty(&self, path: &str) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");
        self.send(self.http.post(url)).await
    }

    pub async fn put(&self, path: &str) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");
        self.send(self.http.put(url)).await
    }

    pub async fn put_json<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");
        self.send(self.http.put(url).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");
        self.send(self.http.delete(url)).await
    }

    // ── Internals ────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.host_address.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiResponse, Error> {
        let request = match self.bearer()? {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };
        let resp = request.send().await?;
        read_response(resp).await
    }

    fn bearer(&self) -> Result<Option<HeaderValue>, Error> {
        let Some(token) = self.auth.as_ref().and_then(|a| a.token.load_full()) else {
            return Ok(None);
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid bearer token header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

/// Accept `https://host[:port]` or a bare `host[:port]` (https assumed).
fn parse_host(host: &str) -> Result<Url, Error> {
    let host = host.trim();
    if host.contains("://") {
        Ok(Url::parse(host)?)
    } else {
        Ok(Url::parse(&format!("https://{host}"))?)
    }
}

async fn read_response(resp: reqwest::Response) -> Result<ApiResponse, Error> {
    let status = resp.status();
    let url = resp.url().to_string();
    let raw_text = resp.text().await?;

    if status.is_success() {
        Ok(ApiResponse::new(status.as_u16(), url, raw_text))
    } else {
        debug!(status = status.as_u16(), %url, "request failed");
        Err(Error::from_status(HttpFailure {
            status: status.as_u16(),
            url,
            raw_text,
        }))
    }
}

async fn fetch_token(
    http: &reqwest::Client,
    host: &Url,
    credentials: &Credentials,
    second_factor: Option<&str>,
) -> Result<SecretString, Error> {
    let base = host.as_str().trim_end_matches('/');
    let (request, field) = match credentials {
        Credentials::Password { username, password } => {
            let url = Url::parse(&format!("{base}{JWT_PATH}"))?;
            debug!("logging in at {url}");
            let mut request = http
                .get(url)
                .query(&[("useBody", "true")])
                .basic_auth(username, Some(password.expose_secret()));
            if let Some(code) = second_factor {
                request = request.header(TOTP_HEADER, code);
            }
            (request, "v3_user_token")
        }
        Credentials::ApiClient { client_id, secret } => {
            let url = Url::parse(&format!("{base}{OAUTH_TOKEN_PATH}"))?;
            debug!("requesting API client token at {url}");
            let request = http
                .post(url)
                .query(&[("grant_type", "client_credentials")])
                .basic_auth(client_id, Some(secret.expose_secret()));
            (request, "access_token")
        }
        Credentials::Token => {
            return Err(Error::Authentication {
                message: "a pre-issued token cannot be renewed".into(),
            });
        }
    };

    let resp = match read_response(request.send().await?).await {
        Ok(resp) => resp,
        Err(Error::Unauthorized(failure) | Error::Forbidden(failure)) => {
            return Err(Error::Authentication {
                message: failure.to_string(),
            });
        }
        Err(other) => return Err(other),
    };

    let token = resp.require_str(field).map_err(|_| Error::Authentication {
        message: format!("login response did not include '{field}'"),
    })?;
    debug!("login successful");
    Ok(SecretString::from(token.to_owned()))
}
