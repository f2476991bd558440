use crate::connection::{Connection, Params};
use crate::error::Error;
use crate::response::ApiResponse;
use crate::settings::Settings;

/// Pre-login lookup of how a user is expected to authenticate.
///
/// Runs over an anonymous connection, so it works before any credentials
/// are known.
#[derive(Debug, Clone)]
pub struct LoginConfigurationService {
    connection: Connection,
}

impl LoginConfigurationService {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Build the service directly against `host`.
    pub fn for_host(host: &str, settings: Settings) -> Result<Self, Error> {
        Ok(Self::new(Connection::anonymous(host, settings)?))
    }

    /// `loginType` is one of `LOCAL`, `LOCAL_2FA`, `CLOUD_SSO`. Unknown
    /// usernames report `LOCAL_2FA`.
    pub async fn get_for_user(&self, username: &str) -> Result<ApiResponse, Error> {
        let params = Params::new().push("username", username);
        self.connection
            .get("/api/v3/LoginConfiguration", &params)
            .await
    }
}
