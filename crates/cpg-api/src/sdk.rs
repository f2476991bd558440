// Top-level entry point
//
// `Sdk` owns one authenticated console `Connection` and hands out the
// services built on it. Services are cheap handles; the storage factory is
// the only one with state of its own (the archive cache), so it is built
// once and shared.

use std::sync::Arc;

use secrecy::SecretString;

use crate::connection::Connection;
use crate::error::Error;
use crate::services::{
    AdministrationService, AuditLogService, DeviceService, LegalHoldService,
    LoginConfigurationService, UserService,
};
use crate::settings::Settings;
use crate::storage::StorageServiceFactory;

/// An authenticated console session with accessors for each API area.
#[derive(Debug, Clone)]
pub struct Sdk {
    connection: Connection,
    storage: Arc<StorageServiceFactory>,
}

impl Sdk {
    /// Log in with username and password.
    pub async fn from_password(
        host: &str,
        username: &str,
        password: &SecretString,
        second_factor: Option<&str>,
        settings: Settings,
    ) -> Result<Self, Error> {
        let connection =
            Connection::authenticate(host, username, password, second_factor, settings).await?;
        Ok(Self::from_connection(connection))
    }

    /// Log in as an API client.
    pub async fn from_api_client(
        host: &str,
        client_id: &str,
        secret: &SecretString,
        settings: Settings,
    ) -> Result<Self, Error> {
        let connection =
            Connection::authenticate_api_client(host, client_id, secret, settings).await?;
        Ok(Self::from_connection(connection))
    }

    /// Use a bearer token obtained elsewhere.
    pub fn from_token(host: &str, token: SecretString, settings: Settings) -> Result<Self, Error> {
        Ok(Self::from_connection(Connection::with_token(host, token, settings)?))
    }

    pub fn from_connection(connection: Connection) -> Self {
        let storage = StorageServiceFactory::new(connection.clone(), DeviceService::new(connection.clone()));
        Self {
            connection,
            storage: Arc::new(storage),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn legal_hold(&self) -> LegalHoldService {
        LegalHoldService::new(self.connection.clone())
    }

    pub fn audit_logs(&self) -> AuditLogService {
        AuditLogService::new(self.connection.clone())
    }

    pub fn devices(&self) -> DeviceService {
        DeviceService::new(self.connection.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.connection.clone())
    }

    pub fn administration(&self) -> AdministrationService {
        AdministrationService::new(self.connection.clone())
    }

    pub fn storage(&self) -> &StorageServiceFactory {
        &self.storage
    }

    /// Login configuration lookups go out without the bearer token.
    pub fn login_configuration(&self) -> Result<LoginConfigurationService, Error> {
        LoginConfigurationService::for_host(
            self.connection.host_address().as_str(),
            self.connection.settings().clone(),
        )
    }
}
