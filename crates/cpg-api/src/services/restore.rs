// Web restore sessions and push restores.
//
// Both services run against a `Connection` that has been retargeted at a
// storage node or authority server; see `storage::StorageServiceFactory`.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use strum::{Display, EnumString};

use super::translated;
use crate::connection::{Connection, Params};
use crate::error::Error;
use crate::response::ApiResponse;

// ── Requests ─────────────────────────────────────────────────────────

/// Inputs for `WebRestoreSession`. Which secret is needed depends on the
/// archive's security mode: none, an archive password, or a custom key.
#[derive(Debug, Clone, Default)]
pub struct RestoreSessionRequest {
    pub device_guid: String,
    pub data_key_token: Option<SecretString>,
    pub private_password: Option<SecretString>,
    pub encryption_key: Option<SecretString>,
}

impl RestoreSessionRequest {
    pub fn new(device_guid: impl Into<String>) -> Self {
        Self {
            device_guid: device_guid.into(),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RestoreSessionBody<'r> {
    computer_guid: &'r str,
    data_key_token: Option<&'r str>,
    private_password: Option<&'r str>,
    encryption_key: Option<&'r str>,
}

impl<'r> From<&'r RestoreSessionRequest> for RestoreSessionBody<'r> {
    fn from(req: &'r RestoreSessionRequest) -> Self {
        Self {
            computer_guid: &req.device_guid,
            data_key_token: req.data_key_token.as_ref().map(ExposeSecret::expose_secret),
            private_password: req.private_password.as_ref().map(ExposeSecret::expose_secret),
            encryption_key: req.encryption_key.as_ref().map(ExposeSecret::expose_secret),
        }
    }
}

/// Where pushed files land on the accepting device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum PushRestoreLocation {
    OriginalLocation,
    TargetDirectory,
}

/// What to do when a restored file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ExistingFiles {
    OverwriteOriginal,
    RenameOriginal,
}

/// A push restore job: files from `device_guid`'s archive, restored
/// through the storage node `node_guid` onto `accepting_device_guid`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushRestoreRequest {
    #[serde(rename = "sourceComputerGuid")]
    pub device_guid: String,
    #[serde(rename = "acceptingComputerGuid")]
    pub accepting_device_guid: String,
    pub web_restore_session_id: String,
    #[serde(rename = "targetNodeGuid")]
    pub node_guid: String,
    pub restore_path: String,
    pub restore_groups: Vec<serde_json::Value>,
    pub num_files: u64,
    pub num_bytes: u64,
    pub show_deleted: Option<bool>,
    pub permit_restore_to_different_os_version: Option<bool>,
    pub file_permissions: Option<String>,
    pub restore_full_path: Option<bool>,
    pub file_location: Option<PushRestoreLocation>,
    pub existing_files: Option<ExistingFiles>,
}

// ── Shared restore operations ────────────────────────────────────────

async fn create_restore_session(
    connection: &Connection,
    request: &RestoreSessionRequest,
) -> Result<ApiResponse, Error> {
    let body = RestoreSessionBody::from(request);
    match connection.post("/api/v1/WebRestoreSession", &body).await {
        Err(Error::InternalServer(f)) if f.body_contains("PRIVATE_PASSWORD_INVALID") => {
            Err(translated(Error::InvalidArchivePassword { source: f }))
        }
        Err(Error::InternalServer(f)) if f.body_contains("CUSTOM_KEY_INVALID") => {
            Err(translated(Error::InvalidArchiveEncryptionKey { source: f }))
        }
        other => other,
    }
}

async fn get_restore_status(connection: &Connection, job_id: &str) -> Result<ApiResponse, Error> {
    connection
        .get(&format!("/api/v1/WebRestoreJob/{job_id}"), &Params::new())
        .await
}

// ── Storage archive ──────────────────────────────────────────────────

/// Archive browsing and web restore on one storage node, for one
/// (device, destination) pair. Obtained from the storage factory, which
/// caches one instance per pair.
#[derive(Debug)]
pub struct StorageArchiveService {
    connection: Connection,
}

impl StorageArchiveService {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Token that lets the storage node decrypt the device's archive.
    pub async fn get_data_key_token(&self, device_guid: &str) -> Result<ApiResponse, Error> {
        let body = serde_json::json!({ "computerGuid": device_guid });
        self.connection.post("/api/v1/DataKeyToken", &body).await
    }

    pub async fn create_restore_session(
        &self,
        request: &RestoreSessionRequest,
    ) -> Result<ApiResponse, Error> {
        create_restore_session(&self.connection, request).await
    }

    pub async fn get_restore_status(&self, job_id: &str) -> Result<ApiResponse, Error> {
        get_restore_status(&self.connection, job_id).await
    }

    /// Children of `file_id` (the archive root when `None`) as seen by a
    /// restore session.
    pub async fn get_file_path_metadata(
        &self,
        session_id: &str,
        device_guid: &str,
        file_id: Option<&str>,
        show_deleted: Option<bool>,
    ) -> Result<ApiResponse, Error> {
        let params = Params::new()
            .push("webRestoreSessionId", session_id)
            .push("guid", device_guid)
            .push_opt("fileId", file_id)
            .push_opt("showDeleted", show_deleted);
        self.connection
            .get("/api/v1/WebRestoreTreeNode", &params)
            .await
    }
}

// ── Push restore ─────────────────────────────────────────────────────

/// Restores pushed straight to a device, bypassing the browser download.
#[derive(Debug, Clone)]
pub struct PushRestoreService {
    connection: Connection,
}

impl PushRestoreService {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub async fn create_restore_session(
        &self,
        request: &RestoreSessionRequest,
    ) -> Result<ApiResponse, Error> {
        create_restore_session(&self.connection, request).await
    }

    pub async fn get_restore_status(&self, job_id: &str) -> Result<ApiResponse, Error> {
        get_restore_status(&self.connection, job_id).await
    }

    pub async fn start_push_restore(&self, request: &PushRestoreRequest) -> Result<ApiResponse, Error> {
        match self.connection.post("/api/v38/restore/push", request).await {
            Err(Error::BadRequest(f)) if f.body_contains("CREATE_FAILED") => {
                Err(translated(Error::BadRestoreRequest { source: f }))
            }
            other => other,
        }
    }
}
