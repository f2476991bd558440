// Console and storage-node services
//
// One struct per API area, each holding a `Connection`. Every operation
// that knows which error bodies are meaningful translates them right next
// to the call; anything it doesn't recognize propagates unchanged.

pub mod administration;
pub mod audit_logs;
pub mod devices;
pub mod legal_hold;
pub mod login_config;
pub mod restore;
pub mod users;

use std::num::NonZeroU32;

use tracing::debug;

use crate::connection::Connection;
use crate::error::Error;

pub use administration::AdministrationService;
pub use audit_logs::{AuditLogFormat, AuditLogQuery, AuditLogService};
pub use devices::{DeviceFilter, DeviceService};
pub use legal_hold::{ActiveState, CustodianFilter, EventFilter, LegalHoldService, MatterFilter, NewMatter};
pub use login_config::LoginConfigurationService;
pub use restore::{
    ExistingFiles, PushRestoreLocation, PushRestoreRequest, PushRestoreService, RestoreSessionRequest,
    StorageArchiveService,
};
pub use users::{NewUser, UserFilter, UserService, UserUpdate};

/// Explicit page size, else the connection's configured default.
pub(crate) fn page_size(connection: &Connection, requested: Option<NonZeroU32>) -> NonZeroU32 {
    requested.unwrap_or(connection.settings().page_size)
}

/// Log a transport → domain translation on its way out.
pub(crate) fn translated(err: Error) -> Error {
    debug!(error = %err, "translated transport error");
    err
}
