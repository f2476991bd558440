// cpg-api: Async Rust client for the CrashPlan console and storage-node APIs

pub mod connection;
pub mod error;
pub mod pagination;
pub mod response;
pub mod sdk;
pub mod services;
pub mod settings;
pub mod storage;
pub mod timestamp;

mod transport;

pub use connection::{Connection, Params};
pub use error::{Error, HttpFailure};
pub use pagination::{Page, PageIndexing, PageRequest, PagedEndpoint, Pages, paginate};
pub use response::ApiResponse;
pub use sdk::Sdk;
pub use services::{
    ActiveState, AdministrationService, AuditLogFormat, AuditLogQuery, AuditLogService,
    CustodianFilter, DeviceFilter, DeviceService, EventFilter, ExistingFiles, LegalHoldService,
    LoginConfigurationService, MatterFilter, NewMatter, NewUser, PushRestoreLocation,
    PushRestoreRequest, PushRestoreService, RestoreSessionRequest, StorageArchiveService,
    UserFilter, UserService, UserUpdate,
};
pub use settings::{DEFAULT_PAGE_SIZE, Settings, StorageCacheSettings, TlsMode};
pub use storage::StorageServiceFactory;
pub use timestamp::{DATE_STR_FORMAT, Timestamp};
pub use secrecy::SecretString;
