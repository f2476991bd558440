use crate::connection::{Connection, Params};
use crate::error::Error;
use crate::response::ApiResponse;

/// Tenant-level information.
#[derive(Debug, Clone)]
pub struct AdministrationService {
    connection: Connection,
}

impl AdministrationService {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// The tenant the authenticated principal belongs to.
    pub async fn get_current_tenant(&self) -> Result<ApiResponse, Error> {
        self.connection
            .get("/api/v3/customer/my", &Params::new())
            .await
    }
}
