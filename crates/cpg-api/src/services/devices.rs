// Devices (`/api/v1/Computer`).

use std::num::NonZeroU32;

use super::{page_size, translated};
use crate::connection::{Connection, Params};
use crate::error::Error;
use crate::pagination::{PageIndexing, PagedEndpoint, Pages, paginate};
use crate::response::ApiResponse;

pub const DEVICE_LIST: PagedEndpoint = PagedEndpoint {
    path: "/api/v1/Computer",
    indexing: PageIndexing::OneBased,
    items_key: Some("computers"),
};

/// Device list filter. `None` means "don't filter on this".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    pub active: Option<bool>,
    pub blocked: Option<bool>,
    pub org_uid: Option<String>,
    pub user_uid: Option<String>,
    /// Storage server the devices back up to.
    pub destination_guid: Option<String>,
    pub include_backup_usage: Option<bool>,
    pub include_counts: bool,
    /// Loose match on partial GUID, hostname, computer name.
    pub q: Option<String>,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            active: None,
            blocked: None,
            org_uid: None,
            user_uid: None,
            destination_guid: None,
            include_backup_usage: None,
            include_counts: true,
            q: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceService {
    connection: Connection,
}

impl DeviceService {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn get_page(
        &self,
        page_num: u32,
        filter: &DeviceFilter,
        page_size: Option<NonZeroU32>,
    ) -> Result<ApiResponse, Error> {
        let size = super::page_size(&self.connection, page_size);
        let params = Params::new()
            .push_opt("active", filter.active)
            .push_opt("blocked", filter.blocked)
            .push_opt("orgUid", filter.org_uid.as_deref())
            .push_opt("userUid", filter.user_uid.as_deref())
            .push_opt("targetComputerGuid", filter.destination_guid.as_deref())
            .push_opt("incBackupUsage", filter.include_backup_usage)
            .push("incCounts", filter.include_counts)
            .push("pgNum", DEVICE_LIST.indexing.wire_page(page_num))
            .push("pgSize", size)
            .push_opt("q", filter.q.as_deref());
        match self.connection.get(DEVICE_LIST.path, &params).await {
            Err(Error::BadRequest(f)) if f.body_contains("Unable to find org") => {
                Err(translated(Error::OrgNotFound {
                    org_uid: filter.org_uid.clone().unwrap_or_default(),
                    source: f,
                }))
            }
            other => other,
        }
    }

    pub fn get_all(&self, filter: DeviceFilter) -> Pages<'_> {
        paginate(
            move |req| {
                let filter = filter.clone();
                async move {
                    self.get_page(req.page_num, &filter, Some(req.page_size))
                        .await
                }
            },
            DEVICE_LIST.items_key,
            page_size(&self.connection, None),
        )
    }

    pub async fn get_by_guid(
        &self,
        guid: &str,
        include_backup_usage: Option<bool>,
    ) -> Result<ApiResponse, Error> {
        let params = Params::new()
            .push("idType", "guid")
            .push_opt("incBackupUsage", include_backup_usage);
        self.connection
            .get(&format!("{}/{guid}", DEVICE_LIST.path), &params)
            .await
    }

    /// Block a device: its user can no longer log in or restore from it.
    pub async fn block(&self, device_id: u64) -> Result<ApiResponse, Error> {
        self.connection
            .put(&format!("/api/v1/ComputerBlock/{device_id}"))
            .await
    }

    pub async fn unblock(&self, device_id: u64) -> Result<ApiResponse, Error> {
        self.connection
            .delete(&format!("/api/v1/ComputerBlock/{device_id}"))
            .await
    }
}
