//! Storage-node service factory.
//!
//! Archive data lives on storage nodes, not on the console. For each
//! (device, destination) pair the console tells us which node to talk to;
//! the factory asks once, retargets a clone of the console `Connection` at
//! that node, and hands out the same [`StorageArchiveService`] for the pair
//! from then on.
//!
//! The cache is bounded by [`StorageCacheSettings`]: up to `max_capacity`
//! pairs, each kept for `time_to_live`. An evicted pair is simply resolved
//! again on next use.
//!
//! [`StorageCacheSettings`]: crate::settings::StorageCacheSettings

use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::connection::{Connection, Params};
use crate::error::Error;
use crate::services::{DeviceService, PushRestoreService, StorageArchiveService};

const WEB_RESTORE_INFO_PATH: &str = "api/v1/WebRestoreInfo";
const CONNECTED_SERVER_PATH: &str = "api/v1/connectedServerUrl";

type PairKey = (String, String);

/// Builds services bound to storage nodes and authority servers.
pub struct StorageServiceFactory {
    connection: Connection,
    devices: DeviceService,
    archives: Cache<PairKey, Arc<StorageArchiveService>>,
}

impl std::fmt::Debug for StorageServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageServiceFactory")
            .field("connection", &self.connection)
            .field("cached_archives", &self.archives.entry_count())
            .finish_non_exhaustive()
    }
}

impl StorageServiceFactory {
    pub fn new(connection: Connection, devices: DeviceService) -> Self {
        let bounds = connection.settings().storage_cache;
        let archives = Cache::builder()
            .max_capacity(bounds.max_capacity)
            .time_to_live(bounds.time_to_live)
            .build();
        Self {
            connection,
            devices,
            archives,
        }
    }

    /// Ask the console which storage node serves `device_guid`'s archive at
    /// `destination_guid`.
    pub async fn resolve_storage_host(
        &self,
        device_guid: &str,
        destination_guid: &str,
    ) -> Result<String, Error> {
        let params = Params::new()
            .push("srcGuid", device_guid)
            .push("destGuid", destination_guid);
        let resp = self.connection.get(WEB_RESTORE_INFO_PATH, &params).await?;
        Ok(resp.require_str("serverUrl")?.to_owned())
    }

    /// The archive service for a (device, destination) pair.
    ///
    /// The first call for a pair resolves its storage host; later calls
    /// return the cached instance without touching the network. Concurrent
    /// callers for one pair share a single resolution, while other pairs
    /// resolve independently. Failures are not cached.
    pub async fn create_archive_service(
        &self,
        device_guid: &str,
        destination_guid: &str,
    ) -> Result<Arc<StorageArchiveService>, Error> {
        let key = (device_guid.to_owned(), destination_guid.to_owned());
        let init = self.build_archive_service(device_guid, destination_guid);
        match self.archives.try_get_with(key, init).await {
            Ok(service) => Ok(service),
            Err(shared) => match Arc::try_unwrap(shared) {
                Ok(err) => Err(err),
                // Another waiter still holds the shared error; resolve again
                // to hand this caller an owned one.
                Err(_) => self
                    .build_archive_service(device_guid, destination_guid)
                    .await,
            },
        }
    }

    async fn build_archive_service(
        &self,
        device_guid: &str,
        destination_guid: &str,
    ) -> Result<Arc<StorageArchiveService>, Error> {
        let host = self.resolve_storage_host(device_guid, destination_guid).await?;
        debug!(device_guid, destination_guid, %host, "resolved storage node");
        Ok(Arc::new(StorageArchiveService::new(
            self.connection.clone_with_host(&host)?,
        )))
    }

    /// First destination listed in the device's backup usage.
    pub async fn auto_select_destination_guid(&self, device_guid: &str) -> Result<String, Error> {
        let resp = self.devices.get_by_guid(device_guid, Some(true)).await?;
        resp["backupUsage"]
            .as_array()
            .and_then(|usage| usage.first())
            .and_then(|first| first["targetComputerGuid"].as_str())
            .map(str::to_owned)
            .ok_or_else(|| Error::NoDestinationsFound {
                device_guid: device_guid.to_owned(),
            })
    }

    /// A push restore service on the authority server `device_guid` is
    /// currently connected to. Not cached: the connection can move.
    pub async fn create_push_restore_service(
        &self,
        device_guid: &str,
    ) -> Result<PushRestoreService, Error> {
        let params = Params::new().push("guid", device_guid);
        let resp = self.connection.get(CONNECTED_SERVER_PATH, &params).await?;
        let Some(host) = resp["serverUrl"].as_str() else {
            return Err(Error::DeviceNotConnected {
                device_guid: device_guid.to_owned(),
            });
        };
        debug!(device_guid, host, "device authority server");
        Ok(PushRestoreService::new(self.connection.clone_with_host(host)?))
    }
}
