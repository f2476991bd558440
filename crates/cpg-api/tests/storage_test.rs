#![allow(clippy::unwrap_used)]
// Integration tests for `StorageServiceFactory` and the restore services.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cpg_api::{
    Error, ExistingFiles, PushRestoreLocation, PushRestoreRequest, RestoreSessionRequest, Sdk,
    Settings, StorageCacheSettings,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(settings: Settings) -> (MockServer, Sdk) {
    let server = MockServer::start().await;
    let sdk = Sdk::from_token(&server.uri(), SecretString::from("tok".to_owned()), settings).unwrap();
    (server, sdk)
}

async fn setup() -> (MockServer, Sdk) {
    setup_with(Settings::default()).await
}

/// Storage nodes are reached at the URL the console hands back; point that
/// at the mock server itself.
async fn mount_restore_info(server: &MockServer, device: &str, destination: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/WebRestoreInfo"))
        .and(query_param("srcGuid", device))
        .and(query_param("destGuid", destination))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serverUrl": server.uri() })))
        .expect(calls)
        .mount(server)
        .await;
}

// ── Archive service cache ───────────────────────────────────────────

#[tokio::test]
async fn test_archive_service_resolved_once_per_pair() {
    let (server, sdk) = setup().await;
    mount_restore_info(&server, "dev-1", "dest-1", 1).await;

    let storage = sdk.storage();
    let first = storage.create_archive_service("dev-1", "dest-1").await.unwrap();
    let second = storage.create_archive_service("dev-1", "dest-1").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.connection().shares_session_with(sdk.connection()));
}

#[tokio::test]
async fn test_distinct_pairs_get_distinct_services() {
    let (server, sdk) = setup().await;
    mount_restore_info(&server, "dev-1", "dest-1", 1).await;
    mount_restore_info(&server, "dev-1", "dest-2", 1).await;

    let storage = sdk.storage();
    let a = storage.create_archive_service("dev-1", "dest-1").await.unwrap();
    let b = storage.create_archive_service("dev-1", "dest-2").await.unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_resolution() {
    let (server, sdk) = setup().await;
    mount_restore_info(&server, "dev-1", "dest-1", 1).await;

    let storage = sdk.storage();
    let (a, b) = tokio::join!(
        storage.create_archive_service("dev-1", "dest-1"),
        storage.create_archive_service("dev-1", "dest-1"),
    );
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
}

#[tokio::test]
async fn test_distinct_pairs_resolve_concurrently() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/WebRestoreInfo"))
        .and(query_param("destGuid", "slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "serverUrl": server.uri() }))
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_restore_info(&server, "dev-1", "fast", 1).await;

    let storage = sdk.storage();
    let slow = storage.create_archive_service("dev-1", "slow");
    let fast = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let started = std::time::Instant::now();
        storage.create_archive_service("dev-1", "fast").await.unwrap();
        started.elapsed()
    };
    let (slow, fast_elapsed) = tokio::join!(slow, fast);

    slow.unwrap();
    assert!(
        fast_elapsed < Duration::from_millis(1000),
        "fast pair waited {fast_elapsed:?} behind an unrelated resolution"
    );
}

#[tokio::test]
async fn test_expired_entry_is_resolved_again() {
    let settings = Settings::default().with_storage_cache(StorageCacheSettings {
        max_capacity: 8,
        time_to_live: Duration::from_millis(50),
    });
    let (server, sdk) = setup_with(settings).await;
    mount_restore_info(&server, "dev-1", "dest-1", 2).await;

    let storage = sdk.storage();
    let first = storage.create_archive_service("dev-1", "dest-1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let second = storage.create_archive_service("dev-1", "dest-1").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_failed_resolution_is_not_cached() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/WebRestoreInfo"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_restore_info(&server, "dev-1", "dest-1", 1).await;

    let storage = sdk.storage();
    let err = storage.create_archive_service("dev-1", "dest-1").await.unwrap_err();
    assert!(matches!(err, Error::InternalServer(_)));
    storage.create_archive_service("dev-1", "dest-1").await.unwrap();
}

// ── Destination selection ───────────────────────────────────────────

#[tokio::test]
async fn test_auto_select_takes_first_destination() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/Computer/dev-1"))
        .and(query_param("idType", "guid"))
        .and(query_param("incBackupUsage", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "backupUsage": [
                { "targetComputerGuid": "dest-a" },
                { "targetComputerGuid": "dest-b" },
            ] }
        })))
        .mount(&server)
        .await;

    let guid = sdk.storage().auto_select_destination_guid("dev-1").await.unwrap();
    assert_eq!(guid, "dest-a");
}

#[tokio::test]
async fn test_auto_select_without_destinations() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/Computer/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "backupUsage": [] } })))
        .mount(&server)
        .await;

    let err = sdk.storage().auto_select_destination_guid("dev-1").await.unwrap_err();
    assert!(
        matches!(err, Error::NoDestinationsFound { ref device_guid } if device_guid == "dev-1"),
        "{err:?}"
    );
}

// ── Restore ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wrong_archive_password() {
    let (server, sdk) = setup().await;
    mount_restore_info(&server, "dev-1", "dest-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/WebRestoreSession"))
        .and(body_partial_json(json!({ "computerGuid": "dev-1", "privatePassword": "nope" })))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"[{"name":"PRIVATE_PASSWORD_INVALID"}]"#))
        .mount(&server)
        .await;

    let archive = sdk.storage().create_archive_service("dev-1", "dest-1").await.unwrap();
    let mut request = RestoreSessionRequest::new("dev-1");
    request.private_password = Some(SecretString::from("nope".to_owned()));

    let err = archive.create_restore_session(&request).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArchivePassword { .. }), "{err:?}");
}

#[tokio::test]
async fn test_wrong_encryption_key() {
    let (server, sdk) = setup().await;
    mount_restore_info(&server, "dev-1", "dest-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/WebRestoreSession"))
        .respond_with(ResponseTemplate::new(500).set_body_string("CUSTOM_KEY_INVALID"))
        .mount(&server)
        .await;

    let archive = sdk.storage().create_archive_service("dev-1", "dest-1").await.unwrap();
    let err = archive
        .create_restore_session(&RestoreSessionRequest::new("dev-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArchiveEncryptionKey { .. }), "{err:?}");
}

#[tokio::test]
async fn test_archive_session_flow() {
    let (server, sdk) = setup().await;
    mount_restore_info(&server, "dev-1", "dest-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/DataKeyToken"))
        .and(body_partial_json(json!({ "computerGuid": "dev-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "dataKeyToken": "dkt" } })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/WebRestoreSession"))
        .and(body_partial_json(json!({ "dataKeyToken": "dkt" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "webRestoreSessionId": "s-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/WebRestoreTreeNode"))
        .and(query_param("webRestoreSessionId", "s-1"))
        .and(query_param("guid", "dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "path": "/" }] })))
        .expect(1)
        .mount(&server)
        .await;

    let archive = sdk.storage().create_archive_service("dev-1", "dest-1").await.unwrap();
    let token = archive.get_data_key_token("dev-1").await.unwrap();

    let mut request = RestoreSessionRequest::new("dev-1");
    request.data_key_token = Some(SecretString::from(token.require_str("dataKeyToken").unwrap().to_owned()));
    let session = archive.create_restore_session(&request).await.unwrap();
    let session_id = session.require_str("webRestoreSessionId").unwrap();

    let tree = archive
        .get_file_path_metadata(session_id, "dev-1", None, None)
        .await
        .unwrap();
    assert_eq!(tree.data()[0]["path"], "/");
}

// ── Push restore ────────────────────────────────────────────────────

fn push_request() -> PushRestoreRequest {
    PushRestoreRequest {
        device_guid: "dev-1".into(),
        accepting_device_guid: "dev-2".into(),
        web_restore_session_id: "s-1".into(),
        node_guid: "node-1".into(),
        restore_path: "/restore".into(),
        restore_groups: vec![],
        num_files: 1,
        num_bytes: 10,
        show_deleted: None,
        permit_restore_to_different_os_version: None,
        file_permissions: None,
        restore_full_path: None,
        file_location: Some(PushRestoreLocation::OriginalLocation),
        existing_files: Some(ExistingFiles::OverwriteOriginal),
    }
}

#[tokio::test]
async fn test_push_restore_on_connected_server() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/connectedServerUrl"))
        .and(query_param("guid", "dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "serverUrl": server.uri() } })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v38/restore/push"))
        .and(body_partial_json(json!({
            "sourceComputerGuid": "dev-1",
            "acceptingComputerGuid": "dev-2",
            "fileLocation": "ORIGINAL_LOCATION",
            "existingFiles": "OVERWRITE_ORIGINAL",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "restoreId": "r-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let push = sdk.storage().create_push_restore_service("dev-1").await.unwrap();
    let resp = push.start_push_restore(&push_request()).await.unwrap();
    assert_eq!(resp["restoreId"], "r-1");
}

#[tokio::test]
async fn test_push_restore_create_failed() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/connectedServerUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "serverUrl": server.uri() } })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v38/restore/push"))
        .respond_with(ResponseTemplate::new(400).set_body_string("CREATE_FAILED"))
        .mount(&server)
        .await;

    let push = sdk.storage().create_push_restore_service("dev-1").await.unwrap();
    let err = push.start_push_restore(&push_request()).await.unwrap_err();
    assert!(matches!(err, Error::BadRestoreRequest { .. }), "{err:?}");
}

#[tokio::test]
async fn test_push_restore_for_offline_device() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/connectedServerUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "serverUrl": null } })))
        .mount(&server)
        .await;

    let err = sdk.storage().create_push_restore_service("dev-1").await.unwrap_err();
    assert!(matches!(err, Error::DeviceNotConnected { .. }), "{err:?}");
}
