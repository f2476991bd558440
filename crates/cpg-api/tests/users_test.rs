#![allow(clippy::unwrap_used)]
// Integration tests for `UserService`.

use std::num::NonZeroU32;

use futures_util::TryStreamExt;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cpg_api::{Error, NewUser, Page, Sdk, Settings, UserFilter, UserUpdate};

async fn setup_with(settings: Settings) -> (MockServer, Sdk) {
    let server = MockServer::start().await;
    let sdk = Sdk::from_token(&server.uri(), SecretString::from("tok".to_owned()), settings).unwrap();
    (server, sdk)
}

async fn setup() -> (MockServer, Sdk) {
    setup_with(Settings::default()).await
}

/// ID → UID lookup that every v3 state change goes through.
async fn mount_user_42(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/User/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "userId": 42, "userUid": "u-42" } })),
        )
        .mount(server)
        .await;
}

// ── Lookups ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_by_uid_and_username() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/User/u-1"))
        .and(query_param("idType", "uid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "username": "jane" } })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/User"))
        .and(query_param("username", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "users": [{ "userUid": "u-1" }], "totalCount": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let users = sdk.users();
    let by_uid = users.get_by_uid("u-1").await.unwrap();
    assert_eq!(by_uid["username"], "jane");
    let by_name = users.get_by_username("jane@example.com").await.unwrap();
    assert_eq!(by_name["users"][0]["userUid"], "u-1");
}

#[tokio::test]
async fn test_current_user_missing_for_api_clients() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/User/my"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = sdk.users().get_current().await.unwrap_err();
    assert!(matches!(err, Error::CurrentUserNotFound { .. }));
    assert!(err.to_string().contains("API client"));
}

// ── Paging ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_all_pages_under_users_key() {
    let settings = Settings::default().with_page_size(NonZeroU32::new(2).unwrap());
    let (server, sdk) = setup_with(settings).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/User"))
        .and(query_param("pgNum", "1"))
        .and(query_param("pgSize", "2"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "users": [{ "userUid": "u-1" }, { "userUid": "u-2" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/User"))
        .and(query_param("pgNum", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "users": [{ "userUid": "u-3" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = UserFilter {
        active: Some(true),
        ..UserFilter::default()
    };
    let pages: Vec<Page> = sdk.users().get_all(filter).try_collect().await.unwrap();
    let uids: Vec<_> = pages
        .iter()
        .flat_map(Page::items)
        .map(|u| u["userUid"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(uids, ["u-1", "u-2", "u-3"]);
}

#[tokio::test]
async fn test_unknown_org_on_user_list() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/User"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Organization was not found"))
        .mount(&server)
        .await;

    let filter = UserFilter {
        org_uid: Some("org-9".into()),
        ..UserFilter::default()
    };
    let err = sdk.users().get_page(1, &filter, None).await.unwrap_err();
    assert!(matches!(err, Error::OrgNotFound { ref org_uid, .. } if org_uid == "org-9"));
}

// ── Create / update ─────────────────────────────────────────────────

#[tokio::test]
async fn test_duplicate_user_is_translated() {
    let (server, sdk) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/User"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"[{"name":"USER_DUPLICATE"}]"#))
        .mount(&server)
        .await;

    let user = NewUser::new("org-1", "jane@example.com", "jane@example.com");
    let err = sdk.users().create_user(&user).await.unwrap_err();
    assert!(matches!(err, Error::UserAlreadyExists { .. }));
}

#[tokio::test]
async fn test_update_user_translates_invalid_email() {
    let (server, sdk) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/User/u-1"))
        .and(query_param("idType", "uid"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"[{"name":"EMAIL_INVALID"}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let update = UserUpdate {
        email: Some("not-an-email".into()),
        ..UserUpdate::default()
    };
    let err = sdk.users().update_user("u-1", &update).await.unwrap_err();
    assert!(matches!(err, Error::InvalidEmail { ref email, .. } if email == "not-an-email"));
}

// ── State changes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_block_looks_up_uid_first() {
    let (server, sdk) = setup().await;
    mount_user_42(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v3/users/u-42/block"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    sdk.users().block(42).await.unwrap();
}

#[tokio::test]
async fn test_deactivate_user_on_legal_hold() {
    let (server, sdk) = setup().await;
    mount_user_42(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v3/users/u-42/deactivate"))
        .and(body_json(json!({ "block": true })))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"problem":"ACTIVE_LEGAL_HOLD"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = sdk.users().deactivate(42, Some(true)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::ActiveLegalHold { resource_kind: "user", ref resource_id, .. } if resource_id == "42"
    ));
}

#[tokio::test]
async fn test_change_org_assignment() {
    let (server, sdk) = setup().await;
    mount_user_42(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v3/users/u-42/move"))
        .and(body_json(json!({ "orgId": 7 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    sdk.users().change_org_assignment(42, 7).await.unwrap();
}

// ── Roles ───────────────────────────────────────────────────────────

async fn mount_roles(server: &MockServer, expected_ids: serde_json::Value) {
    mount_user_42(server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/role"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
            { "roleId": "desktop-user", "roleName": "Desktop User" },
            { "roleId": "security-center-user", "roleName": "Security Center User" },
        ] })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/users/u-42/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "roleId": "desktop-user" },
        ])))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/v3/users/u-42/roles"))
        .and(body_json(json!({ "roleIds": expected_ids })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_add_role_by_name() {
    let (server, sdk) = setup().await;
    mount_roles(&server, json!(["desktop-user", "security-center-user"])).await;

    sdk.users().add_role(42, "Security Center User").await.unwrap();
}

#[tokio::test]
async fn test_remove_role_by_id() {
    let (server, sdk) = setup().await;
    mount_roles(&server, json!([])).await;

    sdk.users().remove_role(42, "desktop-user").await.unwrap();
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let (server, sdk) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/role"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let err = sdk.users().add_role(42, "Wizard").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { ref argument, .. } if argument == "role"));
}
