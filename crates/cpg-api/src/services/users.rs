// Users (`/api/v1/User`, `/api/v3/users`).
//
// The v1 endpoints address users by numeric ID or UID; the v3 state-change
// endpoints only take UIDs, so ID-based operations look the UID up first.

use std::num::NonZeroU32;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};

use super::{page_size, translated};
use crate::connection::{Connection, Params};
use crate::error::Error;
use crate::pagination::{PageIndexing, PagedEndpoint, Pages, paginate};
use crate::response::ApiResponse;

const USER: &str = "user";

pub const USER_LIST: PagedEndpoint = PagedEndpoint {
    path: "/api/v1/User",
    indexing: PageIndexing::OneBased,
    items_key: Some("users"),
};

/// User list filter. `None` means "don't filter on this".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub active: Option<bool>,
    pub email: Option<String>,
    pub org_uid: Option<String>,
    pub role_id: Option<u64>,
    /// Loose match across name, username, and email.
    pub q: Option<String>,
}

/// A user to create. An existing username is updated in place by the
/// backend rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub org_uid: String,
    pub username: String,
    pub email: String,
    pub password: Option<SecretString>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub notes: Option<String>,
}

impl NewUser {
    pub fn new(
        org_uid: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            org_uid: org_uid.into(),
            username: username.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUserBody<'u> {
    org_uid: &'u str,
    username: &'u str,
    email: &'u str,
    password: Option<&'u str>,
    first_name: Option<&'u str>,
    last_name: Option<&'u str>,
    notes: Option<&'u str>,
}

impl<'u> From<&'u NewUser> for NewUserBody<'u> {
    fn from(user: &'u NewUser) -> Self {
        Self {
            org_uid: &user.org_uid,
            username: &user.username,
            email: &user.email,
            password: user.password.as_ref().map(ExposeSecret::expose_secret),
            first_name: user.first_name.as_deref(),
            last_name: user.last_name.as_deref(),
            notes: user.notes.as_deref(),
        }
    }
}

/// Fields to change on an existing user; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub notes: Option<String>,
    pub archive_size_quota_bytes: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserUpdateBody<'u> {
    username: Option<&'u str>,
    email: Option<&'u str>,
    password: Option<&'u str>,
    first_name: Option<&'u str>,
    last_name: Option<&'u str>,
    notes: Option<&'u str>,
    quota_in_bytes: Option<u64>,
}

impl<'u> From<&'u UserUpdate> for UserUpdateBody<'u> {
    fn from(update: &'u UserUpdate) -> Self {
        Self {
            username: update.username.as_deref(),
            email: update.email.as_deref(),
            password: update.password.as_ref().map(ExposeSecret::expose_secret),
            first_name: update.first_name.as_deref(),
            last_name: update.last_name.as_deref(),
            notes: update.notes.as_deref(),
            quota_in_bytes: update.archive_size_quota_bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserService {
    connection: Connection,
}

impl UserService {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<ApiResponse, Error> {
        let body = NewUserBody::from(user);
        match self.connection.post(USER_LIST.path, &body).await {
            Err(Error::InternalServer(f)) if f.body_contains("USER_DUPLICATE") => {
                Err(translated(Error::UserAlreadyExists { source: f }))
            }
            other => other,
        }
    }

    pub async fn get_by_id(&self, user_id: u64) -> Result<ApiResponse, Error> {
        self.connection
            .get(&format!("{}/{user_id}", USER_LIST.path), &Params::new())
            .await
    }

    pub async fn get_by_uid(&self, user_uid: &str) -> Result<ApiResponse, Error> {
        let params = Params::new().push("idType", "uid");
        self.connection
            .get(&format!("{}/{user_uid}", USER_LIST.path), &params)
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<ApiResponse, Error> {
        let params = Params::new().push("username", username);
        self.connection.get(USER_LIST.path, &params).await
    }

    /// The signed-in user. Only meaningful for user sessions.
    pub async fn get_current(&self) -> Result<ApiResponse, Error> {
        match self.connection.get("/api/v1/User/my", &Params::new()).await {
            Err(Error::NotFound(f)) => Err(translated(Error::CurrentUserNotFound { source: f })),
            other => other,
        }
    }

    pub async fn get_page(
        &self,
        page_num: u32,
        filter: &UserFilter,
        page_size: Option<NonZeroU32>,
    ) -> Result<ApiResponse, Error> {
        let params = Params::new()
            .push_opt("active", filter.active)
            .push_opt("email", filter.email.as_deref())
            .push_opt("orgUid", filter.org_uid.as_deref())
            .push_opt("roleId", filter.role_id)
            .push("pgNum", USER_LIST.indexing.wire_page(page_num))
            .push("pgSize", super::page_size(&self.connection, page_size))
            .push_opt("q", filter.q.as_deref());
        match self.connection.get(USER_LIST.path, &params).await {
            Err(Error::BadRequest(f)) if f.body_contains("Organization was not found") => {
                Err(translated(Error::OrgNotFound {
                    org_uid: filter.org_uid.clone().unwrap_or_default(),
                    source: f,
                }))
            }
            other => other,
        }
    }

    pub fn get_all(&self, filter: UserFilter) -> Pages<'_> {
        paginate(
            move |req| {
                let filter = filter.clone();
                async move {
                    self.get_page(req.page_num, &filter, Some(req.page_size))
                        .await
                }
            },
            USER_LIST.items_key,
            page_size(&self.connection, None),
        )
    }

    /// Division, department, title and similar directory attributes.
    pub async fn get_scim_data_by_uid(&self, user_uid: &str) -> Result<ApiResponse, Error> {
        let params = Params::new().push("userId", user_uid);
        self.connection
            .get("/api/v38/scim-user-data/collated-view", &params)
            .await
    }

    /// A blocked user can't log in or restore; backups keep running.
    pub async fn block(&self, user_id: u64) -> Result<ApiResponse, Error> {
        let path = self.v3_path(user_id, "block").await?;
        self.connection.post_empty(&path).await
    }

    pub async fn unblock(&self, user_id: u64) -> Result<ApiResponse, Error> {
        let path = self.v3_path(user_id, "unblock").await?;
        self.connection.post_empty(&path).await
    }

    /// Stop backups for the user; their archives move to cold storage.
    pub async fn deactivate(
        &self,
        user_id: u64,
        block_user: Option<bool>,
    ) -> Result<ApiResponse, Error> {
        let path = self.v3_path(user_id, "deactivate").await?;
        let body = json!({ "block": block_user });
        match self.connection.post(&path, &body).await {
            Err(Error::BadRequest(f)) if f.body_contains("ACTIVE_LEGAL_HOLD") => {
                Err(translated(Error::ActiveLegalHold {
                    resource_kind: USER,
                    resource_id: user_id.to_string(),
                    source: f,
                }))
            }
            other => other,
        }
    }

    pub async fn reactivate(
        &self,
        user_id: u64,
        unblock_user: Option<bool>,
    ) -> Result<ApiResponse, Error> {
        let path = self.v3_path(user_id, "activate").await?;
        self.connection
            .post(&path, &json!({ "unblock": unblock_user }))
            .await
    }

    /// Move the user into the organization `org_id`.
    pub async fn change_org_assignment(
        &self,
        user_id: u64,
        org_id: u64,
    ) -> Result<ApiResponse, Error> {
        let path = self.v3_path(user_id, "move").await?;
        self.connection.post(&path, &json!({ "orgId": org_id })).await
    }

    /// Roles the signed-in user may hand out.
    pub async fn get_available_roles(&self) -> Result<ApiResponse, Error> {
        self.connection.get("/api/v1/role", &Params::new()).await
    }

    pub async fn get_roles(&self, user_id: u64) -> Result<ApiResponse, Error> {
        let path = self.v3_path(user_id, "roles").await?;
        self.connection.get(&path, &Params::new()).await
    }

    /// Grant a role, named either by display name ("Desktop User") or by
    /// ID ("desktop-user").
    pub async fn add_role(&self, user_id: u64, role: &str) -> Result<ApiResponse, Error> {
        let role_id = self.available_role_id(role).await?;
        let mut role_ids = self.role_ids(user_id).await?;
        if !role_ids.contains(&role_id) {
            role_ids.push(role_id);
        }
        self.update_roles(user_id, &role_ids).await
    }

    pub async fn remove_role(&self, user_id: u64, role: &str) -> Result<ApiResponse, Error> {
        let role_id = self.available_role_id(role).await?;
        let mut role_ids = self.role_ids(user_id).await?;
        role_ids.retain(|id| *id != role_id);
        self.update_roles(user_id, &role_ids).await
    }

    pub async fn update_user(
        &self,
        user_uid: &str,
        update: &UserUpdate,
    ) -> Result<ApiResponse, Error> {
        let path = format!("{}/{user_uid}?idType=uid", USER_LIST.path);
        let body = UserUpdateBody::from(update);
        match self.connection.put_json(&path, &body).await {
            Err(Error::InternalServer(f)) if f.body_contains("USERNAME_NOT_AN_EMAIL") => {
                Err(translated(Error::UsernameMustBeEmail { source: f }))
            }
            Err(Error::InternalServer(f)) if f.body_contains("EMAIL_INVALID") => {
                Err(translated(Error::InvalidEmail {
                    email: update.email.clone().unwrap_or_default(),
                    source: f,
                }))
            }
            Err(Error::InternalServer(f)) if f.body_contains("NEW_PASSWORD_INVALID") => {
                Err(translated(Error::InvalidPassword { source: f }))
            }
            Err(Error::InternalServer(f)) if f.body_contains("INVALID_USERNAME") => {
                Err(translated(Error::InvalidUsername { source: f }))
            }
            other => other,
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn v3_path(&self, user_id: u64, action: &str) -> Result<String, Error> {
        let resp = self.get_by_id(user_id).await?;
        let uid = resp.require_str("userUid")?;
        Ok(format!("/api/v3/users/{uid}/{action}"))
    }

    async fn role_ids(&self, user_id: u64) -> Result<Vec<String>, Error> {
        let resp = self.get_roles(user_id).await?;
        Ok(role_entries(resp.data())
            .filter_map(|r| r["roleId"].as_str().map(str::to_owned))
            .collect())
    }

    async fn available_role_id(&self, role: &str) -> Result<String, Error> {
        let resp = self.get_available_roles().await?;
        role_entries(resp.data())
            .find(|r| r["roleName"].as_str() == Some(role) || r["roleId"].as_str() == Some(role))
            .and_then(|r| r["roleId"].as_str().map(str::to_owned))
            .ok_or_else(|| Error::InvalidArgument {
                argument: "role".into(),
                reason: format!("'{role}' is not a role you can assign"),
            })
    }

    async fn update_roles(&self, user_id: u64, role_ids: &[String]) -> Result<ApiResponse, Error> {
        let path = self.v3_path(user_id, "roles").await?;
        self.connection
            .put_json(&path, &json!({ "roleIds": role_ids }))
            .await
    }
}

fn role_entries(data: &Value) -> impl Iterator<Item = &Value> {
    data.as_array().into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_body_uses_backend_field_names() {
        let mut user = NewUser::new("org-1", "jane@example.com", "jane@example.com");
        user.password = Some(SecretString::from("s3cret".to_owned()));
        let body = serde_json::to_value(NewUserBody::from(&user)).expect("serialize");
        assert_eq!(body["orgUid"], "org-1");
        assert_eq!(body["password"], "s3cret");
        assert!(body["firstName"].is_null());
    }

    #[test]
    fn update_body_renames_quota() {
        let update = UserUpdate {
            archive_size_quota_bytes: Some(1024),
            ..UserUpdate::default()
        };
        let body = serde_json::to_value(UserUpdateBody::from(&update)).expect("serialize");
        assert_eq!(body["quotaInBytes"], 1024);
        assert!(body["email"].is_null());
    }

    #[test]
    fn role_entries_tolerates_non_arrays() {
        assert_eq!(role_entries(&json!({ "roleId": "x" })).count(), 0);
        assert_eq!(role_entries(&json!([{ "roleId": "a" }, { "roleId": "b" }])).count(), 2);
    }
}
