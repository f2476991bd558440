// Legal hold: preservation policies, matters, custodian memberships, events.
//
// All endpoints live under `/api/v38` and number their pages from 1.

use std::num::NonZeroU32;
use std::str::FromStr;

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::{page_size, translated};
use crate::connection::{Connection, Params};
use crate::error::{Error, HttpFailure};
use crate::pagination::{PageIndexing, PagedEndpoint, Pages, paginate};
use crate::response::ApiResponse;
use crate::timestamp::{Timestamp, optional_millis};

const URI_PREFIX: &str = "/api/v38";

const MATTER: &str = "matter";
const POLICY: &str = "policy";
const MEMBERSHIP: &str = "membership";

pub const MATTER_LIST: PagedEndpoint = PagedEndpoint {
    path: "/api/v38/legal-hold-matter/list",
    indexing: PageIndexing::OneBased,
    items_key: None,
};

pub const MEMBERSHIP_LIST: PagedEndpoint = PagedEndpoint {
    path: "/api/v38/legal-hold-membership/list",
    indexing: PageIndexing::OneBased,
    items_key: None,
};

pub const EVENT_LIST: PagedEndpoint = PagedEndpoint {
    path: "/api/v38/legal-hold-event/list",
    indexing: PageIndexing::OneBased,
    items_key: None,
};

// ── Filters ──────────────────────────────────────────────────────────

/// Active-state filter for matters and memberships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveState {
    #[default]
    Active,
    Inactive,
    All,
}

impl ActiveState {
    /// Matters take `true`/`false`; "all" is expressed by omission.
    fn matter_param(self) -> Option<&'static str> {
        match self {
            Self::Active => Some("true"),
            Self::Inactive => Some("false"),
            Self::All => None,
        }
    }

    fn membership_param(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::All => "ALL",
        }
    }
}

impl From<Option<bool>> for ActiveState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Active,
            Some(false) => Self::Inactive,
            None => Self::All,
        }
    }
}

impl FromStr for ActiveState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "active" => Ok(Self::Active),
            "false" | "inactive" => Ok(Self::Inactive),
            "all" | "none" => Ok(Self::All),
            _ => Err(Error::InvalidArgument {
                argument: "active".into(),
                reason: format!("'{s}': active must be true, false, or all"),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatterFilter {
    pub creator_user_uid: Option<String>,
    pub active: ActiveState,
    /// Matches names equal to or containing this value.
    pub name: Option<String>,
    pub external_reference: Option<String>,
}

/// At least one of `matter_uid`, `user_uid`, or `user` is required by the
/// backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustodianFilter {
    pub matter_uid: Option<String>,
    pub user_uid: Option<String>,
    /// Partial match on username, email, external reference, or last name.
    pub user: Option<String>,
    pub active: ActiveState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub matter_uid: Option<String>,
    pub min_event_date: Option<Timestamp>,
    pub max_event_date: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMatter {
    pub name: String,
    #[serde(rename = "policyId")]
    pub policy_uid: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub external_reference: Option<String>,
}

impl NewMatter {
    pub fn new(name: impl Into<String>, policy_uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy_uid: policy_uid.into(),
            description: None,
            notes: None,
            external_reference: None,
        }
    }
}

// ── Service ──────────────────────────────────────────────────────────

/// Legal hold policies, matters, and custodians.
#[derive(Debug, Clone)]
pub struct LegalHoldService {
    connection: Connection,
}

fn not_found_or_denied(source: Box<HttpFailure>, uid: &str, kind: &'static str) -> Error {
    translated(Error::NotFoundOrPermissionDenied {
        resource_kind: kind,
        resource_uid: uid.to_owned(),
        source,
    })
}

impl LegalHoldService {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    // ── Policies ─────────────────────────────────────────────────────

    pub async fn create_policy(&self, name: &str) -> Result<ApiResponse, Error> {
        self.connection
            .post(&format!("{URI_PREFIX}/legal-hold-policy/create"), &json!({ "name": name }))
            .await
    }

    pub async fn get_policy_list(&self) -> Result<ApiResponse, Error> {
        self.connection
            .get(&format!("{URI_PREFIX}/legal-hold-policy/list"), &Params::new())
            .await
    }

    pub async fn get_policy_by_uid(&self, policy_uid: &str) -> Result<ApiResponse, Error> {
        let params = Params::new().push("legalHoldPolicyUid", policy_uid);
        match self
            .connection
            .get(&format!("{URI_PREFIX}/legal-hold-policy/view"), &params)
            .await
        {
            Err(Error::Forbidden(f)) => Err(not_found_or_denied(f, policy_uid, POLICY)),
            other => other,
        }
    }

    // ── Matters ──────────────────────────────────────────────────────

    /// Create a new, active matter.
    pub async fn create_matter(&self, matter: &NewMatter) -> Result<ApiResponse, Error> {
        self.connection
            .post(&format!("{URI_PREFIX}/legal-hold-matter/create"), matter)
            .await
    }

    pub async fn get_matter_by_uid(&self, matter_uid: &str) -> Result<ApiResponse, Error> {
        let params = Params::new().push("legalHoldUid", matter_uid);
        match self
            .connection
            .get(&format!("{URI_PREFIX}/legal-hold-matter/view"), &params)
            .await
        {
            Err(Error::Forbidden(f)) => Err(not_found_or_denied(f, matter_uid, MATTER)),
            other => other,
        }
    }

    pub async fn get_matters_page(
        &self,
        page_num: u32,
        filter: &MatterFilter,
        page_size: Option<NonZeroU32>,
    ) -> Result<ApiResponse, Error> {
        let size = super::page_size(&self.connection, page_size);
        let params = Params::new()
            .push_opt("creatorPrincipalId", filter.creator_user_uid.as_deref())
            .push_opt("active", filter.active.matter_param())
            .push_opt("name", filter.name.as_deref())
            .push_opt("externalReference", filter.external_reference.as_deref())
            .push("page", MATTER_LIST.indexing.wire_page(page_num))
            .push("pageSize", size);
        self.connection.get(MATTER_LIST.path, &params).await
    }

    /// Every matter matching `filter`, one page at a time.
    pub fn get_all_matters(&self, filter: MatterFilter) -> Pages<'_> {
        paginate(
            move |req| {
                let filter = filter.clone();
                async move {
                    self.get_matters_page(req.page_num, &filter, Some(req.page_size))
                        .await
                }
            },
            MATTER_LIST.items_key,
            page_size(&self.connection, None),
        )
    }

    pub async fn deactivate_matter(&self, matter_uid: &str) -> Result<ApiResponse, Error> {
        let body = json!({ "legalHoldUid": matter_uid });
        match self
            .connection
            .post(&format!("{URI_PREFIX}/legal-hold-matter/deactivate"), &body)
            .await
        {
            Err(Error::BadRequest(f)) if f.body_contains("ALREADY_DEACTIVATED") => {
                Err(translated(Error::MatterAlreadyDeactivated {
                    matter_uid: matter_uid.to_owned(),
                    source: f,
                }))
            }
            Err(Error::Forbidden(f)) => Err(not_found_or_denied(f, matter_uid, MATTER)),
            other => other,
        }
    }

    pub async fn reactivate_matter(&self, matter_uid: &str) -> Result<ApiResponse, Error> {
        let body = json!({ "legalHoldUid": matter_uid });
        match self
            .connection
            .post(&format!("{URI_PREFIX}/legal-hold-matter/activate"), &body)
            .await
        {
            Err(Error::BadRequest(f)) if f.body_contains("ALREADY_ACTIVE") => {
                Err(translated(Error::MatterAlreadyActive {
                    matter_uid: matter_uid.to_owned(),
                    source: f,
                }))
            }
            Err(Error::Forbidden(f)) => Err(not_found_or_denied(f, matter_uid, MATTER)),
            other => other,
        }
    }

    // ── Custodians ───────────────────────────────────────────────────

    pub async fn get_custodians_page(
        &self,
        page_num: u32,
        filter: &CustodianFilter,
        page_size: Option<NonZeroU32>,
    ) -> Result<ApiResponse, Error> {
        let size = super::page_size(&self.connection, page_size);
        let params = Params::new()
            .push_opt("userUid", filter.user_uid.as_deref())
            .push_opt("legalHoldUid", filter.matter_uid.as_deref())
            .push_opt("user", filter.user.as_deref())
            .push("active", filter.active.membership_param())
            .push("page", MEMBERSHIP_LIST.indexing.wire_page(page_num))
            .push("pageSize", size);
        match self.connection.get(MEMBERSHIP_LIST.path, &params).await {
            Err(Error::BadRequest(f)) if f.body_contains("At least one criteria must be specified") => {
                Err(translated(Error::CriteriaMissing { source: f }))
            }
            other => other,
        }
    }

    /// Every membership matching `filter`. Inactive memberships are users
    /// who have been released from the matter.
    pub fn get_all_matter_custodians(&self, filter: CustodianFilter) -> Pages<'_> {
        paginate(
            move |req| {
                let filter = filter.clone();
                async move {
                    self.get_custodians_page(req.page_num, &filter, Some(req.page_size))
                        .await
                }
            },
            MEMBERSHIP_LIST.items_key,
            page_size(&self.connection, None),
        )
    }

    /// Add a user (custodian) to a matter.
    ///
    /// When the user is already on hold, the matter is looked up once more
    /// so the error can name it.
    pub async fn add_to_matter(&self, user_uid: &str, matter_uid: &str) -> Result<ApiResponse, Error> {
        let body = json!({ "legalHoldUid": matter_uid, "userUid": user_uid });
        match self
            .connection
            .post(&format!("{URI_PREFIX}/legal-hold-membership/create"), &body)
            .await
        {
            Err(Error::BadRequest(f)) if f.body_contains("USER_ALREADY_IN_HOLD") => {
                debug!(user_uid, matter_uid, "user already in hold, resolving matter name");
                let matter = self.get_matter_by_uid(matter_uid).await?;
                let name = matter["name"].as_str().unwrap_or_default();
                Err(translated(Error::UserAlreadyAdded {
                    user_uid: user_uid.to_owned(),
                    matter: format!("legal hold matter id={matter_uid}, name={name}"),
                    source: f,
                }))
            }
            Err(Error::Forbidden(f)) => Err(not_found_or_denied(f, matter_uid, MATTER)),
            other => other,
        }
    }

    /// Release a custodian from a matter.
    pub async fn remove_from_matter(&self, membership_uid: &str) -> Result<ApiResponse, Error> {
        let body = json!({ "legalHoldMembershipUid": membership_uid });
        match self
            .connection
            .post(&format!("{URI_PREFIX}/legal-hold-membership/deactivate"), &body)
            .await
        {
            Err(Error::Forbidden(f)) => Err(not_found_or_denied(f, membership_uid, MEMBERSHIP)),
            other => other,
        }
    }

    // ── Events ───────────────────────────────────────────────────────

    pub async fn get_events_page(
        &self,
        page_num: u32,
        filter: &EventFilter,
        page_size: Option<NonZeroU32>,
    ) -> Result<ApiResponse, Error> {
        let size = super::page_size(&self.connection, page_size);
        let params = Params::new()
            .push_opt("legalHoldUid", filter.matter_uid.as_deref())
            .push_opt("minEventDate", optional_millis(filter.min_event_date.as_ref())?)
            .push_opt("maxEventDate", optional_millis(filter.max_event_date.as_ref())?)
            .push("page", EVENT_LIST.indexing.wire_page(page_num))
            .push("pageSize", size);
        self.connection.get(EVENT_LIST.path, &params).await
    }

    pub fn get_all_events(&self, filter: EventFilter) -> Pages<'_> {
        paginate(
            move |req| {
                let filter = filter.clone();
                async move {
                    self.get_events_page(req.page_num, &filter, Some(req.page_size))
                        .await
                }
            },
            EVENT_LIST.items_key,
            page_size(&self.connection, None),
        )
    }
}
