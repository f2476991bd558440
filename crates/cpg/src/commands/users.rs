//! User handlers.

use serde_json::Value;
use tabled::Tabled;

use cpg_api::{Sdk, UserFilter};

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output::{self, field};

use super::util;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "UID")]
    uid: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Org")]
    org: String,
    #[tabled(rename = "Active")]
    active: String,
}

fn to_row(u: &Value) -> UserRow {
    UserRow {
        uid: field(u, "userUid"),
        username: field(u, "username"),
        email: field(u, "email"),
        org: field(u, "orgName"),
        active: field(u, "active"),
    }
}

pub async fn handle(sdk: &Sdk, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List {
            inactive,
            org,
            email,
            query,
        } => {
            let filter = UserFilter {
                active: Some(!inactive),
                org_uid: org,
                email,
                q: query,
                ..UserFilter::default()
            };
            let users = util::collect_items(sdk.users().get_all(filter)).await?;
            output::print_output(&output::render_list(global.output, &users, to_row)?);
        }
        UsersCommand::Show { username } => {
            let resp = sdk.users().get_by_username(&username).await?;
            let Some(user) = resp["users"].as_array().and_then(|users| users.first()) else {
                return Err(CliError::NotFound {
                    message: format!("No user named '{username}'"),
                    source: cpg_api::Error::MissingField {
                        field: "users".into(),
                    },
                });
            };
            output::print_output(&output::render_single(global.output, user)?);
        }
    }
    Ok(())
}
