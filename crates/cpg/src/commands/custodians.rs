//! Custodian (matter membership) handlers.

use serde_json::Value;
use tabled::Tabled;

use cpg_api::{ActiveState, CustodianFilter, Sdk};

use crate::cli::{CustodiansArgs, CustodiansCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, field};

use super::util;

#[derive(Tabled)]
struct CustodianRow {
    #[tabled(rename = "Membership")]
    membership: String,
    #[tabled(rename = "User UID")]
    user_uid: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Added")]
    added: String,
}

fn to_row(m: &Value) -> CustodianRow {
    CustodianRow {
        membership: field(m, "legalHoldMembershipUid"),
        user_uid: field(&m["user"], "userUid"),
        username: field(&m["user"], "username"),
        active: field(m, "active"),
        added: field(m, "creationDate"),
    }
}

pub async fn handle(sdk: &Sdk, args: CustodiansArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let legal_hold = sdk.legal_hold();
    match args.command {
        CustodiansCommand::List { matter, all } => {
            let filter = CustodianFilter {
                matter_uid: Some(matter),
                active: if all { ActiveState::All } else { ActiveState::Active },
                ..CustodianFilter::default()
            };
            let custodians = util::collect_items(legal_hold.get_all_matter_custodians(filter)).await?;
            output::print_output(&output::render_list(global.output, &custodians, to_row)?);
        }
        CustodiansCommand::Add { matter, user } => {
            let resp = legal_hold.add_to_matter(&user, &matter).await?;
            output::print_output(&output::render_single(global.output, resp.data())?);
        }
        CustodiansCommand::Remove { membership } => {
            legal_hold.remove_from_matter(&membership).await?;
            eprintln!("Membership {membership} released");
        }
    }
    Ok(())
}
