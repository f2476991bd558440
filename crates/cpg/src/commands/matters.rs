//! Legal hold matter handlers.

use serde_json::Value;
use tabled::Tabled;

use cpg_api::{ActiveState, MatterFilter, Sdk};

use crate::cli::{GlobalOpts, MattersArgs, MattersCommand};
use crate::error::CliError;
use crate::output::{self, field};

use super::util;

#[derive(Tabled)]
struct MatterRow {
    #[tabled(rename = "UID")]
    uid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Policy")]
    policy: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn to_row(m: &Value) -> MatterRow {
    MatterRow {
        uid: field(m, "legalHoldUid"),
        name: field(m, "name"),
        active: field(m, "active"),
        policy: field(&m["holdPolicy"], "name"),
        created: field(m, "creationDate"),
    }
}

pub async fn handle(sdk: &Sdk, args: MattersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let legal_hold = sdk.legal_hold();
    match args.command {
        MattersCommand::List { inactive, all, name } => {
            let active = if all {
                ActiveState::All
            } else if inactive {
                ActiveState::Inactive
            } else {
                ActiveState::Active
            };
            let filter = MatterFilter {
                active,
                name,
                ..MatterFilter::default()
            };
            let matters = util::collect_items(legal_hold.get_all_matters(filter)).await?;
            let out = output::render_list(global.output, &matters, to_row)?;
            output::print_output(&out);
        }
        MattersCommand::Show { uid } => {
            let resp = legal_hold.get_matter_by_uid(&uid).await?;
            output::print_output(&output::render_single(global.output, resp.data())?);
        }
        MattersCommand::Deactivate { uid } => {
            legal_hold.deactivate_matter(&uid).await?;
            eprintln!("Matter {uid} deactivated");
        }
        MattersCommand::Reactivate { uid } => {
            legal_hold.reactivate_matter(&uid).await?;
            eprintln!("Matter {uid} reactivated");
        }
    }
    Ok(())
}
