//! Device handlers.

use serde_json::Value;
use tabled::Tabled;

use cpg_api::{DeviceFilter, Sdk};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, field};

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "GUID")]
    guid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Connected")]
    last_connected: String,
}

fn to_row(d: &Value) -> DeviceRow {
    DeviceRow {
        guid: field(d, "guid"),
        name: field(d, "name"),
        os: field(d, "osName"),
        status: field(d, "status"),
        last_connected: field(d, "lastConnected"),
    }
}

pub async fn handle(sdk: &Sdk, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { active, org, query } => {
            let filter = DeviceFilter {
                active: active.then_some(true),
                org_uid: org,
                q: query,
                ..DeviceFilter::default()
            };
            let devices = util::collect_items(sdk.devices().get_all(filter)).await?;
            output::print_output(&output::render_list(global.output, &devices, to_row)?);
        }
    }
    Ok(())
}
