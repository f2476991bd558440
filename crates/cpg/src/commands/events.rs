//! Legal hold event handlers.

use serde_json::Value;
use tabled::Tabled;

use cpg_api::{EventFilter, Sdk};

use crate::cli::{EventsArgs, EventsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, field};

use super::util;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Matter")]
    matter: String,
    #[tabled(rename = "Actor")]
    actor: String,
}

fn to_row(e: &Value) -> EventRow {
    EventRow {
        time: field(e, "occurredAt"),
        kind: field(e, "eventType"),
        matter: field(e, "legalHoldUid"),
        actor: field(e, "actorUsername"),
    }
}

pub async fn handle(sdk: &Sdk, args: EventsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        EventsCommand::List { matter, since, until } => {
            let filter = EventFilter {
                matter_uid: matter,
                min_event_date: util::parse_time(since),
                max_event_date: util::parse_time(until),
            };
            let events = util::collect_items(sdk.legal_hold().get_all_events(filter)).await?;
            output::print_output(&output::render_list(global.output, &events, to_row)?);
        }
    }
    Ok(())
}
