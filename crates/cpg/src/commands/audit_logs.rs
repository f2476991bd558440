//! Audit log search handlers.

use serde_json::Value;
use tabled::Tabled;

use cpg_api::{AuditLogFormat, AuditLogQuery, Sdk};

use crate::cli::{AuditExportFormat, AuditLogsArgs, AuditLogsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, field};

use super::util;

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Actor")]
    actor: String,
    #[tabled(rename = "IP")]
    ip: String,
}

fn to_row(e: &Value) -> AuditRow {
    AuditRow {
        time: field(e, "timestamp"),
        kind: field(e, "type$"),
        actor: field(e, "actorName"),
        ip: field(e, "actorIpAddress"),
    }
}

pub async fn handle(sdk: &Sdk, args: AuditLogsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuditLogsCommand::Search {
            since,
            until,
            event_types,
            actors,
            format,
        } => {
            let query = AuditLogQuery {
                begin_time: util::parse_time(since),
                end_time: util::parse_time(until),
                event_types,
                usernames: actors,
                ..AuditLogQuery::default()
            };
            let audit_logs = sdk.audit_logs();

            // Raw exports are a single page of text, printed as received.
            if let Some(format) = format {
                let format = match format {
                    AuditExportFormat::Csv => AuditLogFormat::Csv,
                    AuditExportFormat::Cef => AuditLogFormat::Cef,
                };
                let resp = audit_logs.get_page(1, &query, None, format).await?;
                output::print_output(resp.raw_text().trim_end());
                return Ok(());
            }

            let events = util::collect_items(audit_logs.get_all(query)).await?;
            output::print_output(&output::render_list(global.output, &events, to_row)?);
        }
    }
    Ok(())
}
