//! Command dispatch: CLI args → SDK calls → output formatting.

pub mod audit_logs;
pub mod config_cmd;
pub mod custodians;
pub mod devices;
pub mod events;
pub mod matters;
pub mod tenant;
pub mod users;
pub mod util;

use cpg_api::Sdk;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a console-bound command to its handler.
pub async fn dispatch(cmd: Command, sdk: &Sdk, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Tenant => tenant::handle(sdk, global).await,
        Command::Matters(args) => matters::handle(sdk, args, global).await,
        Command::Custodians(args) => custodians::handle(sdk, args, global).await,
        Command::Events(args) => events::handle(sdk, args, global).await,
        Command::AuditLogs(args) => audit_logs::handle(sdk, args, global).await,
        Command::Devices(args) => devices::handle(sdk, args, global).await,
        Command::Users(args) => users::handle(sdk, args, global).await,
        // Handled before a session is opened.
        Command::LoginConfig { .. } | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Validation {
                field: "command".into(),
                reason: "this command does not need a console session".into(),
            })
        }
    }
}
