//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", cpg_config::config_path().display());
        }
        ConfigCommand::Show => {
            let cfg = cpg_config::load_config()?;
            let mut value =
                serde_json::to_value(&cfg).map_err(|e| CliError::Render(e.to_string()))?;
            if let Some(profiles) = value.get_mut("profiles").and_then(|p| p.as_object_mut()) {
                for profile in profiles.values_mut() {
                    if let Some(pw) = profile.get_mut("password").filter(|pw| !pw.is_null()) {
                        *pw = serde_json::Value::from("********");
                    }
                }
            }
            output::print_output(&output::render_single(global.output, &value)?);
        }
        ConfigCommand::SetPassword => {
            let cfg = cpg_config::load_config_or_default();
            let profile = cfg.profile_name(global.profile.as_deref());
            let password = rpassword::prompt_password(format!("Password for profile '{profile}': "))?;
            cpg_config::store_password(profile, &password)?;
            eprintln!("Password stored in the OS keyring for profile '{profile}'");
        }
    }
    Ok(())
}
