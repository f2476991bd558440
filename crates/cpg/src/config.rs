//! CLI-side resolution: config file + profile + global flags → a login
//! target and client `Settings`.

use std::num::NonZeroU32;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use clap::ValueEnum;

use cpg_api::{Settings, TlsMode};
use cpg_config::{Config, Profile};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything needed to open a console session.
#[derive(Debug)]
pub struct Target {
    pub profile_name: String,
    pub host: String,
    pub username: Option<String>,
    pub settings: Settings,
    profile: Profile,
}

/// Build the target from the config file, the selected profile, and CLI
/// overrides. A missing profile is fine as long as `--host` is given.
pub fn resolve_target(global: &GlobalOpts, cfg: &Config) -> Result<Target, CliError> {
    let profile_name = cfg.profile_name(global.profile.as_deref()).to_owned();

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() && global.host.is_none() => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    let host = global
        .host
        .clone()
        .or_else(|| Some(profile.host.clone()).filter(|h| !h.is_empty()))
        .ok_or_else(|| CliError::NoConfig {
            path: cpg_config::config_path().display().to_string(),
        })?;

    let mut settings = cpg_config::profile_settings(&cfg.defaults, &profile)?;
    apply_overrides(&mut settings, global)?;

    debug!(profile = %profile_name, %host, "resolved console target");
    Ok(Target {
        username: global.username.clone().or_else(|| profile.username.clone()),
        profile_name,
        host,
        settings,
        profile,
    })
}

/// Settle the output format: `-o`/`CPG_OUTPUT`, else `defaults.output`.
pub fn resolve_output(global: &mut GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    global.output = match global.output_flag {
        Some(format) => format,
        None => OutputFormat::from_str(&cfg.defaults.output, true).map_err(|_| {
            CliError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "'{}' is not one of table, json, json-compact, yaml",
                    cfg.defaults.output
                ),
            }
        })?,
    };
    Ok(())
}

fn apply_overrides(settings: &mut Settings, global: &GlobalOpts) -> Result<(), CliError> {
    if global.insecure {
        settings.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        settings.timeout = Duration::from_secs(secs);
    }
    if let Some(size) = global.page_size {
        settings.page_size = NonZeroU32::new(size).ok_or_else(|| CliError::Validation {
            field: "page-size".into(),
            reason: "must be greater than zero".into(),
        })?;
    }
    Ok(())
}

impl Target {
    /// Password from the config chain, else an interactive prompt.
    pub fn password(&self) -> Result<SecretString, CliError> {
        match cpg_config::resolve_password(&self.profile, &self.profile_name) {
            Ok(pw) => Ok(pw),
            Err(cpg_config::ConfigError::NoCredentials { .. }) => self.prompt_password(),
            Err(other) => Err(other.into()),
        }
    }

    fn prompt_password(&self) -> Result<SecretString, CliError> {
        let username = self.username.as_deref().unwrap_or("user");
        let prompt = format!("Password for {username} at {}: ", self.host);
        let pw = rpassword::prompt_password(prompt).map_err(|_| CliError::NoCredentials {
            profile: self.profile_name.clone(),
        })?;
        if pw.is_empty() {
            return Err(CliError::NoCredentials {
                profile: self.profile_name.clone(),
            });
        }
        Ok(SecretString::from(pw))
    }
}
