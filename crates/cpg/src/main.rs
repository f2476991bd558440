mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cpg_api::Sdk;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    config::resolve_output(&mut cli.global, &cpg_config::load_config_or_default())?;

    match cli.command {
        // Local-only commands
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "cpg", &mut std::io::stdout());
            Ok(())
        }

        // Needs a host but no login
        Command::LoginConfig { ref username } => {
            let cfg = cpg_config::load_config_or_default();
            let target = config::resolve_target(&cli.global, &cfg)?;
            commands::tenant::login_config(&target, username, &cli.global).await
        }

        cmd => {
            let sdk = open_session(&cli.global).await?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &sdk, &cli.global).await
        }
    }
}

/// Resolve the profile and credentials, then log in.
async fn open_session(global: &cli::GlobalOpts) -> Result<Sdk, CliError> {
    let cfg = cpg_config::load_config()?;
    let target = config::resolve_target(global, &cfg)?;
    let username = target.username.clone().ok_or_else(|| CliError::NoCredentials {
        profile: target.profile_name.clone(),
    })?;
    let password = target.password()?;

    Sdk::from_password(
        &target.host,
        &username,
        &password,
        global.totp.as_deref(),
        target.settings.clone(),
    )
    .await
    .map_err(|e| CliError::from(e).for_profile(&target.profile_name))
}
