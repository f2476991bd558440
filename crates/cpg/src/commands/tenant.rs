//! Tenant and login-configuration handlers.

use cpg_api::{LoginConfigurationService, Sdk};

use crate::cli::GlobalOpts;
use crate::config::Target;
use crate::error::CliError;
use crate::output;

pub async fn handle(sdk: &Sdk, global: &GlobalOpts) -> Result<(), CliError> {
    let resp = sdk.administration().get_current_tenant().await?;
    let out = output::render_single(global.output, resp.data())?;
    output::print_output(&out);
    Ok(())
}

/// Runs before login: needs only the host.
pub async fn login_config(target: &Target, username: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let service = LoginConfigurationService::for_host(&target.host, target.settings.clone())?;
    let resp = service.get_for_user(username).await?;
    let out = output::render_single(global.output, resp.data())?;
    output::print_output(&out);
    Ok(())
}
