//! Sign-in state management. These run outside the admin command envelope:
//! they only read and write the profile store.

use crate::auth::ACCESS_TOKEN_ENV;
use crate::config::Profile;
use crate::context::{Account, ContextResolver, Environment, SessionContext};
use crate::error::{AdminError, Result};
use crate::output::{self, OutputSink};
use clap::Args;
use console::style;
use std::path::Path;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    /// Resource manager endpoint, e.g. https://adminmanagement.local.azurestack.external
    #[arg(long)]
    pub endpoint: Url,

    #[arg(long, default_value = "AzureStack")]
    pub environment_name: String,

    /// Gallery endpoint, if the deployment exposes one separately; gallery
    /// commands use it instead of the resource manager endpoint
    #[arg(long)]
    pub gallery_endpoint: Option<Url>,

    #[arg(long)]
    pub account: String,

    #[arg(long)]
    pub tenant: Option<String>,

    /// Default provider subscription for admin calls
    #[arg(long)]
    pub subscription: Option<String>,

    /// Bearer token; prompted for when omitted and $STACKADM_ACCESS_TOKEN is unset
    #[arg(long)]
    pub token: Option<String>,
}

impl LoginArgs {
    fn into_context(self, token: Option<String>) -> SessionContext {
        SessionContext {
            environment: Environment {
                name: self.environment_name,
                resource_manager: self.endpoint,
                gallery: self.gallery_endpoint,
            },
            account: Account {
                id: self.account,
                access_token: token,
            },
            tenant_id: self.tenant,
            subscription_id: self.subscription,
        }
    }
}

/// Stores a new default context, replacing any existing one.
pub fn login(mut args: LoginArgs, profile_path: &Path) -> Result<SessionContext> {
    let token = match args.token.take() {
        Some(token) => Some(token),
        None if std::env::var_os(ACCESS_TOKEN_ENV).is_some() => None,
        None => Some(
            dialoguer::Password::new()
                .with_prompt("Access token")
                .interact()
                .map_err(|e| AdminError::Config(e.to_string()))?,
        ),
    };

    let context = args.into_context(token);
    let mut profile = Profile::load(profile_path)?;
    profile.default_context = Some(context.clone());
    profile.save(profile_path)?;

    info!(account = %context.account.id, environment = %context.environment.name, "signed in");
    eprintln!(
        "✅ Signed in as {} to {}",
        style(&context.account.id).green(),
        style(context.environment.resource_manager.as_str()).cyan()
    );
    Ok(context)
}

/// Clears the default context. Returns whether one was present.
pub fn logout(profile_path: &Path) -> Result<bool> {
    let mut profile = Profile::load(profile_path)?;
    let had_context = profile.default_context.take().is_some();
    profile.save(profile_path)?;
    if had_context {
        eprintln!("✅ {}", style("Signed out").green());
    } else {
        eprintln!("{}", style("No active session").yellow());
    }
    Ok(had_context)
}

/// Emits the current context with the token masked.
pub fn show_context(resolver: &dyn ContextResolver, sink: &mut dyn OutputSink) -> Result<usize> {
    let Some(mut context) = resolver.current_context() else {
        eprintln!("{}", style("No active session. Run `stackadm login`.").yellow());
        return Ok(0);
    };
    if context.account.access_token.is_some() {
        context.account.access_token = Some("********".to_string());
    }
    let value = serde_json::to_value(&context).map_err(|e| AdminError::Output(e.to_string()))?;
    output::emit(sink, value)
}
