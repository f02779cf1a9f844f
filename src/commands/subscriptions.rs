use crate::client::ClientFactory;
use crate::command::{AdminCommand, CommandSession};
use crate::commands::TlsArgs;
use crate::error::Result;
use clap::Args;
use serde_json::Value;

/// Lists tenant subscriptions known to the admin subscription service.
#[derive(Debug, Clone, Default, Args)]
pub struct ListSubscriptionsCommand {
    /// Fetch a single tenant subscription by id
    #[arg(long)]
    pub subscription: Option<String>,

    #[command(flatten)]
    pub tls: TlsArgs,
}

impl AdminCommand for ListSubscriptionsCommand {
    type Output = Value;

    fn name(&self) -> &'static str {
        "subscriptions list"
    }

    fn execute_core<F: ClientFactory>(&self, session: &CommandSession<'_, F>) -> Result<Option<Value>> {
        self.tls.apply()?;
        let client = session.admin_client()?;
        let path = format!(
            "subscriptions/{}/providers/Microsoft.Subscriptions.Admin/subscriptions",
            client.subscription_id()?
        );
        match &self.subscription {
            Some(id) => Ok(Some(client.get(&format!("{}/{}", path, id), &[])?)),
            None => Ok(Some(Value::Array(client.list(&path, &[])?))),
        }
    }
}
