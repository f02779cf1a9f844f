use crate::client::ClientFactory;
use crate::command::{AdminCommand, CommandSession};
use crate::commands::{resource_group_scope, TlsArgs};
use crate::error::Result;
use clap::Args;
use serde_json::Value;

/// Lists managed offers.
#[derive(Debug, Clone, Default, Args)]
pub struct ListOffersCommand {
    /// Restrict to offers in this resource group
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Fetch a single offer by name
    #[arg(long, requires = "resource_group")]
    pub name: Option<String>,

    #[command(flatten)]
    pub tls: TlsArgs,
}

impl AdminCommand for ListOffersCommand {
    type Output = Value;

    fn name(&self) -> &'static str {
        "offers list"
    }

    fn execute_core<F: ClientFactory>(&self, session: &CommandSession<'_, F>) -> Result<Option<Value>> {
        self.tls.apply()?;
        let client = session.admin_client()?;
        let path = format!(
            "subscriptions/{}/{}providers/Microsoft.Subscriptions.Admin/offers",
            client.subscription_id()?,
            resource_group_scope(self.resource_group.as_deref())
        );

        match &self.name {
            Some(name) => Ok(Some(client.get(&format!("{}/{}", path, name), &[])?)),
            None => Ok(Some(Value::Array(client.list(&path, &[])?))),
        }
    }
}
