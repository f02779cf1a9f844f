use crate::client::ClientFactory;
use crate::command::{AdminCommand, CommandSession};
use crate::commands::{resource_group_scope, TlsArgs};
use crate::error::Result;
use clap::Args;
use serde_json::Value;

/// Lists plans, optionally only those included in an offer.
#[derive(Debug, Clone, Default, Args)]
pub struct ListPlansCommand {
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Only plans whose id appears in this offer's base plans
    #[arg(long, requires = "resource_group")]
    pub offer: Option<String>,

    #[command(flatten)]
    pub tls: TlsArgs,
}

impl AdminCommand for ListPlansCommand {
    type Output = Vec<Value>;

    fn name(&self) -> &'static str {
        "plans list"
    }

    fn execute_core<F: ClientFactory>(
        &self,
        session: &CommandSession<'_, F>,
    ) -> Result<Option<Vec<Value>>> {
        self.tls.apply()?;
        let client = session.admin_client()?;
        let path = format!(
            "subscriptions/{}/{}providers/Microsoft.Subscriptions.Admin/plans",
            client.subscription_id()?,
            resource_group_scope(self.resource_group.as_deref())
        );
        let plans: Vec<Value> = client.list(&path, &[])?;

        let Some(offer) = &self.offer else {
            return Ok(Some(plans));
        };
        let offer_path = format!(
            "subscriptions/{}/{}providers/Microsoft.Subscriptions.Admin/offers/{}",
            client.subscription_id()?,
            resource_group_scope(self.resource_group.as_deref()),
            offer
        );
        let offer: Value = client.get(&offer_path, &[])?;
        Ok(Some(filter_base_plans(plans, &offer)))
    }
}

/// Keeps the plans whose `id` is listed in `offer.properties.basePlanIds`.
fn filter_base_plans(plans: Vec<Value>, offer: &Value) -> Vec<Value> {
    let base_ids: Vec<String> = offer
        .pointer("/properties/basePlanIds")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_ascii_lowercase)
                .collect()
        })
        .unwrap_or_default();

    plans
        .into_iter()
        .filter(|plan| {
            plan.get("id")
                .and_then(Value::as_str)
                .map(|id| base_ids.contains(&id.to_ascii_lowercase()))
                .unwrap_or(false)
        })
        .collect()
}
