use crate::client::{ApiVersion, ClientFactory};
use crate::command::{AdminCommand, CommandSession};
use crate::commands::TlsArgs;
use crate::error::{AdminError, Result};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Granularity {
    #[default]
    Daily,
    Hourly,
}

impl Granularity {
    fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "Daily",
            Granularity::Hourly => "Hourly",
        }
    }
}

/// Reports aggregated subscriber usage for a time window.
#[derive(Debug, Clone, Args)]
pub struct UsageCommand {
    /// First reported day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last reported day, exclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    #[arg(long, value_enum, default_value_t = Granularity::Daily)]
    pub granularity: Granularity,

    /// Include instance-level details
    #[arg(long)]
    pub show_details: bool,

    #[command(flatten)]
    pub tls: TlsArgs,
}

impl UsageCommand {
    fn query(&self) -> Result<Vec<(&'static str, String)>> {
        if self.end <= self.start {
            return Err(AdminError::core(format!(
                "end date {} must be after start date {}",
                self.end, self.start
            )));
        }
        Ok(vec![
            ("reportedStartTime", reported_time(self.start)),
            ("reportedEndTime", reported_time(self.end)),
            ("aggregationGranularity", self.granularity.as_str().to_string()),
            ("showDetails", self.show_details.to_string()),
        ])
    }
}

fn reported_time(date: NaiveDate) -> String {
    format!("{}T00:00:00+00:00", date.format("%Y-%m-%d"))
}

impl AdminCommand for UsageCommand {
    type Output = Vec<Value>;

    fn name(&self) -> &'static str {
        "usage"
    }

    fn api_version(&self) -> ApiVersion {
        ApiVersion::Usage
    }

    fn execute_core<F: ClientFactory>(
        &self,
        session: &CommandSession<'_, F>,
    ) -> Result<Option<Vec<Value>>> {
        let query = self.query()?;
        self.tls.apply()?;
        let client = session.admin_client()?;
        let path = format!(
            "subscriptions/{}/providers/Microsoft.Commerce/subscriberUsageAggregates",
            client.subscription_id()?
        );
        Ok(Some(client.list(&path, &query)?))
    }
}
