use crate::client::{ApiVersion, ClientFactory};
use crate::command::{AdminCommand, CommandSession};
use crate::commands::TlsArgs;
use crate::error::Result;
use clap::Args;
use serde_json::Value;

/// Lists marketplace gallery items.
#[derive(Debug, Clone, Default, Args)]
pub struct ListGalleryItemsCommand {
    /// Fetch a single gallery item by identity, e.g. `Microsoft.WindowsServer.1.0.0`
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub tls: TlsArgs,
}

impl AdminCommand for ListGalleryItemsCommand {
    type Output = Value;

    fn name(&self) -> &'static str {
        "gallery list"
    }

    fn api_version(&self) -> ApiVersion {
        ApiVersion::GalleryAdmin
    }

    fn execute_core<F: ClientFactory>(&self, session: &CommandSession<'_, F>) -> Result<Option<Value>> {
        self.tls.apply()?;
        let client = session.admin_client()?;
        let path = "providers/Microsoft.Gallery.Admin/galleryItems";
        match &self.name {
            Some(name) => Ok(Some(client.get(&format!("{}/{}", path, name), &[])?)),
            None => Ok(Some(Value::Array(client.list(path, &[])?))),
        }
    }
}
