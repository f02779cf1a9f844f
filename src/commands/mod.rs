pub mod gallery;
pub mod offers;
pub mod plans;
pub mod session;
pub mod subscriptions;
pub mod usage;

use crate::error::{AdminError, Result};
use crate::tls::{self, CertificatePolicy};
use clap::Args;
use std::path::PathBuf;

/// Certificate trust options shared by every admin command.
#[derive(Debug, Clone, Default, Args)]
pub struct TlsArgs {
    /// Accept any server certificate for this command only
    #[arg(long)]
    pub skip_certificate_validation: bool,

    /// Also trust this PEM root certificate for this command only
    #[arg(long, value_name = "PEM", conflicts_with = "skip_certificate_validation")]
    pub ca_certificate: Option<PathBuf>,
}

impl TlsArgs {
    /// Adjusts the process-wide certificate policy for the running command.
    /// The command host puts the previous policy back once the command returns.
    pub fn apply(&self) -> Result<()> {
        if self.skip_certificate_validation {
            tls::set_policy(CertificatePolicy::AcceptInvalidCertificates);
        } else if let Some(path) = &self.ca_certificate {
            let pem = std::fs::read(path)
                .map_err(|e| AdminError::core(format!("{}: {}", path.display(), e)))?;
            tls::set_policy(CertificatePolicy::TrustRoot(pem));
        }
        Ok(())
    }
}

/// `resourceGroups/{rg}/` segment, or nothing for subscription scope.
pub(crate) fn resource_group_scope(resource_group: Option<&str>) -> String {
    resource_group
        .map(|rg| format!("resourceGroups/{}/", rg))
        .unwrap_or_default()
}
