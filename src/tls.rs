//! Process-wide TLS certificate validation policy.
//!
//! The policy is ambient state shared by every command in the process.
//! Commands may relax it while they run (for example to reach a deployment
//! with a self-signed certificate), but every execution must leave it exactly
//! as it found it. [`PolicyGuard`] captures the value on creation and puts it
//! back on drop, including during unwinding.
//!
//! Executions are serialized by a process-wide lock held for the lifetime of
//! the guard. A command must not start a nested execution from inside its own
//! `execute_core`; that would wait on the lock it already holds.

use crate::error::{AdminError, Result};
use reqwest::blocking::ClientBuilder;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tracing::debug;

/// How TLS server certificates are validated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CertificatePolicy {
    /// Platform trust store only.
    #[default]
    SystemDefault,
    /// Accept any server certificate.
    AcceptInvalidCertificates,
    /// Additionally trust this PEM-encoded root.
    TrustRoot(Vec<u8>),
}

impl CertificatePolicy {
    /// Applies this policy to one client's TLS configuration.
    pub fn configure(&self, builder: ClientBuilder) -> Result<ClientBuilder> {
        match self {
            CertificatePolicy::SystemDefault => Ok(builder),
            CertificatePolicy::AcceptInvalidCertificates => {
                Ok(builder.danger_accept_invalid_certs(true))
            }
            CertificatePolicy::TrustRoot(pem) => {
                let cert = reqwest::Certificate::from_pem(pem).map_err(AdminError::client)?;
                Ok(builder.add_root_certificate(cert))
            }
        }
    }
}

static POLICY: RwLock<CertificatePolicy> = RwLock::new(CertificatePolicy::SystemDefault);
static EXECUTION: Mutex<()> = Mutex::new(());

/// The policy currently in effect.
pub fn current_policy() -> CertificatePolicy {
    POLICY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the policy in effect, returning the previous one.
pub fn set_policy(policy: CertificatePolicy) -> CertificatePolicy {
    let mut slot = POLICY.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, policy)
}

/// Holds the execution lock and restores the captured policy when dropped.
#[must_use = "the policy is restored when the guard is dropped"]
pub struct PolicyGuard {
    saved: CertificatePolicy,
    _exclusive: MutexGuard<'static, ()>,
}

impl PolicyGuard {
    pub fn capture() -> Self {
        let exclusive = EXECUTION.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            saved: current_policy(),
            _exclusive: exclusive,
        }
    }

    pub fn saved(&self) -> &CertificatePolicy {
        &self.saved
    }
}

impl Drop for PolicyGuard {
    fn drop(&mut self) {
        let previous = set_policy(self.saved.clone());
        if previous != self.saved {
            debug!(restored = ?self.saved, replaced = ?previous, "certificate policy restored");
        }
    }
}
