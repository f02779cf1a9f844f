//! The administrative command base.
//!
//! Every admin command runs through [`CommandHost::execute`], which wraps the
//! command's single management call in the same envelope:
//!
//! 1. capture the process-wide certificate policy,
//! 2. run [`AdminCommand::execute_core`],
//! 3. restore the policy (on every exit path, panics included),
//! 4. emit the result, or hand the failure back to the host.
//!
//! Concrete commands only implement `execute_core`. They reach the control
//! plane through [`CommandSession::admin_client`], which binds a fresh client
//! to the session's endpoint, credentials and the command's API version.

use crate::auth::AuthenticationFactory;
use crate::client::{AdminClient, ApiVersion, ClientFactory, ManagementClient};
use crate::context::{ContextResolver, Endpoint, SessionContext};
use crate::error::{AdminError, CommandFailure, Result};
use crate::output::{self, OutputSink};
use crate::tls::PolicyGuard;
use serde::Serialize;
use std::cell::Cell;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// One administrative operation.
pub trait AdminCommand {
    type Output: Serialize;

    /// Name reported alongside failures, e.g. `offers list`.
    fn name(&self) -> &'static str;

    /// API version the command's client is bound to.
    fn api_version(&self) -> ApiVersion {
        ApiVersion::default()
    }

    /// Performs the command's management call. `Ok(None)` emits nothing.
    fn execute_core<F: ClientFactory>(
        &self,
        session: &CommandSession<'_, F>,
    ) -> Result<Option<Self::Output>>;
}

/// Collaborators shared by every command the host runs.
pub struct CommandHost<F> {
    resolver: Box<dyn ContextResolver>,
    auth: Box<dyn AuthenticationFactory>,
    factory: F,
}

impl<F: ClientFactory> CommandHost<F> {
    pub fn new(
        resolver: impl ContextResolver + 'static,
        auth: impl AuthenticationFactory + 'static,
        factory: F,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            auth: Box::new(auth),
            factory,
        }
    }

    /// Runs `command` and writes its result to `sink`.
    ///
    /// Returns the number of items emitted. On failure nothing is emitted and
    /// the error is returned tagged with the command's name. The certificate
    /// policy is back to its captured value before either happens.
    pub fn execute<C: AdminCommand>(
        &self,
        command: &C,
        sink: &mut dyn OutputSink,
    ) -> std::result::Result<usize, CommandFailure> {
        let operation = command.name();
        let api_version = command.api_version();
        info!(op = operation, %api_version, "executing command");
        let started = Instant::now();

        let result = {
            let guard = PolicyGuard::capture();
            debug!(op = operation, policy = ?guard.saved(), "certificate policy captured");
            let session = CommandSession {
                resolver: self.resolver.as_ref(),
                auth: self.auth.as_ref(),
                factory: &self.factory,
                api_version,
                clients_built: Cell::new(0),
            };
            command.execute_core(&session)
        };

        let emitted = result.and_then(|value| match value {
            Some(value) => {
                let value =
                    serde_json::to_value(value).map_err(|e| AdminError::Output(e.to_string()))?;
                output::emit(sink, value)
            }
            None => Ok(0),
        });

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match emitted {
            Ok(count) => {
                info!(op = operation, emitted = count, elapsed_ms, "command completed");
                Ok(count)
            }
            Err(e) => {
                warn!(op = operation, code = e.code(), error = %e, elapsed_ms, "command failed");
                Err(CommandFailure::new(operation, e))
            }
        }
    }
}

/// What a command sees while its `execute_core` runs.
pub struct CommandSession<'a, F> {
    resolver: &'a dyn ContextResolver,
    auth: &'a dyn AuthenticationFactory,
    factory: &'a F,
    api_version: ApiVersion,
    clients_built: Cell<u32>,
}

impl<'a, F: ClientFactory> CommandSession<'a, F> {
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// The ambient session, which may be absent.
    pub fn current_context(&self) -> Option<SessionContext> {
        self.resolver.current_context()
    }

    /// Builds a new administrative client for this command.
    pub fn admin_client(&self) -> Result<AdminClient> {
        self.client()
    }

    /// Builds a new client of type `C`. Fails with
    /// [`AdminError::NoActiveSession`] without touching the factory when no
    /// context can be resolved.
    pub fn client<C: ManagementClient>(&self) -> Result<C> {
        let context = self
            .resolver
            .current_context()
            .ok_or(AdminError::NoActiveSession)?;

        let endpoint = self.endpoint(&context)?;
        let credentials = self.auth.credentials(&context)?;

        let built = self.clients_built.get() + 1;
        self.clients_built.set(built);
        if built > 1 {
            warn!(count = built, "more than one client built in a single execution");
        }
        debug!(%endpoint, api_version = %self.api_version, "creating administrative client");

        self.factory
            .create_client(endpoint, credentials, self.api_version)
    }

    /// Gallery clients go to the gallery endpoint when the environment has
    /// one. Everything else, and gallery clients without one, use the
    /// resource manager.
    fn endpoint(&self, context: &SessionContext) -> Result<Url> {
        let environment = &context.environment;
        let preferred = match self.api_version {
            ApiVersion::GalleryAdmin => environment.endpoint(Endpoint::Gallery),
            ApiVersion::Subscription | ApiVersion::Usage => None,
        };
        preferred
            .or_else(|| environment.endpoint(Endpoint::ResourceManager))
            .cloned()
            .ok_or_else(|| {
                AdminError::client(format!(
                    "environment '{}' has no resource manager endpoint",
                    environment.name
                ))
            })
    }
}
