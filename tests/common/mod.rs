#![allow(dead_code)]

use serde_json::Value;
use stackadm::auth::{AuthenticationFactory, Credentials};
use stackadm::client::{ApiVersion, ClientFactory, ClientParts, ManagementClient};
use stackadm::command::{AdminCommand, CommandSession};
use stackadm::context::{Account, ContextResolver, Environment, SessionContext};
use stackadm::tls::{self, CertificatePolicy};
use stackadm::{AdminError, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

static SERIAL: Mutex<()> = Mutex::new(());

/// Serializes tests that observe the process-wide certificate policy.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn test_context(endpoint: &str) -> SessionContext {
    SessionContext {
        environment: Environment::new("AzureStack", Url::parse(endpoint).unwrap()),
        account: Account {
            id: "operator@contoso.com".to_string(),
            access_token: Some("test-token".to_string()),
        },
        tenant_id: Some("tenant-1".to_string()),
        subscription_id: Some("sub-1".to_string()),
    }
}

/// Returns a fixed context and counts lookups.
#[derive(Clone)]
pub struct StaticResolver {
    pub context: Option<SessionContext>,
    pub lookups: Rc<Cell<usize>>,
}

impl StaticResolver {
    pub fn present(endpoint: &str) -> Self {
        Self {
            context: Some(test_context(endpoint)),
            lookups: Rc::new(Cell::new(0)),
        }
    }

    /// Adds a separate gallery endpoint to the resolved environment.
    pub fn with_gallery(mut self, gallery: &str) -> Self {
        if let Some(context) = self.context.as_mut() {
            context.environment.gallery = Some(Url::parse(gallery).unwrap());
        }
        self
    }

    pub fn absent() -> Self {
        Self {
            context: None,
            lookups: Rc::new(Cell::new(0)),
        }
    }
}

impl ContextResolver for StaticResolver {
    fn current_context(&self) -> Option<SessionContext> {
        self.lookups.set(self.lookups.get() + 1);
        self.context.clone()
    }
}

/// Hands out a bearer token, or fails when `fail` is set.
#[derive(Clone, Default)]
pub struct StaticAuth {
    pub fail: bool,
    pub calls: Rc<Cell<usize>>,
}

impl AuthenticationFactory for StaticAuth {
    fn credentials(&self, context: &SessionContext) -> Result<Credentials> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(AdminError::credentials("token expired"));
        }
        Ok(Credentials::bearer(
            "test-token",
            context.subscription_id.clone(),
        ))
    }
}

/// Records every construction request before building the client.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub calls: Rc<RefCell<Vec<(Url, ApiVersion)>>>,
}

impl RecordingFactory {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ClientFactory for RecordingFactory {
    fn create_client<C: ManagementClient>(
        &self,
        endpoint: Url,
        credentials: Credentials,
        api_version: ApiVersion,
    ) -> Result<C> {
        self.calls
            .borrow_mut()
            .push((endpoint.clone(), api_version));
        C::from_parts(ClientParts {
            endpoint,
            credentials,
            api_version,
            certificate_policy: tls::current_policy(),
            timeout: Duration::from_secs(5),
        })
    }
}

/// A client that only remembers how it was built.
pub struct FakeClient {
    pub parts: ClientParts,
}

impl ManagementClient for FakeClient {
    fn from_parts(parts: ClientParts) -> Result<Self> {
        Ok(Self { parts })
    }
}

pub enum Outcome {
    Value(Value),
    Nothing,
    Fail(&'static str),
    Panic,
}

/// A command whose behaviour is fixed up front.
pub struct ScriptedCommand {
    pub api_version: ApiVersion,
    pub relax_policy: bool,
    pub build_client: bool,
    pub outcome: Outcome,
}

impl ScriptedCommand {
    pub fn returning(outcome: Outcome) -> Self {
        Self {
            api_version: ApiVersion::default(),
            relax_policy: false,
            build_client: true,
            outcome,
        }
    }

    pub fn relaxing(mut self) -> Self {
        self.relax_policy = true;
        self
    }

    pub fn with_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }
}

impl AdminCommand for ScriptedCommand {
    type Output = Value;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    fn execute_core<F: ClientFactory>(&self, session: &CommandSession<'_, F>) -> Result<Option<Value>> {
        if self.relax_policy {
            tls::set_policy(CertificatePolicy::AcceptInvalidCertificates);
        }
        if self.build_client {
            let client: FakeClient = session.client()?;
            assert_eq!(client.parts.api_version, self.api_version);
        }
        match &self.outcome {
            Outcome::Value(value) => Ok(Some(value.clone())),
            Outcome::Nothing => Ok(None),
            Outcome::Fail(message) => Err(AdminError::core(*message)),
            Outcome::Panic => panic!("command blew up"),
        }
    }
}
