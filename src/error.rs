use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

/// Boxed source for errors raised by collaborators this crate treats as opaque.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every failure an administrative command can surface.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No session context could be resolved; the user has not signed in.
    #[error("no active session context; run `stackadm login` first")]
    NoActiveSession,

    #[error("failed to resolve credentials: {0}")]
    CredentialResolution(#[source] BoxError),

    #[error("failed to construct administrative client: {0}")]
    ClientConstruction(#[source] BoxError),

    /// Raised by a concrete command while performing its management call.
    #[error("{0}")]
    CoreExecution(#[source] BoxError),

    #[error("profile error: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {body}")]
    Api {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to write output: {0}")]
    Output(String),
}

impl AdminError {
    pub fn core<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        AdminError::CoreExecution(err.into())
    }

    pub fn credentials<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        AdminError::CredentialResolution(err.into())
    }

    pub fn client<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        AdminError::ClientConstruction(err.into())
    }

    /// Stable short code used when the host reports the failure.
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::NoActiveSession => "NoActiveSession",
            AdminError::CredentialResolution(_) => "CredentialResolution",
            AdminError::ClientConstruction(_) => "ClientConstruction",
            AdminError::CoreExecution(_) => "CoreExecution",
            AdminError::Config(_) => "Config",
            AdminError::Http(_) => "Http",
            AdminError::Api { .. } => "Api",
            AdminError::Output(_) => "Output",
        }
    }
}

/// A failed invocation as handed to the host's error channel.
#[derive(Debug, Error)]
#[error("{operation}: {source}")]
pub struct CommandFailure {
    pub operation: &'static str,
    #[source]
    pub source: AdminError,
}

impl CommandFailure {
    pub fn new(operation: &'static str, source: AdminError) -> Self {
        Self { operation, source }
    }
}
