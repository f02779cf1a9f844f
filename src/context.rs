//! Session context resolution.
//!
//! A session context is the signed-in identity, its subscription/tenant scope
//! and the environment describing where the management endpoints live. Some
//! authentication modes never produce one, so resolution returns `Option` and
//! callers handle the absent case as an ordinary branch.

use crate::config::Profile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};
use url::Url;

/// Named service endpoints carried by an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ResourceManager,
    Gallery,
}

/// Describes a cloud deployment: a name plus the endpoints it exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub resource_manager: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Url>,
}

impl Environment {
    pub fn new(name: impl Into<String>, resource_manager: Url) -> Self {
        Self {
            name: name.into(),
            resource_manager,
            gallery: None,
        }
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> Option<&Url> {
        match endpoint {
            Endpoint::ResourceManager => Some(&self.resource_manager),
            Endpoint::Gallery => self.gallery.as_ref(),
        }
    }
}

/// The signed-in identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("access_token", &self.access_token.as_ref().map(|_| "********"))
            .finish()
    }
}

/// The active authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub environment: Environment,
    pub account: Account,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

/// Exposes the ambient session, if any.
pub trait ContextResolver {
    /// Returns the active context, or `None` when there is none. Never fails.
    fn current_context(&self) -> Option<SessionContext>;
}

/// Resolves the default context from the profile store on disk.
#[derive(Debug, Clone)]
pub struct ProfileContextResolver {
    path: PathBuf,
}

impl ProfileContextResolver {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ContextResolver for ProfileContextResolver {
    fn current_context(&self) -> Option<SessionContext> {
        match Profile::load(&self.path) {
            Ok(profile) => {
                if profile.default_context.is_none() {
                    debug!(path = %self.path.display(), "profile has no default context");
                }
                profile.default_context
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read profile");
                None
            }
        }
    }
}
