//! Versioned administrative client and the factory that builds it.

use crate::auth::Credentials;
use crate::error::{AdminError, Result};
use crate::tls::{self, CertificatePolicy};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// API versions recognized by the admin endpoints, one per command category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiVersion {
    #[default]
    Subscription,
    GalleryAdmin,
    Usage,
}

impl ApiVersion {
    pub const fn as_str(self) -> &'static str {
        match self {
            ApiVersion::Subscription => "2015-11-01",
            ApiVersion::GalleryAdmin => "2015-04-01",
            ApiVersion::Usage => "2015-06-01-preview",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a client needs to be bound to one endpoint.
#[derive(Debug, Clone)]
pub struct ClientParts {
    pub endpoint: Url,
    pub credentials: Credentials,
    pub api_version: ApiVersion,
    pub certificate_policy: CertificatePolicy,
    pub timeout: Duration,
}

/// A client type the factory can construct.
pub trait ManagementClient: Sized {
    fn from_parts(parts: ClientParts) -> Result<Self>;
}

/// Builds clients bound to an endpoint, credentials and API version.
pub trait ClientFactory {
    fn create_client<C: ManagementClient>(
        &self,
        endpoint: Url,
        credentials: Credentials,
        api_version: ApiVersion,
    ) -> Result<C>;
}

/// Builds a fresh client on every call. The ambient certificate policy is
/// copied into the client at construction time.
#[derive(Debug, Clone)]
pub struct DefaultClientFactory {
    timeout: Duration,
}

impl DefaultClientFactory {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

    pub fn new() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for DefaultClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for DefaultClientFactory {
    fn create_client<C: ManagementClient>(
        &self,
        endpoint: Url,
        credentials: Credentials,
        api_version: ApiVersion,
    ) -> Result<C> {
        C::from_parts(ClientParts {
            endpoint,
            credentials,
            api_version,
            certificate_policy: tls::current_policy(),
            timeout: self.timeout,
        })
    }
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

/// HTTP client for the administrative resource-manager API.
pub struct AdminClient {
    http: Client,
    endpoint: Url,
    credentials: Credentials,
    api_version: ApiVersion,
}

impl ManagementClient for AdminClient {
    fn from_parts(parts: ClientParts) -> Result<Self> {
        let builder = Client::builder()
            .timeout(parts.timeout)
            .user_agent(concat!("stackadm/", env!("CARGO_PKG_VERSION")));
        let http = parts
            .certificate_policy
            .configure(builder)?
            .build()
            .map_err(AdminError::client)?;

        let mut endpoint = parts.endpoint;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            http,
            endpoint,
            credentials: parts.credentials,
            api_version: parts.api_version,
        })
    }
}

impl AdminClient {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Subscription the credentials were issued for.
    pub fn subscription_id(&self) -> Result<&str> {
        self.credentials
            .subscription_id()
            .ok_or_else(|| AdminError::core("the active context has no subscription selected"))
    }

    /// Resolves `path` against the endpoint and appends `api-version` plus `query`.
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(path.trim_start_matches('/'))
            .map_err(AdminError::core)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", self.api_version.as_str());
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path, query)?;
        self.send(url)
    }

    /// Fetches every page of a `value`/`nextLink` collection.
    ///
    /// A `nextLink` must stay on the endpoint's origin and may not revisit a
    /// page already fetched.
    pub fn list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut fetched = HashSet::new();
        let mut next = Some(self.url(path, query)?);
        while let Some(url) = next.take() {
            let page: Page<T> = self.send(url.clone())?;
            items.extend(page.value);
            fetched.insert(url);
            if let Some(link) = page.next_link.filter(|l| !l.is_empty()) {
                next = Some(self.next_page(&link, &fetched)?);
            }
        }
        Ok(items)
    }

    fn next_page(&self, link: &str, fetched: &HashSet<Url>) -> Result<Url> {
        let url = Url::parse(link).map_err(AdminError::core)?;
        if url.origin() != self.endpoint.origin() {
            warn!(next_link = %url, endpoint = %self.endpoint, "refusing cross-origin nextLink");
            return Err(AdminError::core(format!(
                "nextLink '{}' leaves the endpoint origin '{}'",
                url,
                self.endpoint.origin().ascii_serialization()
            )));
        }
        if fetched.contains(&url) {
            return Err(AdminError::core(format!(
                "nextLink '{}' points back to a page already fetched",
                url
            )));
        }
        Ok(url)
    }

    fn send<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, api_version = %self.api_version, "GET");
        let response = self.credentials.sign(self.http.get(url.clone())).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdminError::Api {
                method: "GET".to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json()?)
    }
}
