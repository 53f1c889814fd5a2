//! Routing of requests to the right service host.

use crate::auth::CopyFactoryAuth;
use crate::env::CopyFactoryEnvironment;
use crate::error::CopyFactoryError;
use crate::rest::http::{HttpClient, RequestOptions};
use crate::types::deserialize_null_as_empty_vec;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// Routing information for a trading account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: String,
    /// Primary region first, then replica regions.
    pub regions: Vec<String>,
}

/// Resolves service origins. Injected into every API client.
#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// Origin of the CopyFactory REST and streaming API.
    async fn copyfactory_origin(&self) -> Result<Url, CopyFactoryError>;

    async fn account_info(&self, account_id: &str) -> Result<AccountInfo, CopyFactoryError>;

    /// Origin serving external signals for an account deployed in `regions`.
    async fn signal_client_origin(&self, regions: &[String]) -> Result<Url, CopyFactoryError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProvisionedAccount {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    account_replicas: Vec<AccountReplica>,
}

#[derive(Debug, Deserialize)]
struct AccountReplica {
    #[serde(default)]
    region: Option<String>,
}

/// Resolver for the hosted service, deriving hosts from a base domain.
#[derive(Debug, Clone)]
pub struct DomainClient {
    env: CopyFactoryEnvironment,
    http: HttpClient,
    auth: CopyFactoryAuth,
}

impl DomainClient {
    pub fn new(env: CopyFactoryEnvironment, http: HttpClient, auth: CopyFactoryAuth) -> Self {
        Self { env, http, auth }
    }

    pub fn env(&self) -> &CopyFactoryEnvironment {
        &self.env
    }
}

#[async_trait]
impl DomainResolver for DomainClient {
    async fn copyfactory_origin(&self) -> Result<Url, CopyFactoryError> {
        self.env.copyfactory_origin()
    }

    async fn account_info(&self, account_id: &str) -> Result<AccountInfo, CopyFactoryError> {
        let url = self
            .env
            .provisioning_origin()?
            .join(&format!("/users/current/accounts/{account_id}"))?;
        let mut options = RequestOptions::get(url);
        self.auth.insert_header(&mut options.headers)?;

        let account: ProvisionedAccount = self.http.request(&options).await?;
        let regions = account
            .region
            .into_iter()
            .chain(account.account_replicas.into_iter().filter_map(|r| r.region))
            .collect();

        Ok(AccountInfo {
            id: account.id,
            regions,
        })
    }

    async fn signal_client_origin(&self, regions: &[String]) -> Result<Url, CopyFactoryError> {
        match regions.first() {
            Some(region) => self.env.regional_copyfactory_origin(region),
            None => self.env.copyfactory_origin(),
        }
    }
}

/// Resolver sending every request to a single origin.
#[derive(Debug, Clone)]
pub struct FixedDomainResolver {
    origin: Url,
}

impl FixedDomainResolver {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }
}

#[async_trait]
impl DomainResolver for FixedDomainResolver {
    async fn copyfactory_origin(&self) -> Result<Url, CopyFactoryError> {
        Ok(self.origin.clone())
    }

    async fn account_info(&self, account_id: &str) -> Result<AccountInfo, CopyFactoryError> {
        Ok(AccountInfo {
            id: account_id.to_string(),
            regions: Vec::new(),
        })
    }

    async fn signal_client_origin(&self, _regions: &[String]) -> Result<Url, CopyFactoryError> {
        Ok(self.origin.clone())
    }
}
