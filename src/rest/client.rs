use crate::auth::CopyFactoryAuth;
use crate::domain::DomainResolver;
use crate::error::CopyFactoryError;
use crate::rest::http::{HttpClient, RequestOptions};

use reqwest::Method;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::time::Duration;
use url::Url;

/// Shared request plumbing for the resource clients and listener managers:
/// resolves the origin, injects the token and dispatches through [`HttpClient`].
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    auth: CopyFactoryAuth,
    resolver: Arc<dyn DomainResolver>,
    extended_timeout: Duration,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("http", &self.http)
            .field("auth", &self.auth)
            .field("extended_timeout", &self.extended_timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        http: HttpClient,
        auth: CopyFactoryAuth,
        resolver: Arc<dyn DomainResolver>,
        extended_timeout: Duration,
    ) -> Self {
        Self {
            http,
            auth,
            resolver,
            extended_timeout,
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn auth(&self) -> &CopyFactoryAuth {
        &self.auth
    }

    pub fn resolver(&self) -> &Arc<dyn DomainResolver> {
        &self.resolver
    }

    pub(crate) fn require_api_token(&self, method: &'static str) -> Result<(), CopyFactoryError> {
        self.auth.require_api_token(method)
    }

    fn build(
        &self,
        origin: &Url,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<RequestOptions, CopyFactoryError> {
        let mut options = RequestOptions::new(method, origin.join(path)?).with_query(query);
        options.body = body;
        self.auth.insert_header(&mut options.headers)?;
        Ok(options)
    }

    /// Request against the CopyFactory origin.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<T, CopyFactoryError> {
        let origin = self.resolver.copyfactory_origin().await?;
        self.send_to(&origin, method, path, query, body).await
    }

    /// Request against an explicit origin, e.g. a regional signal host.
    pub(crate) async fn send_to<T: DeserializeOwned>(
        &self,
        origin: &Url,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<T, CopyFactoryError> {
        let options = self.build(origin, method, path, query, body)?;
        self.http.request(&options).await
    }

    /// Request whose response body carries nothing of interest.
    pub(crate) async fn send_ignore(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<(), CopyFactoryError> {
        let _: IgnoredAny = self.send(method, path, query, body).await?;
        Ok(())
    }

    /// GET with the extended timeout used for log queries and long-polled streams.
    pub(crate) async fn get_extended<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, CopyFactoryError> {
        let origin = self.resolver.copyfactory_origin().await?;
        let options = self
            .build(&origin, Method::GET, path, query, None)?
            .with_timeout(self.extended_timeout);
        self.http.request(&options).await
    }
}
