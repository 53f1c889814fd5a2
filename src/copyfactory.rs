use crate::auth::CopyFactoryAuth;
use crate::domain::{DomainClient, DomainResolver};
use crate::env::CopyFactoryEnvironment;
use crate::error::CopyFactoryError;
use crate::rest::client::ApiClient;
use crate::rest::configuration::ConfigurationClient;
use crate::rest::history::HistoryClient;
use crate::rest::http::{HttpClientBuilder, RetryConfig};
use crate::rest::trading::TradingClient;
use crate::streaming::StreamingConfig;

use std::sync::Arc;
use tokio::time::Duration;
use tracing::debug;

/// Builder for [`CopyFactory`].
pub struct CopyFactoryBuilder {
    token: String,
    env: CopyFactoryEnvironment,
    http: HttpClientBuilder,
    streaming: StreamingConfig,
    resolver: Option<Arc<dyn DomainResolver>>,
}

impl CopyFactoryBuilder {
    fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            env: CopyFactoryEnvironment::default(),
            http: HttpClientBuilder::default(),
            streaming: StreamingConfig::default(),
            resolver: None,
        }
    }

    pub fn with_environment(mut self, env: CopyFactoryEnvironment) -> Self {
        self.env = env;
        self
    }

    /// Replaces the whole transport configuration.
    pub fn with_http_client_builder(mut self, http: HttpClientBuilder) -> Self {
        self.http = http;
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.http = self.http.with_retry_config(config);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn with_streaming_config(mut self, config: StreamingConfig) -> Self {
        self.streaming = config;
        self
    }

    /// Overrides host resolution, e.g. for an on-premise deployment.
    pub fn with_domain_resolver(mut self, resolver: Arc<dyn DomainResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<CopyFactory, CopyFactoryError> {
        let http = self.http.build()?;
        let auth = CopyFactoryAuth::new(self.token);
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(DomainClient::new(self.env, http.clone(), auth.clone())),
        };
        debug!(token_kind = ?auth.kind(), "building copyfactory client");

        let client = ApiClient::new(http, auth, resolver, self.streaming.long_poll_timeout);
        Ok(CopyFactory {
            configuration: ConfigurationClient::new(client.clone()),
            history: HistoryClient::new(client.clone(), self.streaming.clone()),
            trading: TradingClient::new(client, self.streaming),
        })
    }
}

/// Entry point of the SDK, grouping the configuration, history and trading APIs.
///
/// ```no_run
/// use copyfactory::{CopyFactory, ListConfigurationParams};
///
/// # async fn run() -> Result<(), copyfactory::CopyFactoryError> {
/// let copyfactory = CopyFactory::builder(std::env::var("TOKEN").unwrap_or_default()).build()?;
/// let strategies = copyfactory
///     .configuration()
///     .get_strategies(&ListConfigurationParams::default())
///     .await?;
/// println!("{} strategies", strategies.len());
/// copyfactory.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CopyFactory {
    configuration: ConfigurationClient,
    history: HistoryClient,
    trading: TradingClient,
}

impl CopyFactory {
    pub fn builder(token: impl Into<String>) -> CopyFactoryBuilder {
        CopyFactoryBuilder::new(token)
    }

    /// Client for the hosted service with default settings.
    pub fn new(token: impl Into<String>) -> Result<Self, CopyFactoryError> {
        Self::builder(token).build()
    }

    /// Strategy, portfolio and subscriber configuration API.
    pub fn configuration(&self) -> &ConfigurationClient {
        &self.configuration
    }

    /// Providers, subscribers and copied transactions.
    pub fn history(&self) -> &HistoryClient {
        &self.history
    }

    /// Resynchronization, stopouts, user logs and external signals.
    pub fn trading(&self) -> &TradingClient {
        &self.trading
    }

    /// Removes every stream listener and waits for their poll loops to end.
    pub async fn shutdown(&self) {
        self.history.shutdown().await;
        self.trading.shutdown().await;
    }
}
