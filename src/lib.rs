//! # copyfactory
//!
//! Async Rust client for the CopyFactory trade copying API.
//!
//! ## Features
//!
//! - **Configuration API**: strategies, portfolio strategies and subscribers
//! - **History API**: providers, subscribers and copied transactions
//! - **Trading API**: resynchronization, stopouts, user logs and external signals
//! - **Event streams**: long-polled transaction, stopout and user log listeners
//!   with automatic resume and capped exponential backoff
//! - **REST reliability controls**: retry with exponential backoff and `429 Retry-After` support
//! - **Transport builder**: timeout/connect-timeout/headers/user-agent/proxy/custom client
//!
//! ## Quick Start: REST
//!
//! ```no_run
//! use std::time::Duration;
//! use copyfactory::{CopyFactory, RetryConfig, SubscriptionTransactionsParams};
//!
//! # async fn run() -> Result<(), copyfactory::CopyFactoryError> {
//! let copyfactory = CopyFactory::builder(std::env::var("COPYFACTORY_TOKEN").unwrap_or_default())
//!     .with_retry_config(RetryConfig {
//!         retries: 3,
//!         min_delay: Duration::from_millis(500),
//!         max_delay: Duration::from_secs(10),
//!     })
//!     .build()?;
//!
//! let till = chrono::Utc::now();
//! let params = SubscriptionTransactionsParams::new(till - chrono::TimeDelta::days(1), till);
//! for transaction in copyfactory.history().get_subscription_transactions(&params).await? {
//!     println!("{} {} {:?}", transaction.time, transaction.id, transaction.transaction_type);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick Start: Event streams
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use copyfactory::{CopyFactory, CopyFactoryError, CopyFactoryTransaction, StreamListener};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl StreamListener<CopyFactoryTransaction> for Printer {
//!     async fn on_event(&self, batch: Vec<CopyFactoryTransaction>) {
//!         for transaction in batch {
//!             println!("{} {}", transaction.time, transaction.id);
//!         }
//!     }
//!
//!     async fn on_error(&self, error: &CopyFactoryError) {
//!         eprintln!("stream error: {error}");
//!     }
//! }
//!
//! # async fn run() -> Result<(), CopyFactoryError> {
//! let copyfactory = CopyFactory::new("header.payload.sign")?;
//! let id = copyfactory
//!     .history()
//!     .add_strategy_transaction_listener(Arc::new(Printer), "ABCD", None);
//! // ...
//! copyfactory.history().remove_strategy_transaction_listener(&id);
//! copyfactory.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Authentication
//!
//! Every request carries the token in the `auth-token` header. REST resource
//! methods require an API access token (a JWT); calling one with an account
//! access token fails with [`CopyFactoryError::WrongTokenType`] before any
//! request is sent.
//!
//! ## Event Streams
//!
//! Listeners are polled by one background task each. A stream resumes after
//! the newest item of the previous batch:
//!
//! | Stream | Resume parameter |
//! |---|---|
//! | transactions | `startTime` = newest item time + 1 ms |
//! | user log | `startTime` = newest item time + 1 ms |
//! | stopouts | `previousSequenceNumber` = last item sequence number |
//!
//! Events sharing the boundary millisecond of a time-resumed stream can be
//! missed if they arrive in a later batch.
//!
//! Failed polls are reported to [`StreamListener::on_error`] and retried after
//! a delay that doubles up to [`StreamingConfig::max_error_backoff`]; a
//! "not found" response removes the listener. Retries never give up on their
//! own, so remove listeners or call [`CopyFactory::shutdown`] when done.
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod auth;
pub mod copyfactory;
pub mod domain;
pub mod env;
pub mod error;
pub mod rest;
pub mod streaming;
pub mod time;
pub mod types;

#[cfg(test)]
mod test_support;

// Primary clients
pub use auth::{AUTH_TOKEN_HEADER, CopyFactoryAuth, TokenKind};
pub use copyfactory::{CopyFactory, CopyFactoryBuilder};
pub use domain::{AccountInfo, DomainClient, DomainResolver, FixedDomainResolver};
pub use env::{CopyFactoryEnvironment, DEFAULT_DOMAIN};
pub use error::{CopyFactoryError, ErrorKind, ValidationDetail};
pub use rest::{
    ApiClient, ConfigurationClient, HistoryClient, HttpClient, HttpClientBuilder, RequestOptions,
    RetryConfig, SignalClient, TradingClient,
};
pub use streaming::{
    ListenerRegistry, StopoutFilter, StopoutListener, StopoutListenerManager, StrategyLogFilter,
    StreamListener, StreamingConfig, SubscriberLogFilter, TransactionListener,
    TransactionListenerManager, UserLogListener, UserLogListenerManager,
};

// Model re-exports
pub use rest::types::*;
pub use types::*;
