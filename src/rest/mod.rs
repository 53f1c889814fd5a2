//! REST resource clients.

pub mod client;
pub mod configuration;
pub mod history;
pub mod http;
pub mod signal;
pub mod trading;
pub mod types;

pub use client::ApiClient;
pub use configuration::ConfigurationClient;
pub use history::HistoryClient;
pub use http::{HttpClient, HttpClientBuilder, RequestOptions, RetryConfig};
pub use signal::SignalClient;
pub use trading::TradingClient;
