use crate::error::CopyFactoryError;
use crate::rest::client::ApiClient;
use crate::rest::types::{
    CopyFactoryTransaction, ProvidedTransactionsParams, StrategyIdAndName, SubscriberOrProvider,
    SubscriptionTransactionsParams,
};
use crate::streaming::{StreamingConfig, TransactionListener, TransactionListenerManager};

use chrono::{DateTime, Utc};
use reqwest::Method;
use std::sync::Arc;

/// Trade copying history and transaction streams.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    client: ApiClient,
    transactions: TransactionListenerManager,
}

impl HistoryClient {
    pub fn new(client: ApiClient, streaming: StreamingConfig) -> Self {
        let transactions = TransactionListenerManager::new(client.clone(), streaming);
        Self {
            client,
            transactions,
        }
    }

    pub fn transaction_listeners(&self) -> &TransactionListenerManager {
        &self.transactions
    }

    /// Providers of strategies the user is subscribed to.
    pub async fn get_providers(&self) -> Result<Vec<SubscriberOrProvider>, CopyFactoryError> {
        self.client.require_api_token("get_providers")?;
        self.client
            .send(Method::GET, "/users/current/providers", Vec::new(), None)
            .await
    }

    /// Subscribers of strategies the user provides.
    pub async fn get_subscribers(&self) -> Result<Vec<SubscriberOrProvider>, CopyFactoryError> {
        self.client.require_api_token("get_subscribers")?;
        self.client
            .send(Method::GET, "/users/current/subscribers", Vec::new(), None)
            .await
    }

    /// List strategies the current user is subscribed to.
    pub async fn get_strategies_subscribed(&self) -> Result<Vec<StrategyIdAndName>, CopyFactoryError> {
        self.client.require_api_token("get_strategies_subscribed")?;
        self.client
            .send(Method::GET, "/users/current/strategies-subscribed", Vec::new(), None)
            .await
    }

    /// List strategies the current user provides.
    pub async fn get_provided_strategies(&self) -> Result<Vec<StrategyIdAndName>, CopyFactoryError> {
        self.client.require_api_token("get_provided_strategies")?;
        self.client
            .send(Method::GET, "/users/current/provided-strategies", Vec::new(), None)
            .await
    }

    /// Transactions on strategies the user provides to others.
    pub async fn get_provided_transactions(
        &self,
        params: &ProvidedTransactionsParams,
    ) -> Result<Vec<CopyFactoryTransaction>, CopyFactoryError> {
        self.client.require_api_token("get_provided_transactions")?;
        params.validate()?;
        self.client
            .send(
                Method::GET,
                "/users/current/provided-strategies/transactions",
                params.to_query(),
                None,
            )
            .await
    }

    /// Transactions on strategies the user is subscribed to.
    pub async fn get_subscription_transactions(
        &self,
        params: &SubscriptionTransactionsParams,
    ) -> Result<Vec<CopyFactoryTransaction>, CopyFactoryError> {
        self.client.require_api_token("get_subscription_transactions")?;
        params.validate()?;
        self.client
            .send(
                Method::GET,
                "/users/current/strategies-subscribed/transactions",
                params.to_query(),
                None,
            )
            .await
    }

    pub fn add_strategy_transaction_listener(
        &self,
        listener: Arc<TransactionListener>,
        strategy_id: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> String {
        self.transactions
            .add_strategy_transaction_listener(listener, strategy_id, start_time)
    }

    /// Stop a strategy transaction stream. Unknown ids are ignored.
    pub fn remove_strategy_transaction_listener(&self, listener_id: &str) {
        self.transactions
            .remove_strategy_transaction_listener(listener_id);
    }

    pub fn add_subscriber_transaction_listener(
        &self,
        listener: Arc<TransactionListener>,
        subscriber_id: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> String {
        self.transactions
            .add_subscriber_transaction_listener(listener, subscriber_id, start_time)
    }

    /// Stop a subscriber transaction stream. Unknown ids are ignored.
    pub fn remove_subscriber_transaction_listener(&self, listener_id: &str) {
        self.transactions
            .remove_subscriber_transaction_listener(listener_id);
    }

    /// Stop every transaction stream and wait for the poll tasks to finish.
    pub async fn shutdown(&self) {
        self.transactions.shutdown().await;
    }
}
