use crate::error::CopyFactoryError;
use crate::rest::client::ApiClient;
use crate::rest::signal::SignalClient;
use crate::rest::types::{
    CopyFactoryStrategyStopout, CopyFactoryUserLogMessage, GetStrategyLogParams, GetUserLogParams,
};
use crate::streaming::{
    StopoutFilter, StopoutListener, StopoutListenerManager, StreamingConfig, StrategyLogFilter,
    SubscriberLogFilter, UserLogListener, UserLogListenerManager,
};
use crate::types::StopoutReason;

use reqwest::Method;
use std::sync::Arc;

/// Trading operations: resynchronization, stopouts, user logs and signals.
#[derive(Debug, Clone)]
pub struct TradingClient {
    client: ApiClient,
    stopouts: StopoutListenerManager,
    user_log: UserLogListenerManager,
}

impl TradingClient {
    pub fn new(client: ApiClient, streaming: StreamingConfig) -> Self {
        let stopouts = StopoutListenerManager::new(client.clone(), streaming.clone());
        let user_log = UserLogListenerManager::new(client.clone(), streaming);
        Self {
            client,
            stopouts,
            user_log,
        }
    }

    pub fn stopout_listeners(&self) -> &StopoutListenerManager {
        &self.stopouts
    }

    pub fn user_log_listeners(&self) -> &UserLogListenerManager {
        &self.user_log
    }

    /// Resynchronizes a subscriber with its strategies. Empty filters mean all.
    pub async fn resynchronize(
        &self,
        subscriber_id: &str,
        strategy_ids: &[String],
        position_ids: &[String],
    ) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("resynchronize")?;
        let query = strategy_ids
            .iter()
            .map(|id| ("strategyId".to_string(), id.clone()))
            .chain(position_ids.iter().map(|id| ("positionId".to_string(), id.clone())))
            .collect();
        self.client
            .send_ignore(
                Method::POST,
                &format!("/users/current/subscribers/{subscriber_id}/resynchronize"),
                query,
                None,
            )
            .await
    }

    /// Resolves the regional host of `account_id` and binds a signal client to it.
    pub async fn get_signal_client(&self, account_id: &str) -> Result<SignalClient, CopyFactoryError> {
        self.client.require_api_token("get_signal_client")?;
        let resolver = self.client.resolver();
        let account = resolver.account_info(account_id).await?;
        let origin = resolver.signal_client_origin(&account.regions).await?;
        Ok(SignalClient::new(account.id, origin, self.client.clone()))
    }

    /// List active stopouts of a subscriber.
    pub async fn get_stopouts(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<CopyFactoryStrategyStopout>, CopyFactoryError> {
        self.client.require_api_token("get_stopouts")?;
        self.client
            .send(
                Method::GET,
                &format!("/users/current/subscribers/{subscriber_id}/stopouts"),
                Vec::new(),
                None,
            )
            .await
    }

    /// Reset the stopouts of a subscription for one reason.
    pub async fn reset_stopouts(
        &self,
        subscriber_id: &str,
        strategy_id: &str,
        reason: StopoutReason,
    ) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("reset_stopouts")?;
        self.client
            .send_ignore(
                Method::POST,
                &format!(
                    "/users/current/subscribers/{subscriber_id}/subscription-strategies/{strategy_id}/stopouts/{reason}/reset"
                ),
                Vec::new(),
                None,
            )
            .await
    }

    /// Get a subscriber's user log. Defaults to the first 1000 records.
    pub async fn get_user_log(
        &self,
        subscriber_id: &str,
        params: &GetUserLogParams,
    ) -> Result<Vec<CopyFactoryUserLogMessage>, CopyFactoryError> {
        self.client.require_api_token("get_user_log")?;
        params.validate()?;
        self.client
            .get_extended(
                &format!("/users/current/subscribers/{subscriber_id}/user-log"),
                params.to_query(),
            )
            .await
    }

    /// Get a provider strategy's user log. Defaults to the first 1000 records.
    pub async fn get_strategy_log(
        &self,
        strategy_id: &str,
        params: &GetStrategyLogParams,
    ) -> Result<Vec<CopyFactoryUserLogMessage>, CopyFactoryError> {
        self.client.require_api_token("get_strategy_log")?;
        params.validate()?;
        self.client
            .get_extended(
                &format!("/users/current/strategies/{strategy_id}/user-log"),
                params.to_query(),
            )
            .await
    }

    // --- Listeners ---

    /// Stream stopouts to `listener`. Returns the listener id.
    pub fn add_stopout_listener(&self, listener: Arc<StopoutListener>, filter: StopoutFilter) -> String {
        self.stopouts.add_stopout_listener(listener, filter)
    }

    /// Stop a stopout stream. Unknown ids are ignored.
    pub fn remove_stopout_listener(&self, listener_id: &str) {
        self.stopouts.remove_stopout_listener(listener_id);
    }

    /// Stream a strategy's user log to `listener`. Returns the listener id.
    pub fn add_strategy_log_listener(
        &self,
        listener: Arc<UserLogListener>,
        strategy_id: &str,
        filter: StrategyLogFilter,
    ) -> String {
        self.user_log
            .add_strategy_log_listener(listener, strategy_id, filter)
    }

    /// Stop a strategy log stream. Unknown ids are ignored.
    pub fn remove_strategy_log_listener(&self, listener_id: &str) {
        self.user_log.remove_strategy_log_listener(listener_id);
    }

    /// Stream a subscriber's user log to `listener`. Returns the listener id.
    pub fn add_subscriber_log_listener(
        &self,
        listener: Arc<UserLogListener>,
        subscriber_id: &str,
        filter: SubscriberLogFilter,
    ) -> String {
        self.user_log
            .add_subscriber_log_listener(listener, subscriber_id, filter)
    }

    /// Stop a subscriber log stream. Unknown ids are ignored.
    pub fn remove_subscriber_log_listener(&self, listener_id: &str) {
        self.user_log.remove_subscriber_log_listener(listener_id);
    }

    /// Stop every stopout and user log stream.
    pub async fn shutdown(&self) {
        self.stopouts.shutdown().await;
        self.user_log.shutdown().await;
    }
}
