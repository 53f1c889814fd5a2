use crate::error::CopyFactoryError;
use crate::rest::client::ApiClient;
use crate::rest::types::{
    CopyFactoryCloseInstructions, CopyFactoryPortfolioStrategy, CopyFactoryPortfolioStrategyUpdate,
    CopyFactoryStrategy, CopyFactoryStrategyUpdate, CopyFactorySubscriber,
    CopyFactorySubscriberUpdate, ListConfigurationParams, StrategyId,
};
use crate::types::random_id;

use reqwest::Method;

/// Length of ids produced by [`ConfigurationClient::generate_account_id`].
pub const ACCOUNT_ID_LEN: usize = 64;

/// Strategy, portfolio and subscriber configuration.
#[derive(Debug, Clone)]
pub struct ConfigurationClient {
    client: ApiClient,
}

impl ConfigurationClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// GET /users/current/configuration/unused-strategy-id
    pub async fn generate_strategy_id(&self) -> Result<StrategyId, CopyFactoryError> {
        self.client.require_api_token("generate_strategy_id")?;
        self.client
            .send(
                Method::GET,
                "/users/current/configuration/unused-strategy-id",
                Vec::new(),
                None,
            )
            .await
    }

    /// Random account id; generated locally.
    pub fn generate_account_id() -> String {
        random_id(ACCOUNT_ID_LEN)
    }

    // --- Strategies ---

    /// List strategies, optionally including removed ones. Supports offset pagination.
    pub async fn get_strategies(
        &self,
        params: &ListConfigurationParams,
    ) -> Result<Vec<CopyFactoryStrategy>, CopyFactoryError> {
        self.client.require_api_token("get_strategies")?;
        params.validate()?;
        self.client
            .send(
                Method::GET,
                "/users/current/configuration/strategies",
                params.to_query(),
                None,
            )
            .await
    }

    /// Get a single strategy by id.
    pub async fn get_strategy(&self, strategy_id: &str) -> Result<CopyFactoryStrategy, CopyFactoryError> {
        self.client.require_api_token("get_strategy")?;
        self.client
            .send(
                Method::GET,
                &format!("/users/current/configuration/strategies/{strategy_id}"),
                Vec::new(),
                None,
            )
            .await
    }

    /// Create or replace a strategy.
    pub async fn update_strategy(
        &self,
        strategy_id: &str,
        strategy: &CopyFactoryStrategyUpdate,
    ) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("update_strategy")?;
        self.client
            .send_ignore(
                Method::PUT,
                &format!("/users/current/configuration/strategies/{strategy_id}"),
                Vec::new(),
                Some(serde_json::to_value(strategy)?),
            )
            .await
    }

    /// Remove a strategy, optionally with close instructions for open positions.
    pub async fn remove_strategy(
        &self,
        strategy_id: &str,
        close_instructions: Option<&CopyFactoryCloseInstructions>,
    ) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("remove_strategy")?;
        let body = close_instructions.map(serde_json::to_value).transpose()?;
        self.client
            .send_ignore(
                Method::DELETE,
                &format!("/users/current/configuration/strategies/{strategy_id}"),
                Vec::new(),
                body,
            )
            .await
    }

    // --- Portfolio strategies ---

    /// List portfolio strategies. Supports offset pagination.
    pub async fn get_portfolio_strategies(
        &self,
        params: &ListConfigurationParams,
    ) -> Result<Vec<CopyFactoryPortfolioStrategy>, CopyFactoryError> {
        self.client.require_api_token("get_portfolio_strategies")?;
        params.validate()?;
        self.client
            .send(
                Method::GET,
                "/users/current/configuration/portfolio-strategies",
                params.to_query(),
                None,
            )
            .await
    }

    /// Get a single portfolio strategy by id.
    pub async fn get_portfolio_strategy(
        &self,
        portfolio_id: &str,
    ) -> Result<CopyFactoryPortfolioStrategy, CopyFactoryError> {
        self.client.require_api_token("get_portfolio_strategy")?;
        self.client
            .send(
                Method::GET,
                &format!("/users/current/configuration/portfolio-strategies/{portfolio_id}"),
                Vec::new(),
                None,
            )
            .await
    }

    /// Create or replace a portfolio strategy.
    pub async fn update_portfolio_strategy(
        &self,
        portfolio_id: &str,
        portfolio: &CopyFactoryPortfolioStrategyUpdate,
    ) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("update_portfolio_strategy")?;
        self.client
            .send_ignore(
                Method::PUT,
                &format!("/users/current/configuration/portfolio-strategies/{portfolio_id}"),
                Vec::new(),
                Some(serde_json::to_value(portfolio)?),
            )
            .await
    }

    /// Remove a portfolio strategy, optionally with close instructions.
    pub async fn remove_portfolio_strategy(
        &self,
        portfolio_id: &str,
        close_instructions: Option<&CopyFactoryCloseInstructions>,
    ) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("remove_portfolio_strategy")?;
        let body = close_instructions.map(serde_json::to_value).transpose()?;
        self.client
            .send_ignore(
                Method::DELETE,
                &format!("/users/current/configuration/portfolio-strategies/{portfolio_id}"),
                Vec::new(),
                body,
            )
            .await
    }

    // --- Subscribers ---

    /// List subscribers. Supports offset pagination.
    pub async fn get_subscribers(
        &self,
        params: &ListConfigurationParams,
    ) -> Result<Vec<CopyFactorySubscriber>, CopyFactoryError> {
        self.client.require_api_token("get_subscribers")?;
        params.validate()?;
        self.client
            .send(
                Method::GET,
                "/users/current/configuration/subscribers",
                params.to_query(),
                None,
            )
            .await
    }

    /// Get a single subscriber by account id.
    pub async fn get_subscriber(&self, subscriber_id: &str) -> Result<CopyFactorySubscriber, CopyFactoryError> {
        self.client.require_api_token("get_subscriber")?;
        self.client
            .send(
                Method::GET,
                &format!("/users/current/configuration/subscribers/{subscriber_id}"),
                Vec::new(),
                None,
            )
            .await
    }

    /// Create or replace a subscriber.
    pub async fn update_subscriber(
        &self,
        subscriber_id: &str,
        subscriber: &CopyFactorySubscriberUpdate,
    ) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("update_subscriber")?;
        self.client
            .send_ignore(
                Method::PUT,
                &format!("/users/current/configuration/subscribers/{subscriber_id}"),
                Vec::new(),
                Some(serde_json::to_value(subscriber)?),
            )
            .await
    }

    /// Remove a subscriber.
    pub async fn remove_subscriber(&self, subscriber_id: &str) -> Result<(), CopyFactoryError> {
        self.client.require_api_token("remove_subscriber")?;
        self.client
            .send_ignore(
                Method::DELETE,
                &format!("/users/current/configuration/subscribers/{subscriber_id}"),
                Vec::new(),
                None,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::types::{RiskLimit, StopOutSettings};
    use crate::test_support::{TestHttpResponse, TestServer, api_client};
    use crate::types::CloseInstructionsMode;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn strategy_crud_hits_configuration_paths() {
        let server = TestServer::spawn(
            vec![
                TestHttpResponse::ok_json(r#"{"id":"ABCD"}"#),
                TestHttpResponse::ok_json(
                    r#"[{"_id":"ABCD","name":"Test strategy","platformCommissionRate":0.01,
                        "stopOutRisk":{"value":0.4,"startTime":"2020-08-24T00:00:00.000Z"},
                        "symbolFilter":{"included":["EURUSD"]}}]"#,
                ),
                TestHttpResponse::new(reqwest::StatusCode::NO_CONTENT, ""),
                TestHttpResponse::new(reqwest::StatusCode::NO_CONTENT, ""),
            ],
            None,
        )
        .await;
        let client = ConfigurationClient::new(api_client(server.origin(), "header.payload.sign"));

        assert_eq!(client.generate_strategy_id().await.unwrap().id, "ABCD");

        let strategies = client
            .get_strategies(&ListConfigurationParams {
                include_removed: Some(true),
                limit: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(strategies[0].id, "ABCD");
        assert_eq!(strategies[0].settings.platform_commission_rate, Some(0.01));
        assert_eq!(
            strategies[0].settings.stop_out_risk.as_ref().and_then(|s| s.start_time),
            Some(Utc.with_ymd_and_hms(2020, 8, 24, 0, 0, 0).unwrap())
        );
        assert!(strategies[0].settings.extra.contains_key("symbolFilter"));

        let update = CopyFactoryStrategyUpdate {
            name: Some("Test strategy".to_string()),
            stop_out_risk: Some(StopOutSettings {
                value: 0.4,
                start_time: Some(Utc.with_ymd_and_hms(2020, 8, 24, 0, 0, 0).unwrap()),
            }),
            risk_limits: Some(vec![RiskLimit {
                limit_type: "monthly".to_string(),
                max_risk: 0.5,
                ..Default::default()
            }]),
            ..Default::default()
        };
        client.update_strategy("ABCD", &update).await.unwrap();

        client
            .remove_strategy(
                "ABCD",
                Some(&CopyFactoryCloseInstructions {
                    mode: Some(CloseInstructionsMode::Preserve),
                    remove_after: None,
                }),
            )
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].path(), "/users/current/configuration/unused-strategy-id");
        assert_eq!(requests[1].path(), "/users/current/configuration/strategies");
        assert_eq!(requests[1].query("includeRemoved").as_deref(), Some("true"));
        assert_eq!(requests[1].query("limit").as_deref(), Some("10"));
        assert_eq!(requests[2].method, "PUT");
        assert_eq!(requests[2].path(), "/users/current/configuration/strategies/ABCD");
        assert_eq!(
            requests[2].body_json(),
            json!({
                "name": "Test strategy",
                "stopOutRisk": {"value": 0.4, "startTime": "2020-08-24T00:00:00.000Z"},
                "riskLimits": [{"type": "monthly", "maxRisk": 0.5}]
            })
        );
        assert_eq!(requests[3].method, "DELETE");
        assert_eq!(requests[3].body_json(), json!({"mode": "preserve"}));
    }

    #[tokio::test]
    async fn subscriber_and_portfolio_paths() {
        let server = TestServer::spawn(
            vec![
                TestHttpResponse::ok_json(
                    r#"{"_id":"e8867baa","name":"Demo account","subscriptions":[{"strategyId":"ABCD","multiplier":1}]}"#,
                ),
                TestHttpResponse::ok_json(
                    r#"{"_id":"ABCD","name":"Portfolio","members":[{"strategyId":"EFGH","multiplier":2}]}"#,
                ),
                TestHttpResponse::new(reqwest::StatusCode::NO_CONTENT, ""),
            ],
            None,
        )
        .await;
        let client = ConfigurationClient::new(api_client(server.origin(), "header.payload.sign"));

        let subscriber = client.get_subscriber("e8867baa").await.unwrap();
        assert_eq!(subscriber.settings.subscriptions[0].strategy_id, "ABCD");

        let portfolio = client.get_portfolio_strategy("ABCD").await.unwrap();
        assert_eq!(portfolio.settings.members[0].multiplier, Some(2.0));

        client.remove_subscriber("e8867baa").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].path(), "/users/current/configuration/subscribers/e8867baa");
        assert_eq!(requests[1].path(), "/users/current/configuration/portfolio-strategies/ABCD");
        assert_eq!(requests[2].method, "DELETE");
        assert!(requests[2].body.is_empty());
    }

    #[tokio::test]
    async fn account_token_is_rejected_before_request() {
        let server = TestServer::spawn(vec![], None).await;
        let client = ConfigurationClient::new(api_client(server.origin(), "token"));

        let err = client
            .get_strategies(&ListConfigurationParams::default())
            .await
            .expect_err("expected wrong token type");
        assert!(matches!(
            err,
            CopyFactoryError::WrongTokenType {
                method: "get_strategies"
            }
        ));
        assert!(client.remove_subscriber("x").await.is_err());
        assert_eq!(server.hits(), 0);
    }

    #[test]
    fn generated_account_id_is_long_and_lowercase() {
        let id = ConfigurationClient::generate_account_id();
        assert_eq!(id.len(), ACCOUNT_ID_LEN);
        assert!(id.bytes().all(|b| b.is_ascii_lowercase()));
    }
}
