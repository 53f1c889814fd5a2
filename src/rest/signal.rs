use crate::error::CopyFactoryError;
use crate::rest::client::ApiClient;
use crate::rest::types::{
    CopyFactoryExternalSignalRemove, CopyFactoryExternalSignalUpdate, CopyFactoryTradingSignal,
};
use crate::types::random_id;

use reqwest::Method;
use serde::de::IgnoredAny;
use url::Url;

const SIGNAL_ID_LEN: usize = 8;

/// External signal operations for one trading account, sent to the
/// account's regional host.
#[derive(Debug, Clone)]
pub struct SignalClient {
    account_id: String,
    origin: Url,
    client: ApiClient,
}

impl SignalClient {
    pub fn new(account_id: impl Into<String>, origin: Url, client: ApiClient) -> Self {
        Self {
            account_id: account_id.into(),
            origin,
            client,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Random 8-character id for a new external signal.
    pub fn generate_signal_id() -> String {
        random_id(SIGNAL_ID_LEN)
    }

    /// Create or update an external signal of a strategy.
    pub async fn update_external_signal(
        &self,
        strategy_id: &str,
        signal_id: &str,
        signal: &CopyFactoryExternalSignalUpdate,
    ) -> Result<(), CopyFactoryError> {
        let body = serde_json::to_value(signal)?;
        let _: IgnoredAny = self
            .client
            .send_to(
                &self.origin,
                Method::PUT,
                &format!("/users/current/strategies/{strategy_id}/external-signals/{signal_id}"),
                Vec::new(),
                Some(body),
            )
            .await?;
        Ok(())
    }

    /// Close an external signal at the given time.
    pub async fn remove_external_signal(
        &self,
        strategy_id: &str,
        signal_id: &str,
        signal: &CopyFactoryExternalSignalRemove,
    ) -> Result<(), CopyFactoryError> {
        let body = serde_json::to_value(signal)?;
        let _: IgnoredAny = self
            .client
            .send_to(
                &self.origin,
                Method::POST,
                &format!(
                    "/users/current/strategies/{strategy_id}/external-signals/{signal_id}/remove"
                ),
                Vec::new(),
                Some(body),
            )
            .await?;
        Ok(())
    }

    /// Signals currently active for the bound subscriber account.
    pub async fn get_trading_signals(&self) -> Result<Vec<CopyFactoryTradingSignal>, CopyFactoryError> {
        self.client
            .send_to(
                &self.origin,
                Method::GET,
                &format!("/users/current/subscribers/{}/signals", self.account_id),
                Vec::new(),
                None,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestHttpResponse, TestServer, api_client};
    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;

    #[test]
    fn signal_ids_are_short_and_random() {
        let id = SignalClient::generate_signal_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_lowercase()));
        assert_ne!(id, SignalClient::generate_signal_id());
    }

    #[tokio::test]
    async fn external_signal_requests_target_the_regional_origin() {
        let server = TestServer::spawn(
            vec![
                TestHttpResponse::new(StatusCode::NO_CONTENT, ""),
                TestHttpResponse::new(StatusCode::NO_CONTENT, ""),
                TestHttpResponse::ok_json(
                    r#"[{"strategy":{"id":"ABCD","name":"Strategy"},"positionId":"123456",
                        "time":"2020-08-24T00:00:00.000Z","symbol":"EURUSD","type":"limit","side":"buy",
                        "openPrice":1.05,"signalVolume":0.1,"subscriberVolume":0.2,"leadTime":300,
                        "closeAfter":"2020-08-24T00:05:00.000Z","closedBySignal":false}]"#,
                ),
            ],
            None,
        )
        .await;
        // Shared client points elsewhere; the signal client must use its own origin.
        let client = api_client(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            "header.payload.sign",
        );
        let signals = SignalClient::new("e8867baa", server.origin(), client);

        let time = Utc.with_ymd_and_hms(2020, 8, 24, 0, 0, 0).unwrap();
        let update = CopyFactoryExternalSignalUpdate {
            symbol: "EURUSD".to_string(),
            signal_type: "POSITION_TYPE_BUY".to_string(),
            time,
            volume: Some(0.01),
            ..Default::default()
        };
        signals
            .update_external_signal("ABCD", "0123456", &update)
            .await
            .unwrap();
        signals
            .remove_external_signal("ABCD", "0123456", &CopyFactoryExternalSignalRemove { time })
            .await
            .unwrap();
        let trading = signals.get_trading_signals().await.unwrap();
        assert_eq!(trading[0].symbol, "EURUSD");
        assert_eq!(trading[0].close_after, Some(time + chrono::TimeDelta::minutes(5)));

        let requests = server.requests();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(
            requests[0].path(),
            "/users/current/strategies/ABCD/external-signals/0123456"
        );
        let body = requests[0].body_json();
        assert_eq!(body["type"], "POSITION_TYPE_BUY");
        assert_eq!(body["time"], "2020-08-24T00:00:00.000Z");
        assert_eq!(body["volume"], 0.01);
        assert!(body.get("stopLoss").is_none());

        assert_eq!(requests[1].method, "POST");
        assert_eq!(
            requests[1].path(),
            "/users/current/strategies/ABCD/external-signals/0123456/remove"
        );
        assert_eq!(requests[1].body_json()["time"], "2020-08-24T00:00:00.000Z");

        assert_eq!(requests[2].path(), "/users/current/subscribers/e8867baa/signals");
        assert_eq!(requests[2].header("auth-token"), Some("header.payload.sign"));
    }
}
