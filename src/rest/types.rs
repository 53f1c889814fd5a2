use crate::error::CopyFactoryError;
use crate::time::{format_time, wire_time, wire_time_opt};
use crate::types::{CloseInstructionsMode, LogLevel, StopoutReason, deserialize_null_as_empty_vec};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upper bound the service accepts for `limit` on paged history and log queries.
pub const MAX_PAGE_LIMIT: u32 = 1000;

fn check_limit(endpoint: &str, limit: Option<u32>) -> Result<(), CopyFactoryError> {
    if let Some(limit) = limit
        && (limit == 0 || limit > MAX_PAGE_LIMIT)
    {
        return Err(CopyFactoryError::InvalidParams(format!(
            "{endpoint}: limit must be 1..={MAX_PAGE_LIMIT}"
        )));
    }
    Ok(())
}

fn check_range(
    endpoint: &str,
    from: &DateTime<Utc>,
    till: &DateTime<Utc>,
) -> Result<(), CopyFactoryError> {
    if from > till {
        return Err(CopyFactoryError::InvalidParams(format!(
            "{endpoint}: from must not be after till"
        )));
    }
    Ok(())
}

fn push_all(query: &mut Vec<(String, String)>, key: &str, values: &[String]) {
    query.extend(values.iter().map(|value| (key.to_string(), value.clone())));
}

/// --- Shared ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyId {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyIdAndName {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberOrProvider {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty_vec")]
    pub strategies: Vec<StrategyIdAndName>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// Stop-out threshold; `start_time` restarts the drawdown counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopOutSettings {
    pub value: f64,
    #[serde(
        default,
        with = "wire_time_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskLimit {
    #[serde(rename = "type")]
    pub limit_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_to: Option<String>,
    pub max_risk: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_positions: Option<bool>,
    #[serde(
        default,
        with = "wire_time_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// --- Configuration ---

/// Strategy settings. Settings this crate does not model travel through `extra` unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CopyFactoryStrategyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_lifecycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_pending_orders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trade_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_out_risk: Option<StopOutSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_limits: Option<Vec<RiskLimit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_leverage: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFactoryStrategy {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub settings: CopyFactoryStrategyUpdate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CopyFactoryPortfolioMember {
    pub strategy_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_pending_orders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trade_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_out_risk: Option<StopOutSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_limits: Option<Vec<RiskLimit>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CopyFactoryPortfolioStrategyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_null_as_empty_vec")]
    pub members: Vec<CopyFactoryPortfolioMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trade_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_out_risk: Option<StopOutSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_limits: Option<Vec<RiskLimit>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFactoryPortfolioStrategy {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub settings: CopyFactoryPortfolioStrategyUpdate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CopyFactoryStrategySubscription {
    pub strategy_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_pending_orders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_only: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trade_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_out_risk: Option<StopOutSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_limits: Option<Vec<RiskLimit>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CopyFactorySubscriberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_margin_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_trade_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_only: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_out_risk: Option<StopOutSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_limits: Option<Vec<RiskLimit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_leverage: Option<f64>,
    #[serde(deserialize_with = "deserialize_null_as_empty_vec")]
    pub subscriptions: Vec<CopyFactoryStrategySubscription>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFactorySubscriber {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub settings: CopyFactorySubscriberUpdate,
}

/// Paging for the configuration list endpoints.
#[derive(Debug, Clone, Default)]
pub struct ListConfigurationParams {
    /// Include entries that were removed but are still closing positions.
    pub include_removed: Option<bool>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl ListConfigurationParams {
    pub fn validate(&self) -> Result<(), CopyFactoryError> {
        check_limit("GET /users/current/configuration", self.limit)
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(include_removed) = self.include_removed {
            query.push(("includeRemoved".to_string(), include_removed.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

/// How open positions are treated when a strategy is removed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFactoryCloseInstructions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<CloseInstructionsMode>,
    #[serde(with = "wire_time_opt", skip_serializing_if = "Option::is_none")]
    pub remove_after: Option<DateTime<Utc>>,
}

/// --- History ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFactoryTransaction {
    pub id: String,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(with = "wire_time")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub subscriber: Option<SubscriberOrProvider>,
    #[serde(default)]
    pub demo: Option<bool>,
    #[serde(default)]
    pub provider: Option<SubscriberOrProvider>,
    #[serde(default)]
    pub strategy: Option<StrategyIdAndName>,
    #[serde(default)]
    pub position_id: Option<String>,
    #[serde(default)]
    pub improvement: Option<f64>,
    #[serde(default)]
    pub provider_commission: Option<f64>,
    #[serde(default)]
    pub platform_commission: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub commission: Option<f64>,
    #[serde(default)]
    pub swap: Option<f64>,
    #[serde(default)]
    pub profit: Option<f64>,
    #[serde(default)]
    pub metrics: Option<Map<String, Value>>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// GET /users/current/provided-strategies/transactions query params
#[derive(Debug, Clone)]
pub struct ProvidedTransactionsParams {
    pub from: DateTime<Utc>,
    pub till: DateTime<Utc>,
    pub strategy_ids: Vec<String>,
    pub subscriber_ids: Vec<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl ProvidedTransactionsParams {
    pub fn new(from: DateTime<Utc>, till: DateTime<Utc>) -> Self {
        Self {
            from,
            till,
            strategy_ids: Vec::new(),
            subscriber_ids: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn validate(&self) -> Result<(), CopyFactoryError> {
        const ENDPOINT: &str = "GET /provided-strategies/transactions";
        check_range(ENDPOINT, &self.from, &self.till)?;
        check_limit(ENDPOINT, self.limit)
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("from".to_string(), format_time(&self.from)),
            ("till".to_string(), format_time(&self.till)),
        ];
        push_all(&mut query, "strategyId", &self.strategy_ids);
        push_all(&mut query, "subscriberId", &self.subscriber_ids);
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

/// GET /users/current/strategies-subscribed/transactions query params
#[derive(Debug, Clone)]
pub struct SubscriptionTransactionsParams {
    pub from: DateTime<Utc>,
    pub till: DateTime<Utc>,
    pub strategy_ids: Vec<String>,
    pub provider_ids: Vec<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl SubscriptionTransactionsParams {
    pub fn new(from: DateTime<Utc>, till: DateTime<Utc>) -> Self {
        Self {
            from,
            till,
            strategy_ids: Vec::new(),
            provider_ids: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn validate(&self) -> Result<(), CopyFactoryError> {
        const ENDPOINT: &str = "GET /strategies-subscribed/transactions";
        check_range(ENDPOINT, &self.from, &self.till)?;
        check_limit(ENDPOINT, self.limit)
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("from".to_string(), format_time(&self.from)),
            ("till".to_string(), format_time(&self.till)),
        ];
        push_all(&mut query, "strategyId", &self.strategy_ids);
        push_all(&mut query, "providerId", &self.provider_ids);
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

/// --- Trading ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFactoryStrategyStopout {
    pub strategy: StrategyIdAndName,
    #[serde(default)]
    pub subscriber_id: Option<String>,
    #[serde(default)]
    pub partial: Option<bool>,
    pub reason: StopoutReason,
    #[serde(default)]
    pub reason_description: Option<String>,
    #[serde(default)]
    pub close_positions: Option<bool>,
    #[serde(with = "wire_time")]
    pub stopped_at: DateTime<Utc>,
    #[serde(default, with = "wire_time_opt")]
    pub stopped_till: Option<DateTime<Utc>>,
    /// Cursor used to resume the stopout stream.
    #[serde(default)]
    pub sequence_number: Option<i64>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFactoryUserLogMessage {
    #[serde(with = "wire_time")]
    pub time: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub strategy_id: Option<String>,
    #[serde(default)]
    pub strategy_name: Option<String>,
    #[serde(default)]
    pub position_id: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, rename = "type")]
    pub order_type: Option<String>,
    #[serde(default)]
    pub open_price: Option<f64>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

fn push_log_filters(
    query: &mut Vec<(String, String)>,
    start_time: Option<&DateTime<Utc>>,
    end_time: Option<&DateTime<Utc>>,
    position_id: Option<&String>,
    level: Option<LogLevel>,
) {
    if let Some(start_time) = start_time {
        query.push(("startTime".to_string(), format_time(start_time)));
    }
    if let Some(end_time) = end_time {
        query.push(("endTime".to_string(), format_time(end_time)));
    }
    if let Some(position_id) = position_id {
        query.push(("positionId".to_string(), position_id.clone()));
    }
    if let Some(level) = level {
        query.push(("level".to_string(), level.as_str().to_string()));
    }
}

/// GET /users/current/subscribers/{id}/user-log query params
#[derive(Debug, Clone, Default)]
pub struct GetUserLogParams {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub strategy_id: Option<String>,
    pub position_id: Option<String>,
    pub level: Option<LogLevel>,
    /// Defaults to 0.
    pub offset: Option<u32>,
    /// Defaults to 1000.
    pub limit: Option<u32>,
}

impl GetUserLogParams {
    pub fn validate(&self) -> Result<(), CopyFactoryError> {
        const ENDPOINT: &str = "GET /subscribers/{id}/user-log";
        if let (Some(start), Some(end)) = (&self.start_time, &self.end_time) {
            check_range(ENDPOINT, start, end)?;
        }
        check_limit(ENDPOINT, self.limit)
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("offset".to_string(), self.offset.unwrap_or(0).to_string()),
            ("limit".to_string(), self.limit.unwrap_or(MAX_PAGE_LIMIT).to_string()),
        ];
        push_log_filters(
            &mut query,
            self.start_time.as_ref(),
            self.end_time.as_ref(),
            self.position_id.as_ref(),
            self.level,
        );
        if let Some(strategy_id) = &self.strategy_id {
            query.push(("strategyId".to_string(), strategy_id.clone()));
        }
        query
    }
}

/// GET /users/current/strategies/{id}/user-log query params
#[derive(Debug, Clone, Default)]
pub struct GetStrategyLogParams {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub position_id: Option<String>,
    pub level: Option<LogLevel>,
    /// Defaults to 0.
    pub offset: Option<u32>,
    /// Defaults to 1000.
    pub limit: Option<u32>,
}

impl GetStrategyLogParams {
    pub fn validate(&self) -> Result<(), CopyFactoryError> {
        const ENDPOINT: &str = "GET /strategies/{id}/user-log";
        if let (Some(start), Some(end)) = (&self.start_time, &self.end_time) {
            check_range(ENDPOINT, start, end)?;
        }
        check_limit(ENDPOINT, self.limit)
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("offset".to_string(), self.offset.unwrap_or(0).to_string()),
            ("limit".to_string(), self.limit.unwrap_or(MAX_PAGE_LIMIT).to_string()),
        ];
        push_log_filters(
            &mut query,
            self.start_time.as_ref(),
            self.end_time.as_ref(),
            self.position_id.as_ref(),
            self.level,
        );
        query
    }
}

/// --- Signals ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFactoryExternalSignalUpdate {
    pub symbol: String,
    /// `POSITION_TYPE_BUY`, `POSITION_TYPE_SELL`, `ORDER_TYPE_BUY_LIMIT`, ...
    #[serde(rename = "type")]
    pub signal_type: String,
    #[serde(with = "wire_time")]
    pub time: DateTime<Utc>,
    #[serde(
        default,
        with = "wire_time_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_price: Option<f64>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFactoryExternalSignalRemove {
    #[serde(with = "wire_time")]
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFactoryTradingSignal {
    pub strategy: StrategyIdAndName,
    #[serde(default)]
    pub position_id: Option<String>,
    #[serde(with = "wire_time")]
    pub time: DateTime<Utc>,
    pub symbol: String,
    #[serde(rename = "type")]
    pub signal_type: String,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub open_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub signal_volume: Option<f64>,
    #[serde(default)]
    pub subscriber_volume: Option<f64>,
    #[serde(default)]
    pub lead_time: Option<f64>,
    #[serde(default, with = "wire_time_opt")]
    pub close_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_by_signal: Option<bool>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 8, 8, hour, 0, 0).unwrap()
    }

    #[test]
    fn provided_transactions_query_repeats_list_filters() {
        let mut params = ProvidedTransactionsParams::new(at(0), at(1));
        params.strategy_ids = vec!["ABCD".to_string(), "EFGH".to_string()];
        params.subscriber_ids = vec!["e8867baa".to_string()];
        params.offset = Some(0);
        params.limit = Some(100);

        assert_eq!(
            params.to_query(),
            vec![
                ("from".to_string(), "2020-08-08T00:00:00.000Z".to_string()),
                ("till".to_string(), "2020-08-08T01:00:00.000Z".to_string()),
                ("strategyId".to_string(), "ABCD".to_string()),
                ("strategyId".to_string(), "EFGH".to_string()),
                ("subscriberId".to_string(), "e8867baa".to_string()),
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn params_reject_inverted_range_and_bad_limit() {
        let params = SubscriptionTransactionsParams::new(at(2), at(1));
        assert!(matches!(params.validate(), Err(CopyFactoryError::InvalidParams(_))));

        let mut params = SubscriptionTransactionsParams::new(at(0), at(1));
        params.limit = Some(1001);
        assert!(params.validate().is_err());
        params.limit = Some(1000);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn log_query_applies_default_paging() {
        let params = GetStrategyLogParams {
            level: Some(LogLevel::Warn),
            ..Default::default()
        };
        let query = params.to_query();
        assert!(query.contains(&("offset".to_string(), "0".to_string())));
        assert!(query.contains(&("limit".to_string(), "1000".to_string())));
        assert!(query.contains(&("level".to_string(), "WARN".to_string())));
        assert!(!query.iter().any(|(key, _)| key == "startTime"));
    }

    #[test]
    fn strategy_update_preserves_unknown_settings() {
        let value = serde_json::json!({
            "name": "Test strategy",
            "symbolFilter": {"included": ["EURUSD"]},
            "riskLimits": [{"type": "monthly", "maxRisk": 0.5, "startTime": "2020-08-24T00:00:00.000Z"}]
        });
        let update: CopyFactoryStrategyUpdate = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(update.name.as_deref(), Some("Test strategy"));
        let limits = update.risk_limits.as_ref().unwrap();
        assert_eq!(
            limits[0].start_time.map(|t| format_time(&t)).as_deref(),
            Some("2020-08-24T00:00:00.000Z")
        );
        assert_eq!(serde_json::to_value(&update).unwrap(), value);
    }

    #[test]
    fn close_instructions_serialize_wire_format() {
        let instructions = CopyFactoryCloseInstructions {
            mode: Some(CloseInstructionsMode::CloseGracefullyByPosition),
            remove_after: Some(at(3)),
        };
        assert_eq!(
            serde_json::to_value(&instructions).unwrap(),
            serde_json::json!({
                "mode": "close-gracefully-by-position",
                "removeAfter": "2020-08-08T03:00:00.000Z"
            })
        );
    }
}
