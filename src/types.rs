use crate::error::ValidationDetail;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Random lowercase ASCII id, used for listener, account and signal ids.
pub(crate) fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// JSON error body returned by the service on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorResponse {
    pub id: Option<i64>,
    pub error: Option<String>,
    pub numeric_code: Option<i64>,
    pub string_code: Option<String>,
    pub message: Option<String>,
    #[serde(deserialize_with = "deserialize_null_as_empty_vec")]
    pub details: Vec<ValidationDetail>,
    #[serde(deserialize_with = "deserialize_null_as_empty_map")]
    pub metadata: Map<String, Value>,
}

pub(crate) fn deserialize_null_as_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// --- Log Level ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    #[serde(other)]
    Unknown,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// --- Stopout Reason ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopoutReason {
    YearlyBalance,
    MonthlyBalance,
    DailyBalance,
    YearlyEquity,
    MonthlyEquity,
    DailyEquity,
    MaxDrawdown,
    #[serde(other)]
    Unknown,
}

impl StopoutReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopoutReason::YearlyBalance => "yearly-balance",
            StopoutReason::MonthlyBalance => "monthly-balance",
            StopoutReason::DailyBalance => "daily-balance",
            StopoutReason::YearlyEquity => "yearly-equity",
            StopoutReason::MonthlyEquity => "monthly-equity",
            StopoutReason::DailyEquity => "daily-equity",
            StopoutReason::MaxDrawdown => "max-drawdown",
            StopoutReason::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StopoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StopoutReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// --- Close Instructions Mode ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseInstructionsMode {
    Preserve,
    CloseGracefullyByPosition,
    CloseGracefullyBySymbol,
}

impl CloseInstructionsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseInstructionsMode::Preserve => "preserve",
            CloseInstructionsMode::CloseGracefullyByPosition => "close-gracefully-by-position",
            CloseInstructionsMode::CloseGracefullyBySymbol => "close-gracefully-by-symbol",
        }
    }
}

impl fmt::Display for CloseInstructionsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CloseInstructionsMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
