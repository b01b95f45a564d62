//! The request sent right after the websocket handshake.

use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionMethod {
    Subscribe,
}

/// `{"method": "SUBSCRIBE", "params": [...], "id": 1}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub method: SubscriptionMethod,
    /// Channel identifiers, sent exactly as configured.
    pub params: Vec<String>,
    /// Correlation number echoed back in the server's reply.
    pub id: u64,
}

impl SubscriptionRequest {
    pub fn subscribe(channels: Vec<String>, id: u64) -> Self {
        Self {
            method: SubscriptionMethod::Subscribe,
            params: channels,
            id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Stream name for one symbol's klines, e.g. `btcusdt@kline_1m`.
pub fn kline_channel(symbol: &str, interval: TimeFrame) -> String {
    format!("{}@kline_{}", symbol.trim().to_lowercase(), interval)
}
