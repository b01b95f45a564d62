//! Decoding of raw feed text into bars.
//!
//! A kline event carries its bar under `k`:
//!
//! ```json
//! {"e":"kline","E":1672515782136,"s":"BTCUSDT",
//!  "k":{"t":1672515780000,"o":"16500.1","h":"16510.0","l":"16499.2",
//!       "c":"16505.7","v":"12.5","x":false}}
//! ```
//!
//! Prices arrive as decimal strings but plain JSON numbers are accepted too.
//! Everything outside `k.{t,o,h,l,c,v}` is ignored.

use serde_json::Value;
use snafu::{OptionExt, Snafu, ensure};

use crate::models::bar::Bar;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ParseError {
    #[snafu(display("invalid JSON: {source}"))]
    InvalidJson { source: serde_json::Error },

    #[snafu(display("missing field `{field}`"))]
    MissingField { field: &'static str },

    #[snafu(display("field `{field}` is not numeric: {value}"))]
    NotNumeric { field: &'static str, value: String },

    #[snafu(display("field `{field}` is not finite: {value}"))]
    NotFinite { field: &'static str, value: f64 },
}

/// A reply to a request we sent (subscription ack or error), not market data.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlReply {
    pub id: Option<u64>,
    /// The server's `error` object rendered as text, if it rejected the request.
    pub error: Option<String>,
}

/// Builds a [`Bar`] from a decoded kline event.
pub fn bar_from_value(value: &Value) -> Result<Bar, ParseError> {
    let k = value.get("k").context(MissingFieldSnafu { field: "k" })?;

    Ok(Bar {
        timestamp: integer_field(k, "t", "k.t")?,
        open: price_field(k, "o", "k.o")?,
        high: price_field(k, "h", "k.h")?,
        low: price_field(k, "l", "k.l")?,
        close: price_field(k, "c", "k.c")?,
        volume: price_field(k, "v", "k.v")?,
    })
}

/// Recognises `{"result": null, "id": 1}` style replies.
///
/// Anything carrying a `k` payload is market data, never a control reply.
pub fn control_reply(value: &Value) -> Option<ControlReply> {
    let obj = value.as_object()?;
    if obj.contains_key("k") || !obj.contains_key("id") {
        return None;
    }
    Some(ControlReply {
        id: obj.get("id").and_then(Value::as_u64),
        error: obj
            .get("error")
            .filter(|e| !e.is_null())
            .map(Value::to_string),
    })
}

fn price_field(k: &Value, key: &str, field: &'static str) -> Result<f64, ParseError> {
    let raw = k.get(key).context(MissingFieldSnafu { field })?;
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .context(NotNumericSnafu {
        field,
        value: raw.to_string(),
    })?;

    // "NaN" and "inf" parse as f64 but are not prices.
    ensure!(value.is_finite(), NotFiniteSnafu { field, value });
    Ok(value)
}

fn integer_field(k: &Value, key: &str, field: &'static str) -> Result<i64, ParseError> {
    let raw = k.get(key).context(MissingFieldSnafu { field })?;
    let value = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    value.context(NotNumericSnafu {
        field,
        value: raw.to_string(),
    })
}
