//! Status payload model and upstream schema validation.
//!
//! The orchestrator answers `GET /users/{wallet}` with
//! `{ "data": { "walletAddress": ..., "nodes": [ ... ] } }`. Validation walks
//! that shape explicitly so a missing or mistyped field surfaces as
//! [`NpnError::MalformedUpstreamSchema`] naming the offending path.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};

use crate::core::errors::{NpnError, Result};

/// Upstream timestamp layout: UTC civil time, optional fractional seconds, `Z`.
pub const UPSTREAM_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// One polled wallet and its nodes, in upstream order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    /// `data.walletAddress`, echoed back by the orchestrator.
    pub wallet_address: String,
    pub nodes: Vec<NodeEntry>,
}

/// One element of `data.nodes`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    /// Node identifier, stringified when upstream sends a number.
    pub id: String,
    /// `nodeType`; 2 marks a CLI node.
    pub node_type: i64,
    /// `testnet_two_points`.
    pub points: Points,
    /// `lastUpdated`, always UTC.
    pub last_updated: DateTime<Utc>,
}

/// Point count exactly as the upstream reported it.
///
/// Integers render without a decimal point, fractional values as received.
#[derive(Debug, Clone, PartialEq)]
pub struct Points(Number);

impl Points {
    /// Wrap a JSON number as received.
    #[must_use]
    pub fn new(number: Number) -> Self {
        Self(number)
    }

    /// Strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.as_f64().is_some_and(|value| value > 0.0)
    }
}

impl From<u64> for Points {
    fn from(value: u64) -> Self {
        Self(Number::from(value))
    }
}

impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Self(Number::from(value))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StatusRecord {
    /// Parse a raw response body. Invalid JSON is an [`NpnError::UpstreamBody`]
    /// (worth retrying); valid JSON of the wrong shape is a schema error.
    pub fn from_body(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(|err| NpnError::UpstreamBody {
            details: err.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = as_object(value, "$")?;
        let data = as_object(required(root, "data", "$")?, "data")?;

        let wallet_address = required(data, "walletAddress", "data")?
            .as_str()
            .ok_or_else(|| schema("data.walletAddress", "expected a string"))?
            .to_string();

        let raw_nodes = required(data, "nodes", "data")?
            .as_array()
            .ok_or_else(|| schema("data.nodes", "expected an array"))?;

        let nodes = raw_nodes
            .iter()
            .enumerate()
            .map(|(index, node)| NodeEntry::from_value(node, &format!("data.nodes[{index}]")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            wallet_address,
            nodes,
        })
    }
}

impl NodeEntry {
    fn from_value(value: &Value, path: &str) -> Result<Self> {
        let node = as_object(value, path)?;

        let id = match required(node, "id", path)? {
            Value::String(id) => id.clone(),
            Value::Number(id) if id.is_i64() || id.is_u64() => id.to_string(),
            _ => return Err(schema(&format!("{path}.id"), "expected a string")),
        };

        let node_type = required(node, "nodeType", path)?
            .as_i64()
            .ok_or_else(|| schema(&format!("{path}.nodeType"), "expected an integer"))?;

        let points = match required(node, "testnet_two_points", path)? {
            Value::Number(number) => Points::new(number.clone()),
            _ => {
                return Err(schema(
                    &format!("{path}.testnet_two_points"),
                    "expected a number",
                ));
            }
        };

        let raw_ts = required(node, "lastUpdated", path)?
            .as_str()
            .ok_or_else(|| schema(&format!("{path}.lastUpdated"), "expected a string"))?;
        let last_updated = parse_upstream_timestamp(raw_ts).ok_or_else(|| {
            schema(
                &format!("{path}.lastUpdated"),
                &format!("unrecognised timestamp {raw_ts:?}"),
            )
        })?;

        Ok(Self {
            id,
            node_type,
            points,
            last_updated,
        })
    }
}

/// Parse an upstream `lastUpdated` value as a UTC instant.
///
/// Accepts the orchestrator's `2025-02-21T03:10:06.000Z` layout and falls back
/// to any RFC 3339 timestamp carrying an explicit offset.
#[must_use]
pub fn parse_upstream_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, UPSTREAM_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc)))
        .ok()
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| schema(path, "expected an object"))
}

fn required<'a>(object: &'a Map<String, Value>, key: &str, parent: &str) -> Result<&'a Value> {
    match object.get(key) {
        Some(Value::Null) | None => Err(schema(&format!("{parent}.{key}"), "missing")),
        Some(value) => Ok(value),
    }
}

fn schema(path: &str, problem: &str) -> NpnError {
    NpnError::MalformedUpstreamSchema {
        details: format!("{path}: {problem}"),
    }
}
