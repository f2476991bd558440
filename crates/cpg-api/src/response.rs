//! Uniform view over a successful response.
//!
//! Console endpoints wrap their payload as `{"data": …}`; storage-node and
//! RPC endpoints usually don't. [`ApiResponse::data`] hides the difference,
//! while [`ApiResponse::body`] and [`ApiResponse::raw_text`] keep the
//! unmodified reply reachable.

use std::ops::Index;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

static NULL: Value = Value::Null;

/// A 2xx response, read to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: u16,
    url: String,
    raw_text: String,
    body: Value,
}

impl ApiResponse {
    /// Parse `raw_text` as JSON, falling back to a JSON string holding the
    /// text itself when the body isn't JSON (CSV exports, empty replies).
    pub fn new(status: u16, url: impl Into<String>, raw_text: String) -> Self {
        let body = serde_json::from_str(&raw_text).unwrap_or_else(|_| Value::String(raw_text.clone()));
        Self {
            status,
            url: url.into(),
            raw_text,
            body,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The body exactly as received.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// The full parsed body, envelope included.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The payload root: `body["data"]` when present, else the whole body.
    pub fn data(&self) -> &Value {
        match &self.body {
            Value::Object(map) => map.get("data").unwrap_or(&self.body),
            other => other,
        }
    }

    /// Look up `key` in the payload root.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data().get(key)
    }

    /// Look up a string field in the payload root, failing when absent or null.
    pub fn require_str(&self, key: &str) -> Result<&str, Error> {
        self.get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MissingField { field: key.into() })
    }

    /// Decode the payload root into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        T::deserialize(self.data()).map_err(|e| {
            let preview: String = self.raw_text.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: self.raw_text.clone(),
            }
        })
    }

    pub fn into_data(self) -> Value {
        match self.body {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}

impl Index<&str> for ApiResponse {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}
