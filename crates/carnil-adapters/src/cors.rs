//! CORS Header Injection
//!
//! Every adapter response carries the default CORS headers. Caller-supplied
//! headers are applied on top and win on (case-insensitive) name collision.

use http::{HeaderName, HeaderValue};

use crate::error::{AdapterError, Result};

const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";

/// Headers set on every adapter response
pub const DEFAULT_CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"),
    (ALLOW_HEADERS, "Content-Type, Authorization"),
];

/// Caller overrides for the CORS headers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorsHeaders {
    overrides: Vec<(String, String)>,
}

impl CorsHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a header
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((name.into(), value.into()));
        self
    }

    /// Parse `Name: value; Other-Name: value`.
    pub fn parse(list: &str) -> Result<Self> {
        let mut headers = Self::new();
        for entry in list.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, value) =
                entry
                    .split_once(':')
                    .ok_or_else(|| AdapterError::InvalidHeader {
                        name: entry.to_string(),
                        reason: "expected `Name: value`".into(),
                    })?;
            headers = headers.with(name.trim(), value.trim());
        }
        headers.validate()?;
        Ok(headers)
    }

    /// Append `name` to the resolved `Access-Control-Allow-Headers` list.
    pub fn allow_header(self, name: &str) -> Self {
        let allowed = self
            .resolved()
            .into_iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(ALLOW_HEADERS))
            .map(|(_, value)| value)
            .unwrap_or_default();

        if allowed
            .split(',')
            .any(|existing| existing.trim().eq_ignore_ascii_case(name))
        {
            return self;
        }
        let value = if allowed.trim().is_empty() {
            name.to_string()
        } else {
            format!("{allowed}, {name}")
        };
        self.with(ALLOW_HEADERS, value)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Defaults overlaid with the overrides, in insertion order.
    pub fn resolved(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = DEFAULT_CORS_HEADERS
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();

        for (name, value) in &self.overrides {
            match headers
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(slot) => slot.1.clone_from(value),
                None => headers.push((name.clone(), value.clone())),
            }
        }
        headers
    }

    /// Resolved headers as typed HTTP header pairs
    pub fn header_pairs(&self) -> Result<Vec<(HeaderName, HeaderValue)>> {
        self.resolved()
            .into_iter()
            .map(|(name, value)| {
                let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    AdapterError::InvalidHeader {
                        name: name.clone(),
                        reason: e.to_string(),
                    }
                })?;
                let value =
                    HeaderValue::from_str(&value).map_err(|e| AdapterError::InvalidHeader {
                        name,
                        reason: e.to_string(),
                    })?;
                Ok((header, value))
            })
            .collect()
    }

    /// Check that every header is a valid HTTP header
    pub fn validate(&self) -> Result<()> {
        self.header_pairs().map(|_| ())
    }
}
