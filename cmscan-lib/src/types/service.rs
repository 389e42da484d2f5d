//! Response contract of the technology lookup service.
//!
//! The service answers every request with a JSON document of the shape
//!
//! ```json
//! {
//!   "result": { "code": 200, "msg": "Success" },
//!   "results": [{ "name": "WordPress", "version": "6.4" }],
//!   "retry_in_seconds": 10
//! }
//! ```
//!
//! `results` is only required for successful lookups and `retry_in_seconds`
//! only accompanies rate limit responses.
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{ErrorKind, Result};

/// Result code of a successful lookup
pub const SUCCESS_CODE: i64 = 200;
/// Result code the service uses to signal rate limiting
pub const RATE_LIMIT_CODE: i64 = 120;

/// Maximum number of characters of a raw body kept in protocol errors
const EXCERPT_LENGTH: usize = 200;

/// Status block of a service response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceResult {
    /// Numeric result code; integral floats such as `200.0` are accepted
    #[serde(deserialize_with = "integral_code")]
    pub code: i64,
    /// Human-readable message
    #[serde(default)]
    pub msg: String,
}

/// A single technology reported for a host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Technology {
    /// Name of the technology, e.g. `WordPress`
    pub name: String,
    /// Detected version; empty if the service could not tell
    #[serde(default, deserialize_with = "null_as_empty")]
    pub version: String,
}

impl Technology {
    /// Create a new technology entry
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Parsed response of one lookup request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceResponse {
    /// Status block
    pub result: ServiceResult,
    /// Detected technologies in service order
    #[serde(default)]
    pub results: Option<Vec<Technology>>,
    /// Wait time requested by the service before the next attempt
    #[serde(default)]
    pub retry_in_seconds: Option<f64>,
}

/// Classification of a [`ServiceResponse`]
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStatus {
    /// Lookup succeeded; contains the detected technologies
    Ok(Vec<Technology>),
    /// The service asked us to slow down, optionally with a wait time
    RateLimited(Option<Duration>),
    /// The service reported a terminal error for this host
    Error {
        /// Result code
        code: i64,
        /// Human-readable message
        message: String,
    },
}

impl ServiceResponse {
    /// A successful response listing the given technologies
    #[must_use]
    pub fn success(technologies: Vec<Technology>) -> Self {
        Self {
            result: ServiceResult {
                code: SUCCESS_CODE,
                msg: "Success".to_string(),
            },
            results: Some(technologies),
            retry_in_seconds: None,
        }
    }

    /// A rate limit response
    #[must_use]
    pub fn rate_limited(retry_in_seconds: Option<f64>) -> Self {
        Self {
            result: ServiceResult {
                code: RATE_LIMIT_CODE,
                msg: "Too Many Requests".to_string(),
            },
            results: None,
            retry_in_seconds,
        }
    }

    /// Decode a raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Protocol`] if the body is not JSON, does not match
    /// the response schema, or reports success without a `results` list.
    pub fn from_body(body: &str) -> Result<Self> {
        let response: Self = serde_json::from_str(body).map_err(|e| ErrorKind::Protocol {
            excerpt: excerpt(body),
            reason: e.to_string(),
        })?;
        if response.result.code == SUCCESS_CODE && response.results.is_none() {
            return Err(ErrorKind::Protocol {
                excerpt: excerpt(body),
                reason: "successful response without `results`".to_string(),
            });
        }
        Ok(response)
    }

    /// Classify the response by its result code
    #[must_use]
    pub fn status(self) -> ServiceStatus {
        match self.result.code {
            SUCCESS_CODE => ServiceStatus::Ok(self.results.unwrap_or_default()),
            RATE_LIMIT_CODE => ServiceStatus::RateLimited(
                self.retry_in_seconds
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            ),
            code => ServiceStatus::Error {
                code,
                message: self.result.msg,
            },
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[allow(clippy::cast_possible_truncation)]
fn integral_code<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let code = f64::deserialize(deserializer)?;
    if code.fract() != 0.0 || code.abs() > 1e15 {
        return Err(serde::de::Error::custom(format!(
            "result code `{code}` is not an integer"
        )));
    }
    Ok(code as i64)
}

/// Cut a raw body down to a loggable size without splitting characters
fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_LENGTH) {
        Some((end, _)) => format!("{}…", &body[..end]),
        None => body.to_string(),
    }
}
