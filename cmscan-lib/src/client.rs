//! Handler of lookup requests.
//!
//! This module defines the [`Lookup`] trait, the seam between the scan
//! engine and the technology detection service, and [`Client`], its HTTP
//! implementation.
//!
//! For convenience, a free function [`lookup`] is provided for ad-hoc
//! lookups.
#![allow(clippy::module_name_repetitions)]
use std::fmt::Debug;

use async_trait::async_trait;
use log::trace;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};

use crate::{ErrorKind, Host, Result, ScanConfig, ServiceResponse};

/// Performs a single detection request for a host.
///
/// Implementations must not retry on their own; rate limiting is handled by
/// the [`RetryPolicy`](crate::RetryPolicy) wrapped around them.
#[async_trait]
pub trait Lookup: Send + Sync + Debug {
    /// Look up the technologies of `host`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::Transport`] if no response was received and
    /// with [`ErrorKind::Protocol`] if the response cannot be decoded.
    async fn lookup(&self, host: &Host) -> Result<ServiceResponse>;
}

/// HTTP client for the lookup service.
///
/// A single client is shared by all workers; `reqwest` pools connections
/// internally.
#[derive(Debug, Clone)]
pub struct Client {
    /// Underlying `reqwest` client instance that handles the HTTP requests.
    reqwest_client: reqwest::Client,
    /// Endpoint of the lookup service
    api_url: Url,
    /// Credential sent as the `key` query parameter
    api_key: SecretString,
}

impl Client {
    /// Create a client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid or the underlying HTTP
    /// client cannot be created (e.g. TLS backend initialization failed).
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| ErrorKind::InvalidApiUrl(format!("{}: {e}", config.api_url)))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ErrorKind::InvalidApiUrl(format!(
                "{}: unsupported scheme `{}`",
                config.api_url,
                api_url.scheme()
            )));
        }

        let reqwest_client = reqwest::ClientBuilder::new()
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            reqwest_client,
            api_url,
            api_key: SecretString::from(config.api_key.expose_secret().to_owned()),
        })
    }
}

#[async_trait]
impl Lookup for Client {
    async fn lookup(&self, host: &Host) -> Result<ServiceResponse> {
        trace!("Looking up {host}");
        // Strip the URL from transport errors; it carries the API key.
        let response = self
            .reqwest_client
            .get(self.api_url.clone())
            .query(&[("key", self.api_key.expose_secret()), ("url", host.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;
        ServiceResponse::from_body(&body)
    }
}

/// A shorthand function to look up a single host without a scan.
///
/// No retries are made; a rate limit response is returned as is.
///
/// # Errors
///
/// See [`Client::new`] and [`Lookup::lookup`].
pub async fn lookup(host: &Host, config: &ScanConfig) -> Result<ServiceResponse> {
    Client::new(config)?.lookup(host).await
}
