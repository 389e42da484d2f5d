//! Run configuration shared by every stage of a scan.
#![allow(clippy::module_name_repetitions)]
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use typed_builder::TypedBuilder;

use crate::CmsFilter;

/// Default number of concurrent lookups, 10.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
/// Default number of lookups per host while rate limited, 5.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default wait time in seconds when the service gives none, 5.
pub const DEFAULT_RETRY_WAIT_TIME_SECS: u64 = 5;
/// Default timeout in seconds before a request is deemed as failed, 20.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
/// Default lookup service endpoint.
pub const DEFAULT_API_URL: &str = "https://whatcms.org/API/Tech";
/// Default user agent, `cmscan-<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("cmscan/", env!("CARGO_PKG_VERSION"));

/// Immutable settings of a scan run.
///
/// Build it once at startup and hand references to [`Client::new`],
/// [`RetryPolicy::from`], [`Dispatcher::new`] and [`Collector::new`].
///
/// ```
/// use cmscan_lib::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .api_key("secret".to_string())
///     .filter("WordPress")
///     .max_concurrency(4_usize)
///     .build();
/// assert_eq!(config.max_concurrency, 4);
/// ```
///
/// [`Client::new`]: crate::Client::new
/// [`RetryPolicy::from`]: crate::RetryPolicy
/// [`Dispatcher::new`]: crate::Dispatcher::new
/// [`Collector::new`]: crate::Collector::new
#[derive(TypedBuilder, Debug)]
#[builder(builder_method(doc = "
Create a builder for building `ScanConfig`.

On the builder call, call methods with same name as its fields to set their values.
The API key is the only required field.

Finally, call `.build()` to create the instance of `ScanConfig`.
"))]
pub struct ScanConfig {
    /// Maximum number of lookups in flight at the same time.
    #[builder(default = DEFAULT_MAX_CONCURRENCY, setter(into))]
    pub max_concurrency: usize,
    /// Only report technologies with this name.
    #[builder(default, setter(into))]
    pub filter: CmsFilter,
    /// Append matches to this file.
    #[builder(default, setter(into))]
    pub output: Option<PathBuf>,
    /// Endpoint of the lookup service.
    #[builder(default_code = "String::from(DEFAULT_API_URL)", setter(into))]
    pub api_url: String,
    /// Credential attached to every request.
    #[builder(setter(into))]
    pub api_key: SecretString,
    /// Response timeout per request.
    #[builder(default = Duration::from_secs(DEFAULT_TIMEOUT_SECS), setter(into))]
    pub timeout: Duration,
    /// User-agent sent with every request.
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)", setter(into))]
    pub user_agent: String,
    /// Maximum number of lookups per host while the service keeps rate
    /// limiting it. The host fails once this budget is spent.
    #[builder(default = DEFAULT_MAX_ATTEMPTS, setter(into))]
    pub max_attempts: u32,
    /// Wait time used when a rate limit response carries none.
    #[builder(default = Duration::from_secs(DEFAULT_RETRY_WAIT_TIME_SECS), setter(into))]
    pub retry_wait_time: Duration,
}
