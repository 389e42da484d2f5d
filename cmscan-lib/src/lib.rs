//! `cmscan` is a library for detecting the content-management system behind
//! a list of hosts.
//!
//! Each host is looked up with a technology detection service. Lookups run
//! concurrently with a hard upper bound, hosts the service rate limits are
//! retried after the announced wait, and results are streamed to a
//! collector as soon as they arrive.
//!
//! "Hello world" example:
//! ```no_run
//! use cmscan_lib::{Client, Collector, Dispatcher, Host, Result, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!   let config = ScanConfig::builder()
//!       .api_key("my-api-key".to_string())
//!       .filter("WordPress")
//!       .build();
//!   let hosts = Host::from_lines("blog.example.com\nshop.example.com\n");
//!
//!   let results = Dispatcher::new(Client::new(&config)?, &config).run(hosts);
//!   let stats = Collector::new(std::io::stdout(), &config)
//!       .collect(results)
//!       .await?;
//!   println!("{stats}");
//!   Ok(())
//! }
//! ```
//!
//! For a one-off lookup without the scan machinery use [`lookup`].
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

mod client;
mod config;
mod dispatcher;
mod filter;
mod retry;
mod stats;
mod types;

pub mod collector;

pub use crate::{
    client::{lookup, Client, Lookup},
    collector::{Collector, PlainFormatter, ResultFormatter},
    config::{
        ScanConfig, DEFAULT_API_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENCY,
        DEFAULT_RETRY_WAIT_TIME_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    },
    dispatcher::Dispatcher,
    filter::CmsFilter,
    retry::RetryPolicy,
    stats::ScanStats,
    types::{
        Detection, ErrorKind, Host, Outcome, Result, ScanResult, ServiceResponse, ServiceResult,
        ServiceStatus, Technology, RATE_LIMIT_CODE, SUCCESS_CODE,
    },
};
