use std::path::{Path, PathBuf};
use std::{fs, time::Duration};

use anyhow::{Context, Result};
use clap::builder::{PossibleValuesParser, RangedU64ValueParser, TypedValueParser};
use clap::Parser;
use cmscan_lib::{
    CmsFilter, ScanConfig, DEFAULT_API_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_RETRY_WAIT_TIME_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use const_format::{concatcp, formatcp};
use log::warn;
use secrecy::SecretString;
use serde::Deserialize;
use strum::{Display, EnumString, VariantNames};

use crate::verbosity::Verbosity;

pub(crate) const CMSCAN_CONFIG_FILE: &str = "cmscan.toml";

// this exists because clap requires `&str` type values for defaults
// whereas serde expects owned `String` types
const MAX_CONCURRENCY_STR: &str = concatcp!(DEFAULT_MAX_CONCURRENCY);
const MAX_ATTEMPTS_STR: &str = concatcp!(DEFAULT_MAX_ATTEMPTS);
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS);
const RETRY_WAIT_TIME_STR: &str = concatcp!(DEFAULT_RETRY_WAIT_TIME_SECS);
// We use a custom help message here because we want to show the default
// value of the config file, but also be able to check if the user has
// provided a custom value. If they didn't, we won't throw an error if
// the file doesn't exist.
const HELP_MSG_CONFIG_FILE: &str = formatcp!(
    "Configuration file to use\n\n[default: {}]",
    CMSCAN_CONFIG_FILE,
);

/// The different formatter modes
///
/// This decides over whether to use color or plain text for the output.
#[derive(Debug, Deserialize, Default, Clone, Display, EnumString, VariantNames, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) enum OutputMode {
    /// Plain text output.
    ///
    /// Helpful for scripting or when you want to pipe the output to another
    /// program.
    #[serde(rename = "plain")]
    #[strum(serialize = "plain", ascii_case_insensitive)]
    Plain,

    /// Colorful output.
    ///
    /// This is the default output mode.
    #[serde(rename = "color")]
    #[strum(serialize = "color", ascii_case_insensitive)]
    #[default]
    Color,
}

impl OutputMode {
    /// Returns `true` if the output mode is `Plain`
    pub(crate) const fn is_plain(&self) -> bool {
        matches!(self, OutputMode::Plain)
    }
}

macro_rules! default_function {
    ( $( $name:ident : $T:ty = $e:expr; )* ) => {
        $(
            #[allow(clippy::missing_const_for_fn)]
            fn $name() -> $T {
                $e
            }
        )*
    };
}

// Generate the functions for serde defaults
default_function! {
    max_concurrency: usize = DEFAULT_MAX_CONCURRENCY;
    max_attempts: u32 = DEFAULT_MAX_ATTEMPTS;
    timeout: u64 = DEFAULT_TIMEOUT_SECS;
    retry_wait_time: u64 = DEFAULT_RETRY_WAIT_TIME_SECS;
    api_url: String = DEFAULT_API_URL.to_string();
    user_agent: String = DEFAULT_USER_AGENT.to_string();
    verbosity: Verbosity = Verbosity::default();
}

// Macro for merging configuration values
macro_rules! fold_in {
    ($cli:ident , $toml:ident ; $ty:ident { $(..$ignore:ident,)* $( $key:ident : $default:expr, )* } ) => {
        if (false) {
            #[allow(dead_code, unused, clippy::diverging_sub_expression)]
            let _check_fold_in_exhaustivity = $ty {
                $($key: unreachable!(), )*
                $($ignore: unreachable!(), )*
            };
        };
        $(
            if $cli.$key == $default && $toml.$key != $default {
                $cli.$key = $toml.$key;
            }
        )*
    };
}

/// cmscan detects the content-management system of many hosts at once.
///
/// Hosts are read from a file (one per line) and looked up concurrently with
/// the WhatCMS technology detection API.
#[derive(Parser, Debug)]
#[command(version, about, next_display_order = None)]
pub(crate) struct CmscanOptions {
    /// Configuration file to use
    #[arg(short, long = "config")]
    #[arg(help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) config: Config,
}

/// The main configuration for cmscan
#[derive(Parser, Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Path to the host list file (one host per line)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    #[serde(default)]
    pub(crate) file: Option<PathBuf>,

    /// Append matched hosts to this file
    #[arg(short, long, value_name = "FILE")]
    #[serde(default)]
    pub(crate) output: Option<PathBuf>,

    /// Only report technologies with this name (case-insensitive),
    /// e.g. `--include WordPress`
    #[arg(short, long, value_name = "NAME")]
    #[serde(default)]
    pub(crate) include: Option<String>,

    /// Show all detected technologies and versions, ignoring `--include`
    #[arg(short, long)]
    #[serde(default)]
    pub(crate) all: bool,

    /// Number of concurrent lookups
    #[arg(
        short = 't',
        long = "threads",
        default_value = MAX_CONCURRENCY_STR,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    #[serde(default = "max_concurrency")]
    pub(crate) max_concurrency: usize,

    /// API key of the lookup service
    #[arg(short = 'k', long, env = "WHATCMS_API_KEY", hide_env_values = true)]
    #[serde(default)]
    pub(crate) api_key: Option<SecretString>,

    /// Endpoint of the lookup service
    #[arg(long, default_value = DEFAULT_API_URL)]
    #[serde(default = "api_url")]
    pub(crate) api_url: String,

    /// Website timeout in seconds from connect to response finished
    #[arg(long, default_value = TIMEOUT_STR, value_name = "SECS")]
    #[serde(default = "timeout")]
    pub(crate) timeout: u64,

    /// Maximum number of lookups per host while the service rate limits it
    #[arg(
        long,
        default_value = MAX_ATTEMPTS_STR,
        value_parser = RangedU64ValueParser::<u32>::new().range(1..)
    )]
    #[serde(default = "max_attempts")]
    pub(crate) max_attempts: u32,

    /// Seconds to wait before retrying a rate limited host if the service
    /// does not say how long to wait
    #[arg(long, default_value = RETRY_WAIT_TIME_STR, value_name = "SECS")]
    #[serde(default = "retry_wait_time")]
    pub(crate) retry_wait_time: u64,

    /// User agent
    #[arg(short, long, default_value = DEFAULT_USER_AGENT)]
    #[serde(default = "user_agent")]
    pub(crate) user_agent: String,

    /// Set the output display mode. Determines how results are presented in the terminal
    #[arg(
        long,
        default_value = "color",
        value_parser = PossibleValuesParser::new(OutputMode::VARIANTS).map(|s| s.parse::<OutputMode>().unwrap())
    )]
    #[serde(default)]
    pub(crate) mode: OutputMode,

    /// Verbose program output
    #[clap(flatten)]
    #[serde(default = "verbosity")]
    pub(crate) verbose: Verbosity,
}

impl Config {
    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        // Read configuration file
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }

    /// Merge the configuration from TOML into the CLI configuration
    pub(crate) fn merge(&mut self, toml: Config) {
        // If the config file has an API key, but the CLI doesn't, use the key
        // from the config file.
        // This is outside of fold_in! because SecretBox doesn't implement Eq.
        if self.api_key.is_none() && toml.api_key.is_some() {
            self.api_key = toml.api_key;
        }

        // NOTE: if you see an error within this macro call, check to make sure that
        // that the fields provided to fold_in! match all the fields of the Config struct.
        fold_in! {
            // Destination and source configs
            self, toml;

            Config {
                // Keys which are handled outside of fold_in
                ..api_key,

                // Keys with defaults to assign
                all: false,
                api_url: DEFAULT_API_URL,
                file: None,
                include: None,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                max_concurrency: DEFAULT_MAX_CONCURRENCY,
                mode: OutputMode::Color,
                output: None,
                retry_wait_time: DEFAULT_RETRY_WAIT_TIME_SECS,
                timeout: DEFAULT_TIMEOUT_SECS,
                user_agent: DEFAULT_USER_AGENT,
                verbose: Verbosity::default(),
            }
        }
    }

    /// The CMS filter in effect for this run
    pub(crate) fn filter(&self) -> CmsFilter {
        if self.all {
            if self.include.is_some() {
                warn!("Both `--all` and `--include` are set; reporting all technologies");
            }
            return CmsFilter::default();
        }
        CmsFilter::from(self.include.clone())
    }

    /// Build the run configuration passed to the scan engine.
    ///
    /// Fails if no API key was given.
    pub(crate) fn scan_config(&self) -> Result<ScanConfig> {
        let api_key = self.api_key.clone().context(
            "No API key given. Use `--api-key`, the `WHATCMS_API_KEY` env var, or `api_key` in the config file",
        )?;
        Ok(ScanConfig::builder()
            .api_key(api_key)
            .api_url(self.api_url.clone())
            .max_concurrency(self.max_concurrency)
            .filter(self.filter())
            .output(self.output.clone())
            .timeout(Duration::from_secs(self.timeout))
            .user_agent(self.user_agent.clone())
            .max_attempts(self.max_attempts)
            .retry_wait_time(Duration::from_secs(self.retry_wait_time))
            .build())
    }
}
