//! `cmscan` detects the content-management system (CMS) behind a list of
//! hosts, using the WhatCMS technology detection API.
//!
//! The cmscan binary is a wrapper around cmscan-lib, which provides
//! convenience functions for calling cmscan from the command-line.
//!
//! Scan every host listed in `subdomains.txt`:
//! ```sh
//! cmscan -k $API_KEY -f subdomains.txt
//! ```
//!
//! Only report WordPress installations and append them to a file:
//! ```sh
//! cmscan -f subdomains.txt -i wordpress -o wordpress.txt
//! ```
//!
//! Use 25 concurrent lookups:
//! ```sh
//! cmscan -f subdomains.txt -t 25
//! ```
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

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Error, Result};
use clap::Parser;
use cmscan_lib::Host;
use log::{error, info};

mod commands;
mod formatters;
mod options;
mod verbosity;

use crate::formatters::log::init_logging;
use crate::options::{CmscanOptions, Config, CMSCAN_CONFIG_FILE};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator. This includes a missing or unreadable host
    // list and a missing API key.
    #[allow(unused)]
    UnexpectedFailure = 1,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Merge all provided config options into one.
/// This includes a potential config file, command-line- and environment variables
fn load_config() -> Result<CmscanOptions> {
    let mut opts = CmscanOptions::parse();

    init_logging(&opts.config.verbose, &opts.config.mode);

    // Load a potentially existing config file and merge it into the config from
    // the CLI
    if let Some(config_file) = &opts.config_file {
        match Config::load_from_file(config_file) {
            Ok(c) => opts.config.merge(c),
            Err(e) => {
                bail!(
                    "Cannot load configuration file `{}`: {e:?}",
                    config_file.display()
                );
            }
        }
    } else {
        // If no config file was explicitly provided, we try to load the default
        // config file from the current directory if the file exits. This will
        // raise an error if the file is invalid, just like the explicit provided
        // config file.
        let default_config = PathBuf::from(CMSCAN_CONFIG_FILE);
        if default_config.is_file() {
            match Config::load_from_file(&default_config) {
                Ok(c) => opts.config.merge(c),
                Err(e) => {
                    bail!(
                        "Cannot load default configuration file `{}`: {e:?}",
                        default_config.display()
                    );
                }
            }
        }
    }

    Ok(opts)
}

/// Set up runtime and call cmscan entrypoint
fn run_main() -> Result<i32> {
    use std::process::exit;

    let opts = match load_config() {
        Ok(opts) => opts,
        Err(e) => {
            error!("Error while loading config: {e}");
            exit(ExitCode::ConfigFile as i32);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;

    match runtime.block_on(run(&opts)) {
        Err(e) if Some(io::ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            exit(ExitCode::Success as i32);
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
/// This is helpful for troubleshooting the root cause of an error.
/// Code is taken from the anyhow documentation.
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
    }
    None
}

/// Read the host list; blank lines and `#` comments are skipped
fn read_hosts(cfg: &Config) -> Result<Vec<Host>> {
    let Some(path) = &cfg.file else {
        bail!("Host list file path is required. Use `-f <FILE>` or `file` in the config file");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Cannot read host list `{}`", path.display()))?;
    Ok(Host::from_lines(&contents))
}

/// Run cmscan on the configured host list
async fn run(opts: &CmscanOptions) -> Result<i32> {
    let hosts = read_hosts(&opts.config)?;
    info!("Scanning {} hosts", hosts.len());

    let (stats, exit_code) = commands::scan(hosts, &opts.config).await?;
    eprintln!("{stats}");

    Ok(exit_code as i32)
}
