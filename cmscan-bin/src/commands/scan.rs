use std::io;

use anyhow::Result;
use cmscan_lib::{Client, Collector, Dispatcher, Host, ScanConfig, ScanStats};

use crate::formatters::get_result_formatter;
use crate::options::Config;
use crate::ExitCode;

/// Scan all hosts and print one line per result to stdout.
///
/// The collector runs as its own task next to the dispatcher, so results are
/// printed while lookups are still in flight. A console write failure ends
/// the scan; see `run_main` for how a closed pipe is treated.
pub(crate) async fn scan(hosts: Vec<Host>, cfg: &Config) -> Result<(ScanStats, ExitCode)> {
    let scan_config: ScanConfig = cfg.scan_config()?;
    let client = Client::new(&scan_config)?;

    let results = Dispatcher::new(client, &scan_config).run(hosts);
    let collector = Collector::new(io::stdout(), &scan_config)
        .with_formatter(get_result_formatter(&cfg.mode));
    let collector_handle = tokio::spawn(collector.collect(results));

    let stats = collector_handle.await??;
    Ok((stats, ExitCode::Success))
}
