use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

use crate::{formatters, options::OutputMode, verbosity::Verbosity};

/// Initialize the logging system with the given verbosity level.
pub(crate) fn init_logging(verbose: &Verbosity, mode: &OutputMode) {
    // Set a base level for all modules to `warn`, which is a reasonable default.
    // It will be overridden by RUST_LOG if it's set.
    let env = Env::default().filter_or("RUST_LOG", "warn");

    let mut builder = Builder::from_env(env);
    builder
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    if std::env::var("RUST_LOG").is_err() {
        // Keep other crates (reqwest, hyper) at `warn` and apply the CLI
        // verbosity to our own crates only.
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("cmscan", verbose.log_level_filter())
            .filter_module("cmscan_lib", verbose.log_level_filter());
    }

    if mode.is_plain() {
        // Explicitly disable colors for plain output
        builder.format(move |buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    } else {
        builder.format(move |buf, record| {
            let level = record.level();
            let color = formatters::color::color_for_level(level);
            writeln!(
                buf,
                "{} {}",
                color.apply_to(format!("[{level}]")),
                record.args()
            )
        });
    }

    builder.init();
}
