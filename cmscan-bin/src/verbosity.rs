//! Counted `-v` / `-q` flags controlling the log level.
//!
//! By default warnings and errors are reported, which includes the notice
//! printed whenever a host is rate limited.
//! - `-q` only reports errors
//! - `-v` adds info
//! - `-vv` adds debug (every dispatched host)
//! - `-vvv` adds trace

use log::Level;
use log::LevelFilter;
use serde::Deserialize;

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Verbosity {
    /// Pass many times for more log output
    ///
    /// By default, it'll report warnings and errors. Passing `-v` one time also
    /// prints info, `-vv` enables debug logging and `-vvv` trace.
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet",
    )]
    verbose: u8,

    /// Less output per occurrence
    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "verbose",
    )]
    quiet: u8,
}

impl Verbosity {
    /// Get the log level.
    pub(crate) const fn log_level(&self) -> Level {
        level_enum(self.verbosity())
    }

    /// Get the log level filter.
    pub(crate) fn log_level_filter(&self) -> LevelFilter {
        self.log_level().to_level_filter()
    }

    #[allow(clippy::cast_possible_wrap)]
    const fn verbosity(&self) -> i8 {
        level_value(Level::Warn) - (self.quiet as i8) + (self.verbose as i8)
    }
}

// This can be deserialized from a string like "warn", "warning", or "Warning"
impl<'de> Deserialize<'de> for Verbosity {
    #[allow(clippy::cast_sign_loss)]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let level = match s.to_lowercase().as_str() {
            "error" => Level::Error,
            "warn" | "warning" => Level::Warn,
            "info" => Level::Info,
            "debug" => Level::Debug,
            "trace" => Level::Trace,
            level => {
                return Err(serde::de::Error::custom(format!(
                    "invalid log level `{level}`"
                )))
            }
        };
        let offset = level_value(level) - level_value(Level::Warn);
        Ok(if offset < 0 {
            Verbosity {
                verbose: 0,
                quiet: offset.unsigned_abs(),
            }
        } else {
            Verbosity {
                verbose: offset as u8,
                quiet: 0,
            }
        })
    }
}

const fn level_value(level: Level) -> i8 {
    match level {
        Level::Error => 0,
        Level::Warn => 1,
        Level::Info => 2,
        Level::Debug => 3,
        Level::Trace => 4,
    }
}

const fn level_enum(verbosity: i8) -> Level {
    match verbosity {
        i8::MIN..=0 => Level::Error,
        1 => Level::Warn,
        2 => Level::Info,
        3 => Level::Debug,
        _ => Level::Trace,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, clap::Parser)]
    struct Cli {
        #[clap(flatten)]
        verbose: Verbosity,
    }

    #[test]
    fn verify_app() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(Verbosity::default().log_level(), Level::Warn);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["cmscan", "-vv"]);
        assert_eq!(cli.verbose.log_level(), Level::Debug);

        let cli = Cli::parse_from(["cmscan", "-qqq"]);
        assert_eq!(cli.verbose.log_level(), Level::Error);
    }

    #[test]
    fn test_deserialize() {
        #[derive(Deserialize)]
        struct Config {
            verbose: Verbosity,
        }
        let config: Config = toml::from_str("verbose = \"info\"").unwrap();
        assert_eq!(config.verbose.log_level(), Level::Info);
        let config: Config = toml::from_str("verbose = \"error\"").unwrap();
        assert_eq!(config.verbose.log_level(), Level::Error);
    }
}
