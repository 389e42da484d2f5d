use std::fmt::Display;

use serde::Serialize;

use super::{ErrorKind, Host, Technology};

/// A detected content-management system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Detection {
    /// Name as reported by the lookup service
    pub name: String,
    /// Version as reported by the lookup service; may be empty
    pub version: String,
}

impl Detection {
    /// Create a new detection
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl From<Technology> for Detection {
    fn from(technology: Technology) -> Self {
        Self {
            name: technology.name,
            version: technology.version,
        }
    }
}

/// Terminal outcome of scanning a host
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A technology passed the filter
    Match(Detection),
    /// Nothing was detected, or nothing passed the filter
    NoMatch,
    /// The host could not be scanned
    Failure {
        /// Why the scan failed
        #[serde(rename = "error")]
        cause: ErrorKind,
    },
}

impl Outcome {
    /// Returns `true` for [`Outcome::Match`]
    #[inline]
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match(_))
    }

    /// Returns `true` for [`Outcome::Failure`]
    #[inline]
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// The detection, if this is a match
    #[must_use]
    pub const fn detection(&self) -> Option<&Detection> {
        match self {
            Self::Match(detection) => Some(detection),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Outcome {
    fn from(cause: ErrorKind) -> Self {
        Self::Failure { cause }
    }
}

/// A single entry flowing from the dispatcher to the collector.
///
/// A host with several detected technologies produces one result per
/// technology, all sharing the same host.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ScanResult {
    /// The scanned host
    pub host: Host,
    /// What the scan found
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ScanResult {
    /// Create a new result
    #[inline]
    #[must_use]
    pub const fn new(host: Host, outcome: Outcome) -> Self {
        Self { host, outcome }
    }

    /// Line written to the output file for matches.
    ///
    /// Returns `None` for anything but [`Outcome::Match`].
    #[must_use]
    pub fn output_line(&self) -> Option<String> {
        self.outcome.detection().map(|detection| {
            format!(
                "Subdomain: {}, CMS Name: {}, Version: {}",
                self.host, detection.name, detection.version
            )
        })
    }
}

impl Display for ScanResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Outcome::Match(detection) => write!(
                f,
                "Subdomain: {}, CMS Name: {}, Version: {}",
                self.host, detection.name, detection.version
            ),
            Outcome::NoMatch => write!(f, "Subdomain: {}, no match", self.host),
            Outcome::Failure { cause } => write!(f, "Subdomain: {}, error: {cause}", self.host),
        }
    }
}
