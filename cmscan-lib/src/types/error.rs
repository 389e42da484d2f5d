use std::hash::Hash;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Possible errors when scanning hosts with `cmscan_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request never produced a response: connection refused, DNS
    /// failure, timeout or an interrupted body.
    #[error("Network error while trying to reach the lookup service: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered, but the body does not follow the expected
    /// response schema.
    #[error("Unexpected response from the lookup service ({reason}): `{excerpt}`")]
    Protocol {
        /// The beginning of the raw response body
        excerpt: String,
        /// Why the body was rejected
        reason: String,
    },
    /// The service reported an error for this host
    #[error("Lookup service returned code {code}: {message}")]
    Service {
        /// Result code reported by the service
        code: i64,
        /// Message reported by the service
        message: String,
    },
    /// The service kept rate limiting the host until the attempt budget was
    /// spent
    #[error("Rate limit retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Number of lookups performed for the host
        attempts: u32,
        /// Wait time the service asked for in its last response
        retry_after: Option<Duration>,
    },
    /// Matched entries could not be written to the output file
    #[error("Cannot write to output file `{}`: {source}", .path.display())]
    Output {
        /// Path of the output file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// Results could not be written to the console, e.g. because the
    /// reading end of a pipe was closed
    #[error("Cannot write to console: {0}")]
    Console(#[source] std::io::Error),
    /// The configured API endpoint cannot be used
    #[error("Invalid lookup service URL: {0}")]
    InvalidApiUrl(String),
}

impl ErrorKind {
    /// Returns the wait time the service asked for, if any
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RetriesExhausted { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Returns `true` if the error happened before the service answered
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the service answered with a body we could not read
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Transport(e1), Self::Transport(e2)) => e1.to_string() == e2.to_string(),
            (
                Self::Protocol {
                    excerpt: x1,
                    reason: r1,
                },
                Self::Protocol {
                    excerpt: x2,
                    reason: r2,
                },
            ) => x1 == x2 && r1 == r2,
            (
                Self::Service {
                    code: c1,
                    message: m1,
                },
                Self::Service {
                    code: c2,
                    message: m2,
                },
            ) => c1 == c2 && m1 == m2,
            (
                Self::RetriesExhausted {
                    attempts: a1,
                    retry_after: r1,
                },
                Self::RetriesExhausted {
                    attempts: a2,
                    retry_after: r2,
                },
            ) => a1 == a2 && r1 == r2,
            (Self::Output { path: p1, source: e1 }, Self::Output { path: p2, source: e2 }) => {
                p1 == p2 && e1.kind() == e2.kind()
            }
            (Self::Console(e1), Self::Console(e2)) => e1.kind() == e2.kind(),
            (Self::InvalidApiUrl(u1), Self::InvalidApiUrl(u2)) => u1 == u2,
            _ => false,
        }
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H>(&self, state: &mut H)
    where
        H: std::hash::Hasher,
    {
        match self {
            Self::Transport(e) => e.to_string().hash(state),
            Self::Protocol { excerpt, reason } => (excerpt, reason).hash(state),
            Self::Service { code, message } => (code, message).hash(state),
            Self::RetriesExhausted {
                attempts,
                retry_after,
            } => (attempts, retry_after).hash(state),
            Self::Output { path, source } => (path, source.kind()).hash(state),
            Self::Console(e) => e.kind().hash(state),
            Self::InvalidApiUrl(u) => u.hash(state),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
