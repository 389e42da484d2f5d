use std::collections::HashSet;
use std::fmt::{self, Display};

use serde::Serialize;

use crate::{Host, ScanResult};

/// Tally of the results seen by the [`Collector`](crate::Collector)
#[derive(Debug, Default, Serialize)]
pub struct ScanStats {
    /// Number of results
    pub total: usize,
    /// Number of matches
    pub matches: usize,
    /// Number of hosts without a (filtered) match
    pub no_matches: usize,
    /// Number of hosts that failed
    pub failures: usize,
    #[serde(skip)]
    hosts: HashSet<Host>,
}

impl ScanStats {
    #[inline]
    #[must_use]
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a single result
    pub fn add(&mut self, result: &ScanResult) {
        self.total += 1;
        if result.outcome.is_match() {
            self.matches += 1;
        } else if result.outcome.is_failure() {
            self.failures += 1;
        } else {
            self.no_matches += 1;
        }
        if !self.hosts.contains(&result.host) {
            self.hosts.insert(result.host.clone());
        }
    }

    /// Number of distinct hosts seen
    #[must_use]
    pub fn hosts(&self) -> usize {
        self.hosts.len()
    }
}

impl Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🔍 {} hosts, {} results: ✅ {} matches, 👻 {} without match, 🚫 {} errors",
            self.hosts(),
            self.total,
            self.matches,
            self.no_matches,
            self.failures
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Detection, ErrorKind, Outcome};

    #[test]
    fn test_add() {
        let a = Host::parse("a.com").unwrap();
        let b = Host::parse("b.com").unwrap();
        let mut stats = ScanStats::new();
        stats.add(&ScanResult::new(a.clone(), Outcome::Match(Detection::new("WordPress", "6"))));
        stats.add(&ScanResult::new(a, Outcome::Match(Detection::new("WooCommerce", "8"))));
        stats.add(&ScanResult::new(
            b,
            ErrorKind::Service {
                code: 101,
                message: "Invalid API Key".to_string(),
            }
            .into(),
        ));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.hosts(), 2);
        assert_eq!(
            stats.to_string(),
            "🔍 2 hosts, 3 results: ✅ 2 matches, 👻 0 without match, 🚫 1 errors"
        );
    }
}
