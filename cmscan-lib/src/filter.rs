use std::fmt::Display;

use crate::Outcome;

/// Restricts reported technologies to a single CMS name.
///
/// Names are compared case-insensitively. An empty filter lets everything
/// through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmsFilter(Option<String>);

impl CmsFilter {
    /// Create a new filter; blank names disable filtering
    #[must_use]
    pub fn new(name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase);
        Self(name)
    }

    /// Returns `true` if no filter is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Check whether a technology name passes the filter
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        match &self.0 {
            Some(filter) => name.to_lowercase() == *filter,
            None => true,
        }
    }

    /// Drop every match that does not pass the filter.
    ///
    /// Filtering works per entry. Non-match outcomes are kept as they are,
    /// and if nothing is left a single [`Outcome::NoMatch`] takes the place
    /// of the suppressed entries so the host is still accounted for.
    #[must_use]
    pub fn apply(&self, outcomes: Vec<Outcome>) -> Vec<Outcome> {
        let mut kept: Vec<Outcome> = outcomes
            .into_iter()
            .filter(|outcome| match outcome {
                Outcome::Match(detection) => self.is_match(&detection.name),
                _ => true,
            })
            .collect();
        if kept.is_empty() {
            kept.push(Outcome::NoMatch);
        }
        kept
    }
}

impl From<&str> for CmsFilter {
    fn from(name: &str) -> Self {
        Self::new(Some(name))
    }
}

impl From<Option<String>> for CmsFilter {
    fn from(name: Option<String>) -> Self {
        Self::new(name.as_deref())
    }
}

impl Display for CmsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or("*"))
    }
}
