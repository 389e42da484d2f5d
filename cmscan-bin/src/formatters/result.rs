use cmscan_lib::{Outcome, ResultFormatter, ScanResult};

use crate::formatters::color::{BOLD_GREEN, DIM, GREEN, PINK};

/// A colorized formatter for scan results
///
/// This formatter is used if the terminal supports color and the user
/// has not explicitly requested plain, uncolored output.
pub(crate) struct ColorFormatter;

impl ColorFormatter {
    fn format_match(result: &ScanResult, name: &str, version: &str) -> String {
        let version = if version.is_empty() {
            DIM.apply_to("unknown").to_string()
        } else {
            GREEN.apply_to(version).to_string()
        };
        format!(
            "Subdomain: {}, CMS Name: {}, Version: {version}",
            result.host,
            BOLD_GREEN.apply_to(name)
        )
    }
}

impl ResultFormatter for ColorFormatter {
    fn format_result(&self, result: &ScanResult) -> String {
        match &result.outcome {
            Outcome::Match(detection) => {
                Self::format_match(result, &detection.name, &detection.version)
            }
            Outcome::NoMatch => DIM.apply_to(result).to_string(),
            Outcome::Failure { .. } => PINK.apply_to(result).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cmscan_lib::{Detection, ErrorKind, Host};
    use pretty_assertions::assert_eq;

    use super::*;

    fn result(outcome: Outcome) -> ScanResult {
        ScanResult::new(Host::parse("a.com").unwrap(), outcome)
    }

    #[test]
    fn test_color_formatter_keeps_text() {
        // Styles are stripped when stdout is not a terminal
        console::set_colors_enabled(false);
        let formatter = ColorFormatter;

        assert_eq!(
            formatter.format_result(&result(Outcome::Match(Detection::new("Drupal", "9")))),
            "Subdomain: a.com, CMS Name: Drupal, Version: 9"
        );
        assert_eq!(
            formatter.format_result(&result(Outcome::Match(Detection::new("Drupal", "")))),
            "Subdomain: a.com, CMS Name: Drupal, Version: unknown"
        );
        assert_eq!(
            formatter.format_result(&result(Outcome::NoMatch)),
            "Subdomain: a.com, no match"
        );
        assert_eq!(
            formatter.format_result(&result(
                ErrorKind::Service {
                    code: 101,
                    message: "Invalid API Key".to_string()
                }
                .into()
            )),
            "Subdomain: a.com, error: Lookup service returned code 101: Invalid API Key"
        );
    }
}
