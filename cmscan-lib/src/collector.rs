//! Consumer side of a scan.
//!
//! The [`Collector`] drains the result stream produced by the
//! [`Dispatcher`](crate::Dispatcher), renders each result to the console
//! and appends matches to the optional output file. It is the only writer
//! of that file, so lines never interleave no matter how many lookups run
//! concurrently.
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use futures::{Stream, StreamExt};
use log::error;

use crate::{ErrorKind, Result, ScanConfig, ScanResult, ScanStats};

/// A trait for formatting a scan result
///
/// This trait is used to convert a result into a human-readable string.
/// It can be implemented for different formatting styles such as
/// colorized output or plaintext.
pub trait ResultFormatter: Send + Sync {
    /// Format the result into a human-readable string
    fn format_result(&self, result: &ScanResult) -> String;
}

/// A basic formatter that just returns the result as a string
/// without any color codes or other formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl ResultFormatter for PlainFormatter {
    fn format_result(&self, result: &ScanResult) -> String {
        result.to_string()
    }
}

/// Append-only file receiving the matched entries
#[derive(Debug)]
struct OutputFile {
    path: PathBuf,
    file: Option<File>,
}

impl OutputFile {
    const fn new(path: PathBuf) -> Self {
        Self { path, file: None }
    }

    /// Append a line, creating the file on first use.
    ///
    /// A failed write closes the handle so the next line reopens the file.
    fn append(&mut self, line: &str) -> Result<()> {
        let mut file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|source| self.error(source))?,
        };
        writeln!(file, "{line}").map_err(|source| self.error(source))?;
        self.file = Some(file);
        Ok(())
    }

    fn error(&self, source: std::io::Error) -> ErrorKind {
        ErrorKind::Output {
            path: self.path.clone(),
            source,
        }
    }
}

/// Renders and persists scan results
pub struct Collector<W> {
    console: W,
    formatter: Box<dyn ResultFormatter>,
    output: Option<OutputFile>,
    stats: ScanStats,
}

impl<W> std::fmt::Debug for Collector<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("output", &self.output)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<W: Write> Collector<W> {
    /// Create a collector writing plain lines to `console`
    #[must_use]
    pub fn new(console: W, config: &ScanConfig) -> Self {
        Self {
            console,
            formatter: Box::new(PlainFormatter),
            output: config.output.clone().map(OutputFile::new),
            stats: ScanStats::new(),
        }
    }

    /// Use a custom formatter for console lines
    #[must_use]
    pub fn with_formatter(mut self, formatter: Box<dyn ResultFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Consume `results` until the stream ends.
    ///
    /// Output file failures are logged and skipped; they never stop the run.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Console`] on the first failed console write.
    /// The remaining results are not consumed.
    pub async fn collect<S>(mut self, results: S) -> Result<ScanStats>
    where
        S: Stream<Item = ScanResult>,
    {
        let mut results = std::pin::pin!(results);
        while let Some(result) = results.next().await {
            self.handle(&result).map_err(ErrorKind::Console)?;
        }
        self.console.flush().map_err(ErrorKind::Console)?;
        Ok(self.stats)
    }

    fn handle(&mut self, result: &ScanResult) -> io::Result<()> {
        self.stats.add(result);

        let line = self.formatter.format_result(result);
        writeln!(self.console, "{line}")?;

        if let (Some(output), Some(line)) = (self.output.as_mut(), result.output_line()) {
            if let Err(e) = output.append(&line) {
                error!("{e}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::{Detection, Host, Outcome};

    fn result(host: &str, outcome: Outcome) -> ScanResult {
        ScanResult::new(Host::parse(host).unwrap(), outcome)
    }

    fn config(output: Option<PathBuf>) -> ScanConfig {
        ScanConfig::builder()
            .api_key("k".to_string())
            .output(output)
            .build()
    }

    #[tokio::test]
    async fn test_collect_renders_every_result() {
        let results = futures::stream::iter(vec![
            result("a.com", Outcome::Match(Detection::new("Drupal", "9"))),
            result("b.com", Outcome::NoMatch),
        ]);
        let mut console = Vec::new();
        let stats = Collector::new(&mut console, &config(None))
            .collect(results)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(console).unwrap(),
            "Subdomain: a.com, CMS Name: Drupal, Version: 9\nSubdomain: b.com, no match\n"
        );
        assert_eq!(stats.total, 2);
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.no_matches, 1);
    }

    #[tokio::test]
    async fn test_collect_appends_only_matches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cms.txt");
        fs::write(&path, "Subdomain: old.com, CMS Name: Ghost, Version: 5\n").unwrap();

        let results = futures::stream::iter(vec![
            result("a.com", Outcome::Match(Detection::new("Drupal", "9"))),
            result("b.com", Outcome::NoMatch),
            result("a.com", Outcome::Match(Detection::new("jQuery", ""))),
        ]);
        Collector::new(std::io::sink(), &config(Some(path.clone())))
            .collect(results)
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Subdomain: old.com, CMS Name: Ghost, Version: 5\n\
             Subdomain: a.com, CMS Name: Drupal, Version: 9\n\
             Subdomain: a.com, CMS Name: jQuery, Version: \n"
        );
    }

    #[tokio::test]
    async fn test_collect_survives_unwritable_output() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for appending.
        let path = dir.path().to_path_buf();

        let results = futures::stream::iter(vec![
            result("a.com", Outcome::Match(Detection::new("Drupal", "9"))),
            result("b.com", Outcome::Match(Detection::new("Joomla", "4"))),
        ]);
        let mut console = Vec::new();
        let stats = Collector::new(&mut console, &config(Some(path)))
            .collect(results)
            .await
            .unwrap();

        assert_eq!(stats.matches, 2);
        assert_eq!(String::from_utf8(console).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_output_file_reports_path() {
        let dir = tempdir().unwrap();
        let mut output = OutputFile::new(dir.path().to_path_buf());
        let err = output.append("line").unwrap_err();
        assert!(matches!(err, ErrorKind::Output { ref path, .. } if path == dir.path()));
    }

    /// Console whose reading end is gone
    #[derive(Debug, Default)]
    struct ClosedPipe {
        writes: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_collect_stops_on_broken_console() {
        let results = futures::stream::iter(
            ["a.com", "b.com", "c.com", "d.com"]
                .into_iter()
                .map(|host| result(host, Outcome::NoMatch))
                .collect::<Vec<_>>(),
        );
        let mut console = ClosedPipe::default();
        let err = Collector::new(&mut console, &config(None))
            .collect(results)
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            ErrorKind::Console(e) if e.kind() == io::ErrorKind::BrokenPipe
        ));
        assert_eq!(
            std::error::Error::source(&err)
                .and_then(|e| e.downcast_ref::<io::Error>())
                .map(io::Error::kind),
            Some(io::ErrorKind::BrokenPipe)
        );
        assert_eq!(console.writes, 1);
    }
}
