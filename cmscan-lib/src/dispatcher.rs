//! Bounded-concurrency scan of a host list.
//!
//! The [`Dispatcher`] feeds hosts into at most `max_concurrency` concurrent
//! lookups and sends every [`ScanResult`] into a channel as soon as it is
//! available. The receiving end is handed out as a stream, so results can
//! be consumed while the scan is still running. The stream ends once every
//! host has reached a terminal outcome.
use std::sync::Arc;

use futures::StreamExt;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{CmsFilter, Host, Lookup, RetryPolicy, ScanConfig, ScanResult};

/// Dispatches host lookups to a bounded pool of in-flight requests
#[derive(Debug)]
pub struct Dispatcher<L> {
    lookup: Arc<L>,
    policy: RetryPolicy,
    filter: CmsFilter,
    max_concurrency: usize,
}

impl<L> Dispatcher<L>
where
    L: Lookup + 'static,
{
    /// Create a new dispatcher around a lookup implementation
    #[must_use]
    pub fn new(lookup: L, config: &ScanConfig) -> Self {
        Self::with_shared(Arc::new(lookup), config)
    }

    /// Create a new dispatcher around a lookup that is shared with the caller
    #[must_use]
    pub fn with_shared(lookup: Arc<L>, config: &ScanConfig) -> Self {
        Self {
            lookup,
            policy: RetryPolicy::from(config),
            filter: config.filter.clone(),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Start scanning `hosts` and return the stream of results.
    ///
    /// Results arrive in completion order, not input order. Entries of a
    /// single host keep the order of the service response.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run<I>(self, hosts: I) -> ReceiverStream<ScanResult>
    where
        I: IntoIterator<Item = Host>,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.max_concurrency);
        let hosts = hosts.into_iter();

        tokio::spawn(async move {
            let dispatcher = &self;
            let tx = &tx;
            futures::stream::iter(hosts)
                .for_each_concurrent(dispatcher.max_concurrency, |host| async move {
                    for result in dispatcher.scan(host).await {
                        if tx.send(result).await.is_err() {
                            warn!("Result stream closed early, dropping result");
                            return;
                        }
                    }
                })
                .await;
            // All workers are done; dropping the sender ends the stream.
            debug!("All hosts processed");
        });

        ReceiverStream::new(rx)
    }

    /// Scan a single host end-to-end
    async fn scan(&self, host: Host) -> Vec<ScanResult> {
        debug!("Processing host: {host}");
        let outcomes = self.policy.invoke(self.lookup.as_ref(), &host).await;
        self.filter
            .apply(outcomes)
            .into_iter()
            .map(|outcome| ScanResult::new(host.clone(), outcome))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tokio::time::Instant;

    use super::*;
    use crate::{Detection, ErrorKind, Outcome, Result, ServiceResponse, Technology};

    /// Counts concurrently active lookups and answers from a fixed table
    #[derive(Debug, Default)]
    struct InstrumentedLookup {
        answers: HashMap<String, Vec<Technology>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        calls: AtomicUsize,
    }

    impl InstrumentedLookup {
        fn with_answers(answers: &[(&str, Vec<Technology>)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(host, technologies)| ((*host).to_string(), technologies.clone()))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Lookup for InstrumentedLookup {
        async fn lookup(&self, host: &Host) -> Result<ServiceResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if host.as_str().starts_with("broken") {
                return ServiceResponse::from_body("not json");
            }
            let technologies = self.answers.get(host.as_str()).cloned().unwrap_or_default();
            Ok(ServiceResponse::success(technologies))
        }
    }

    fn hosts(names: &[&str]) -> Vec<Host> {
        names.iter().filter_map(|name| Host::parse(name)).collect()
    }

    fn config(max_concurrency: usize, filter: &str) -> ScanConfig {
        ScanConfig::builder()
            .api_key("k".to_string())
            .max_concurrency(max_concurrency)
            .filter(filter)
            .build()
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[tokio::test]
    async fn test_concurrency_limit(#[case] limit: usize) {
        let lookup = Arc::new(InstrumentedLookup::default());
        let names: Vec<String> = (0..12).map(|i| format!("host{i}.example.com")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let dispatcher = Dispatcher::with_shared(Arc::clone(&lookup), &config(limit, ""));
        let results: Vec<ScanResult> = dispatcher.run(hosts(&names)).collect().await;

        assert_eq!(results.len(), 12);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 12);
        assert_eq!(lookup.max_active.load(Ordering::SeqCst), limit);
        assert_eq!(lookup.active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_host_is_accounted_for() {
        let lookup = InstrumentedLookup::with_answers(&[
            (
                "multi.com",
                vec![
                    Technology::new("WordPress", "6.4"),
                    Technology::new("WooCommerce", "8.0"),
                ],
            ),
            ("drupal.com", vec![Technology::new("Drupal", "9")]),
        ]);
        let input = hosts(&["multi.com", "drupal.com", "empty.com", "broken.com", "drupal.com"]);

        let results: Vec<ScanResult> = Dispatcher::new(lookup, &config(2, ""))
            .run(input)
            .collect()
            .await;

        let mut per_host: HashMap<String, usize> = HashMap::new();
        for result in &results {
            *per_host.entry(result.host.to_string()).or_default() += 1;
        }
        assert_eq!(per_host["multi.com"], 2);
        assert_eq!(per_host["drupal.com"], 2);
        assert_eq!(per_host["empty.com"], 1);
        assert_eq!(per_host["broken.com"], 1);
        assert_eq!(results.len(), 6);

        let broken = results
            .iter()
            .find(|result| result.host.as_str() == "broken.com")
            .unwrap();
        assert!(matches!(&broken.outcome, Outcome::Failure { cause: ErrorKind::Protocol { .. } }));
    }

    #[tokio::test]
    async fn test_entries_of_a_host_keep_service_order() {
        let lookup = InstrumentedLookup::with_answers(&[(
            "a.com",
            vec![
                Technology::new("WordPress", "6.4"),
                Technology::new("Yoast SEO", "21"),
                Technology::new("Nginx", ""),
            ],
        )]);
        let results: Vec<ScanResult> = Dispatcher::new(lookup, &config(4, ""))
            .run(hosts(&["a.com"]))
            .collect()
            .await;
        let names: Vec<&str> = results
            .iter()
            .filter_map(|result| result.outcome.detection())
            .map(|detection| detection.name.as_str())
            .collect();
        assert_eq!(names, vec!["WordPress", "Yoast SEO", "Nginx"]);
    }

    #[tokio::test]
    async fn test_filter_suppresses_other_entries() {
        let lookup = InstrumentedLookup::with_answers(&[
            (
                "a.com",
                vec![
                    Technology::new("WordPress", "5.9"),
                    Technology::new("Joomla", "3.2"),
                ],
            ),
            ("b.com", vec![Technology::new("Joomla", "4.0")]),
        ]);
        let mut results: Vec<ScanResult> = Dispatcher::new(lookup, &config(2, "wordpress"))
            .run(hosts(&["a.com", "b.com"]))
            .collect()
            .await;
        results.sort_by(|a, b| a.host.cmp(&b.host));

        assert_eq!(
            results,
            vec![
                ScanResult::new(
                    Host::parse("a.com").unwrap(),
                    Outcome::Match(Detection::new("WordPress", "5.9"))
                ),
                ScanResult::new(Host::parse("b.com").unwrap(), Outcome::NoMatch),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_host_list_closes_stream() {
        let results: Vec<ScanResult> =
            Dispatcher::new(InstrumentedLookup::default(), &config(10, ""))
                .run(Vec::new())
                .collect()
                .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let lookup = Arc::new(InstrumentedLookup::default());
        let dispatcher = Dispatcher::with_shared(Arc::clone(&lookup), &config(0, ""));
        let results: Vec<ScanResult> = dispatcher
            .run(hosts(&["a.com", "b.com", "c.com"]))
            .collect()
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(lookup.max_active.load(Ordering::SeqCst), 1);
    }

    /// Rate limits some hosts a fixed number of times, answers all others
    /// immediately
    #[derive(Debug)]
    struct BusyLookup {
        rate_limits_left: Mutex<HashMap<String, usize>>,
        retry_in_seconds: f64,
    }

    #[async_trait]
    impl Lookup for BusyLookup {
        async fn lookup(&self, host: &Host) -> Result<ServiceResponse> {
            let mut left = self.rate_limits_left.lock().unwrap();
            match left.get_mut(host.as_str()) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    Ok(ServiceResponse::rate_limited(Some(self.retry_in_seconds)))
                }
                _ => Ok(ServiceResponse::success(vec![Technology::new("Ghost", "5")])),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrying_host_does_not_block_others() {
        let lookup = BusyLookup {
            rate_limits_left: Mutex::new(HashMap::from([("busy.com".to_string(), 2)])),
            retry_in_seconds: 10.0,
        };
        let start = Instant::now();
        let mut results = Dispatcher::new(lookup, &config(2, ""))
            .run(hosts(&["busy.com", "a.com", "b.com", "c.com"]));

        let mut finished = HashMap::new();
        while let Some(result) = results.next().await {
            assert!(result.outcome.is_match());
            finished.insert(result.host.to_string(), start.elapsed());
        }

        assert_eq!(finished.len(), 4);
        for host in ["a.com", "b.com", "c.com"] {
            assert_eq!(finished[host], Duration::ZERO, "{host}");
        }
        assert!(finished["busy.com"] >= Duration::from_secs(20));
    }
}
