use crate::nasdaq::FetchError;
use crate::tui::Progress;
use crate::writer::WriteReport;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, trace, warn};

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// How long to hold back between chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pacing {
    /// Start the next chunk as soon as the previous one is written.
    Off,

    /// Wait a fixed delay after each chunk, before starting the next.
    Delay(Duration),

    /// Keep at least this long between the starts of consecutive chunks; a slow chunk eats
    /// into the wait instead of adding to it.
    MinInterval(Duration),
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing::Delay(DEFAULT_DELAY)
    }
}

/// Applies a [`Pacing`] policy across the chunks of one run.
#[derive(Debug)]
pub struct Pacer {
    pacing: Pacing,
    last_start: Option<Instant>,
}

impl Pacer {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            last_start: None,
        }
    }

    /// Resolves once the next chunk may start. The first chunk never waits.
    pub async fn ready(&mut self) {
        if let Some(last_start) = self.last_start {
            match self.pacing {
                Pacing::Off => {}
                Pacing::Delay(delay) => sleep(delay).await,
                Pacing::MinInterval(gap) => sleep_until(last_start + gap).await,
            }
        }
        self.last_start = Some(Instant::now());
    }
}

/// Tickers for which the last fetch yielded nothing usable; sorted & de-duplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvalidTickers(BTreeSet<String>);

impl InvalidTickers {
    pub fn insert(&mut self, ticker: impl Into<String>) -> bool {
        self.0.insert(ticker.into())
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains(ticker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

/// Summary of one fan-out run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub chunks: usize,

    /// Running total of records fetched (empty results excluded).
    pub records: usize,

    pub invalid: InvalidTickers,

    pub written: WriteReport,

    /// Chunks whose write call failed outright.
    pub failed_writes: usize,
}

/// Splits a ticker list into fixed-size chunks; fetches every ticker of a chunk concurrently,
/// hands the chunk's records to a sink, then paces before the next chunk.
#[derive(Clone, Debug)]
pub struct Batcher {
    batch_size: usize,
    pacing: Pacing,
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl Batcher {
    /// A batch size of 0 is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// `ceil(N / K)` contiguous chunks, in list order.
    pub fn chunks<'a, T>(&self, items: &'a [T]) -> std::slice::Chunks<'a, T> {
        items.chunks(self.batch_size)
    }

    /// Run `fetch_one` for every ticker and `sink` once per non-empty chunk.
    ///
    /// Chunks run strictly one after another; within a chunk every fetch is in flight at the
    /// same time and the chunk only completes when all of them have. A failed fetch never
    /// aborts the run: the ticker is recorded in [`Report::invalid`] and skipped.
    pub async fn run<T, F, Fut, S, SFut>(
        &self,
        tickers: &[String],
        fetch_one: F,
        mut sink: S,
        progress: &Progress,
    ) -> Report
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Vec<T>, FetchError>>,
        S: FnMut(Vec<T>) -> SFut,
        SFut: Future<Output = anyhow::Result<WriteReport>>,
    {
        let mut report = Report::default();
        let mut pacer = Pacer::new(self.pacing);
        let total_chunks = tickers.len().div_ceil(self.batch_size);

        for (i, chunk) in self.chunks(tickers).enumerate() {
            pacer.ready().await;
            trace!("chunk {}/{total_chunks}: {chunk:?}", i + 1);

            let results = join_all(chunk.iter().map(|ticker| fetch_one(ticker.clone()))).await;

            let mut records = Vec::new();
            for (ticker, result) in chunk.iter().zip(results) {
                match result {
                    Ok(fetched) if fetched.is_empty() => {
                        debug!("no records for [{ticker}]");
                        progress.success();
                    }
                    Ok(fetched) => {
                        records.extend(fetched);
                        progress.success();
                    }
                    Err(err) => {
                        warn!("[{ticker}] marked invalid, error({err})");
                        report.invalid.insert(ticker.as_str());
                        progress.fail();
                    }
                }
            }

            report.chunks += 1;
            report.records += records.len();
            debug!(
                "chunk {}/{total_chunks} fetched, running total: {} record(s)",
                i + 1,
                report.records
            );

            if records.is_empty() {
                continue;
            }
            match sink(records).await {
                Ok(written) => report.written += written,
                Err(err) => {
                    error!("failed to write chunk {}/{total_chunks}, error({err})", i + 1);
                    report.failed_writes += 1;
                }
            }
        }

        info!(
            "{} record(s) collected from {} ticker(s) in {} chunk(s); {} invalid",
            report.records,
            tickers.len(),
            report.chunks,
            report.invalid.len()
        );

        report
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn tickers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{i:02}")).collect()
    }

    #[test]
    fn chunks_preserve_order() {
        let batcher = Batcher::new(10);
        let tickers = tickers(23);
        let chunks: Vec<&[String]> = batcher.chunks(&tickers).collect();

        assert_eq!(
            chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
            vec![10, 10, 3]
        );
        assert_eq!(chunks.concat(), tickers);
    }

    #[test]
    fn zero_batch_size_is_one() {
        assert_eq!(Batcher::new(0).batch_size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_run_in_order_with_a_delay_between_starts() {
        let batcher = Batcher::new(10);
        let tickers = tickers(23);

        // (ticker, instant the fetch began)
        let started: Arc<Mutex<Vec<(String, Instant)>>> = Arc::default();
        let sunk: Arc<Mutex<Vec<usize>>> = Arc::default();

        let report = batcher
            .run(
                &tickers,
                |ticker| {
                    let started = started.clone();
                    async move {
                        started.lock().unwrap().push((ticker.clone(), Instant::now()));
                        tokio::time::sleep(Duration::from_millis(250)).await;
                        Ok::<_, FetchError>(vec![ticker])
                    }
                },
                |records| {
                    let sunk = sunk.clone();
                    async move {
                        sunk.lock().unwrap().push(records.len());
                        Ok::<_, anyhow::Error>(WriteReport {
                            inserted: records.len() as u64,
                            ..Default::default()
                        })
                    }
                },
                &Progress::hidden(),
            )
            .await;

        assert_eq!(report.chunks, 3);
        assert_eq!(report.records, 23);
        assert_eq!(report.written.inserted, 23);
        assert_eq!(*sunk.lock().unwrap(), vec![10, 10, 3]);

        let started = started.lock().unwrap();
        let chunk_starts: Vec<Instant> = [0, 10, 20].iter().map(|&i| started[i].1).collect();

        // every fetch of a chunk starts together, and chunks start in list order
        for (i, (ticker, at)) in started.iter().enumerate() {
            assert_eq!(ticker, &tickers[i]);
            assert_eq!(*at, chunk_starts[i / 10]);
        }
        for pair in chunk_starts.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_DELAY);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn min_interval_pacing() {
        let mut pacer = Pacer::new(Pacing::MinInterval(Duration::from_secs(1)));

        let t0 = Instant::now();
        pacer.ready().await;
        assert_eq!(Instant::now(), t0);

        // a short chunk waits out the rest of the interval
        tokio::time::sleep(Duration::from_millis(400)).await;
        pacer.ready().await;
        let elapsed = Instant::now() - t0;
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_millis(1100));

        // a long chunk does not wait at all
        tokio::time::sleep(Duration::from_millis(1500)).await;
        pacer.ready().await;
        let elapsed = Instant::now() - t0;
        assert!(elapsed >= Duration::from_millis(2500) && elapsed < Duration::from_millis(2600));
    }

    #[tokio::test(start_paused = true)]
    async fn off_pacing_never_waits() {
        let mut pacer = Pacer::new(Pacing::Off);
        let t0 = Instant::now();
        for _ in 0..3 {
            pacer.ready().await;
        }
        assert_eq!(Instant::now(), t0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_collected_not_propagated() {
        let batcher = Batcher::new(2).with_pacing(Pacing::Off);
        let tickers = vec![
            "AAPL".to_string(),
            "BAD1".to_string(),
            "MSFT".to_string(),
            "EMPTY".to_string(),
            "BAD2".to_string(),
        ];

        let report = batcher
            .run(
                &tickers,
                |ticker| async move {
                    match ticker.as_str() {
                        "BAD1" | "BAD2" => Err(FetchError::Structure("/data".to_string())),
                        "EMPTY" => Ok(vec![]),
                        _ => Ok(vec![ticker.clone(), ticker.clone()]),
                    }
                },
                |records: Vec<String>| async move {
                    Ok::<_, anyhow::Error>(WriteReport {
                        inserted: records.len() as u64,
                        ..Default::default()
                    })
                },
                &Progress::hidden(),
            )
            .await;

        assert_eq!(report.chunks, 3);
        assert_eq!(report.records, 4);
        assert_eq!(report.written.inserted, 4);
        assert_eq!(report.invalid.len(), 2);
        assert!(report.invalid.contains("BAD1"));
        assert!(report.invalid.contains("BAD2"));
        assert!(!report.invalid.contains("EMPTY"));
    }

    #[tokio::test(start_paused = true)]
    async fn sink_errors_do_not_stop_the_run() {
        let batcher = Batcher::new(1).with_pacing(Pacing::Off);
        let tickers = tickers(3);
        let calls = Arc::new(Mutex::new(0));

        let report = batcher
            .run(
                &tickers,
                |ticker| async move { Ok::<_, FetchError>(vec![ticker]) },
                |_records: Vec<String>| {
                    let calls = calls.clone();
                    async move {
                        let mut calls = calls.lock().unwrap();
                        *calls += 1;
                        if *calls == 2 {
                            anyhow::bail!("connection reset");
                        }
                        Ok(WriteReport::default())
                    }
                },
                &Progress::hidden(),
            )
            .await;

        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(report.failed_writes, 1);
    }
}
