use crate::batch::{Batcher, Report};
use crate::http::*;
use crate::nasdaq::{Dividends, Endpoint, Holdings, Info, NasdaqClient, Summary};
use crate::tui::Progress;
use crate::writer::{self, Insertable};
use crate::{db, seed};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fetch `endpoint` for every ticker, writing each chunk's records as it completes.
pub async fn scrape<E>(
    pool: &Pool,
    client: &NasdaqClient,
    endpoint: E,
    tickers: &[String],
    batcher: &Batcher,
    tui: bool,
) -> anyhow::Result<Report>
where
    E: Endpoint,
    E::Record: Insertable,
{
    let time = std::time::Instant::now();
    info!(
        "scraping {} for {} ticker(s), {} per chunk ...",
        E::NAME,
        tickers.len(),
        batcher.batch_size()
    );

    let progress = Progress::new(tickers.len(), E::NAME, tui)?;
    let endpoint = &endpoint;
    let report = batcher
        .run(
            tickers,
            |ticker| async move { client.fetch(endpoint, &ticker).await },
            |records| {
                let spinner = progress.spinner(format!("writing {} record(s)", records.len()));
                async move {
                    let written = writer::insert(pool, &records).await;
                    spinner.finish_and_clear();
                    written
                }
            },
            &progress,
        )
        .await;
    progress.finish();

    if !report.invalid.is_empty() {
        let invalid: Vec<&str> = report.invalid.iter().map(String::as_str).collect();
        warn!("invalid tickers for {}: {}", E::NAME, invalid.join(", "));
    }
    info!(
        "{} finished: {} record(s), {} inserted, {} skipped, {} failed. {}",
        E::NAME,
        report.records,
        report.written.inserted,
        report.written.skipped,
        report.written.failed,
        crate::time_elapsed(time)
    );

    if tui {
        println!(
            "{} ... done: {} inserted, {} skipped, {} failed, {} invalid ticker(s)\n",
            E::NAME,
            report.written.inserted,
            report.written.skipped,
            report.written.failed,
            report.invalid.len()
        );
    }

    Ok(report)
}

/// Seed `tickers` from a ticker list: each symbol's info is fetched and upserted, first write
/// wins. Symbols the API does not know are reported as invalid and never inserted.
pub async fn seed(
    pool: &Pool,
    client: &NasdaqClient,
    path: impl AsRef<Path>,
    batcher: &Batcher,
    tui: bool,
) -> anyhow::Result<Report> {
    let symbols = seed::load_symbols(path).await?;
    scrape(pool, client, Info, &symbols, batcher, tui).await
}

/// The tickers to scrape: everything in `tickers`, or the requested subset of it.
///
/// Records may only reference seeded tickers, so requested symbols that were never seeded are
/// dropped with a warning rather than left to fail at insert time.
pub async fn resolve_tickers(
    pool: &Pool,
    requested: Option<Vec<String>>,
) -> anyhow::Result<Vec<String>> {
    let known = db::tickers(pool).await?;
    let resolved = match requested {
        None => known,
        Some(requested) => filter_known(&known, requested),
    };
    debug!("{} ticker(s) resolved", resolved.len());
    Ok(resolved)
}

fn filter_known(known: &[String], requested: Vec<String>) -> Vec<String> {
    let known: HashSet<&str> = known.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    requested
        .into_iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| {
            if !known.contains(t.as_str()) {
                warn!("[{t}] has not been seeded; skipping");
                return false;
            }
            seen.insert(t.clone())
        })
        .collect()
}

pub async fn dividends(
    pool: &Pool,
    client: &NasdaqClient,
    tickers: &[String],
    batcher: &Batcher,
    tui: bool,
) -> anyhow::Result<Report> {
    scrape(pool, client, Dividends, tickers, batcher, tui).await
}

pub async fn metadata(
    pool: &Pool,
    client: &NasdaqClient,
    tickers: &[String],
    batcher: &Batcher,
    tui: bool,
) -> anyhow::Result<Report> {
    scrape(pool, client, Summary, tickers, batcher, tui).await
}

pub async fn holdings(
    pool: &Pool,
    client: &NasdaqClient,
    tickers: &[String],
    batcher: &Batcher,
    tui: bool,
) -> anyhow::Result<Report> {
    scrape(pool, client, Holdings, tickers, batcher, tui).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tickers_are_dropped() {
        let known = vec!["AAPL".to_string(), "KO".to_string(), "MSFT".to_string()];
        let requested = vec![
            "msft".to_string(),
            "ZZZZ".to_string(),
            " aapl ".to_string(),
            "MSFT".to_string(),
        ];
        assert_eq!(filter_known(&known, requested), vec!["MSFT", "AAPL"]);
    }
}
