use crate::cli::{Commands, Selection};
use nsdq_spider::batch::{Batcher, Report};
use nsdq_spider::http::{var, Pool};
use nsdq_spider::nasdaq::NasdaqClient;
use nsdq_spider::{db, pipeline};
use tracing::{debug, error, info};

/// Run one command against the database in NSDQ_URL.
pub(crate) async fn run(command: Commands, batch_size: usize, tui: bool) -> anyhow::Result<()> {
    let url = var("NSDQ_URL").map_err(|err| {
        error!("environment variable NSDQ_URL, error({err})");
        err
    })?;

    let time = std::time::Instant::now();
    let batcher = Batcher::new(batch_size);

    use Commands::*;
    match command {
        // `nsdq create-db`: the pool cannot connect until the database exists
        CreateDb => {
            db::create_database(&url).await?;
            db::create_schema(&db::pool(&url)?).await?;
        }

        CreateSchema => db::create_schema(&db::pool(&url)?).await?,

        Seed { path } => {
            let pool = db::pool(&url)?;
            let client = NasdaqClient::from_env()?;
            let report = pipeline::seed(&pool, &client, &path, &batcher, tui).await?;
            summarise("tickers", &report);
        }

        Dividends(selection) => {
            let (pool, client, tickers) = prepare(&url, selection).await?;
            let report = pipeline::dividends(&pool, &client, &tickers, &batcher, tui).await?;
            summarise("dividends", &report);
        }

        Metadata(selection) => {
            let (pool, client, tickers) = prepare(&url, selection).await?;
            let report = pipeline::metadata(&pool, &client, &tickers, &batcher, tui).await?;
            summarise("metadata", &report);
        }

        Holdings(selection) => {
            let (pool, client, tickers) = prepare(&url, selection).await?;
            let report = pipeline::holdings(&pool, &client, &tickers, &batcher, tui).await?;
            summarise("institutional holdings", &report);
        }

        Tables => {
            for table in db::tables(&db::pool(&url)?).await? {
                println!("{table}");
            }
        }
    }

    info!("nsdq finished, time elapsed: {:?}", time.elapsed());
    Ok(())
}

async fn prepare(
    url: &str,
    selection: Selection,
) -> anyhow::Result<(Pool, NasdaqClient, Vec<String>)> {
    let pool = db::pool(url)?;
    let client = NasdaqClient::from_env()?;
    let tickers = pipeline::resolve_tickers(&pool, selection.tickers).await?;
    if tickers.is_empty() {
        anyhow::bail!("no tickers to scrape; run `nsdq seed <CSV>` first");
    }
    debug!("scraping {} ticker(s) from {}", tickers.len(), client.base_url());
    Ok((pool, client, tickers))
}

fn summarise(what: &str, report: &Report) {
    info!(
        "{what}: {} chunk(s), {} record(s), {} inserted, {} skipped, {} failed, {} failed write(s)",
        report.chunks,
        report.records,
        report.written.inserted,
        report.written.skipped,
        report.written.failed,
        report.failed_writes
    );
    for ticker in report.invalid.iter() {
        debug!("invalid ticker: {ticker}");
    }
}
