use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,

    /// Number of tickers fetched concurrently per chunk.
    #[arg(short, long, global = true, default_value_t = nsdq_spider::batch::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database named in NSDQ_URL, along with its schema.
    CreateDb,

    /// Create the tables, indexes & views.
    CreateSchema,

    /// Seed the tickers table from a ticker list (csv, or pipe-delimited nasdaqlisted.txt).
    Seed {
        /// Path to the ticker list.
        path: PathBuf,
    },

    /// Scrape dividend histories.
    Dividends(Selection),

    /// Scrape quote summaries.
    Metadata(Selection),

    /// Scrape institutional holdings.
    Holdings(Selection),

    /// List the tables in the database.
    Tables,
}

#[derive(clap::Args, Debug)]
pub struct Selection {
    /// Only scrape these tickers, e.g. `--tickers AAPL,MSFT`.
    ///
    /// If no tickers are provided, every seeded ticker is scraped.
    #[arg(long, value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}
