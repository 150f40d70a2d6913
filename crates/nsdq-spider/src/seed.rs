use crate::nasdaq::is_valid_symbol;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// A row of a ticker list. Nasdaq's screener export (`Symbol,Name,...`) and the pipe-delimited
/// `nasdaqlisted.txt` (`Symbol|Security Name|...`) both fit; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct SeedRow {
    #[serde(alias = "Symbol", alias = "SYMBOL", alias = "ticker", alias = "Ticker")]
    symbol: String,
}

/// Read a ticker list from disk; see [`parse_symbols`].
pub async fn load_symbols(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    debug!("reading ticker list from {}", path.display());
    let content = tokio::fs::read_to_string(path).await?;
    parse_symbols(&content)
}

/// Symbols in file order, trimmed, upper-cased and de-duplicated. Rows that fail to parse
/// (e.g. the `File Creation Time` footer of `nasdaqlisted.txt`) are logged and skipped.
pub fn parse_symbols(content: &str) -> anyhow::Result<Vec<String>> {
    let header = content.lines().next().unwrap_or_default();
    let delimiter = if header.contains('|') { b'|' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for (i, row) in reader.deserialize::<SeedRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!("skipping ticker list row {}, error({err})", i + 1);
                continue;
            }
        };

        let symbol = row.symbol.trim().to_uppercase();
        if !is_valid_symbol(&symbol) {
            warn!("skipping ticker list row {}, invalid symbol \"{symbol}\"", i + 1);
            continue;
        }
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    if symbols.is_empty() {
        anyhow::bail!("ticker list contains no symbols");
    }
    debug!("{} symbol(s) read from ticker list", symbols.len());
    Ok(symbols)
}
