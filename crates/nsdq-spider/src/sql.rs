/// Every table, view & index the spider writes to; executed as one batch by
/// [`create_schema`](crate::db::create_schema).
pub(crate) static SCHEMA: &str = include_str!("schema.sql");

pub(crate) static SELECT_TABLES: &str = "
    SELECT table_name
    FROM information_schema.tables
    WHERE table_schema = 'public'
    ORDER BY table_name
";

pub(crate) static SELECT_TICKERS: &str = "
    SELECT symbol
    FROM tickers
    ORDER BY symbol
";

/// An insert target: the columns bound per row, and what to do when a row collides with an
/// existing uniqueness key.
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub on_conflict: Option<&'static str>,
}

// the wire protocol counts bind parameters with an i16
const MAX_PARAMS: usize = i16::MAX as usize;

impl Table {
    /// Largest number of rows a single multi-row INSERT can bind.
    pub fn max_rows(&self) -> usize {
        (MAX_PARAMS / self.columns.len()).max(1)
    }

    /// `INSERT INTO name (a, b) VALUES ($1, $2), ($3, $4), ... [ON CONFLICT ...]`
    ///
    /// Values are never interpolated; every cell is a numbered parameter.
    pub fn insert_statement(&self, rows: usize) -> String {
        let width = self.columns.len();
        let values = (0..rows)
            .map(|row| {
                let params = (1..=width)
                    .map(|col| format!("${}", row * width + col))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({params})")
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut stmt = format!(
            "INSERT INTO {} ({}) VALUES {values}",
            self.name,
            self.columns.join(", ")
        );
        if let Some(clause) = self.on_conflict {
            stmt.push(' ');
            stmt.push_str(clause);
        }
        stmt
    }
}

//////////////////////////////////////////////////////////////////
// tickers
//////////////////////////////////////////////////////////////////

/// `tickers` is the master table; first write wins.
pub static TICKERS: Table = Table {
    name: "tickers",
    columns: &[
        "symbol",
        "company_name",
        "stock_type",
        "exchange",
        "asset_class",
        "is_nasdaq_listed",
        "is_nasdaq100",
        "is_held",
    ],
    on_conflict: Some("ON CONFLICT (symbol) DO NOTHING"),
};

//////////////////////////////////////////////////////////////////
// dividends
//////////////////////////////////////////////////////////////////

/// Re-scraping the same dividend is a no-op.
pub static DIVIDENDS: Table = Table {
    name: "dividends",
    columns: &[
        "symbol",
        "ex_date",
        "payment_type",
        "amount",
        "declaration_date",
        "record_date",
        "payment_date",
        "currency",
    ],
    on_conflict: Some("ON CONFLICT DO NOTHING"),
};

//////////////////////////////////////////////////////////////////
// metadata
//////////////////////////////////////////////////////////////////

/// Time-series; every scrape appends.
pub static METADATA: Table = Table {
    name: "metadata",
    columns: &[
        "symbol",
        "exchange",
        "sector",
        "industry",
        "one_year_target",
        "today_high_low",
        "share_volume",
        "average_volume",
        "previous_close",
        "fifty_two_week_high_low",
        "market_cap",
        "pe_ratio",
        "forward_pe",
        "earnings_per_share",
        "annualized_dividend",
        "ex_dividend_date",
        "dividend_payment_date",
        "current_yield",
        "beta",
        "special_dividend_date",
        "special_dividend_amount",
        "special_dividend_payment_date",
    ],
    on_conflict: None,
};

//////////////////////////////////////////////////////////////////
// institutional holdings
//////////////////////////////////////////////////////////////////

/// Time-series; every scrape appends.
pub static INSTITUTIONAL_HOLDINGS: Table = Table {
    name: "institutional_holdings",
    columns: &[
        "symbol",
        "increased_holders",
        "increased_shares",
        "decreased_holders",
        "decreased_shares",
        "held_holders",
        "held_shares",
        "total_holders",
        "total_shares",
        "new_holders",
        "new_shares",
        "sold_out_holders",
        "sold_out_shares",
        "shares_outstanding_pct",
        "shares_outstanding_millions",
        "holdings_value_millions",
    ],
    on_conflict: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_row_statement() {
        let table = Table {
            name: "t",
            columns: &["a", "b"],
            on_conflict: Some("ON CONFLICT DO NOTHING"),
        };
        assert_eq!(
            table.insert_statement(3),
            "INSERT INTO t (a, b) VALUES ($1, $2), ($3, $4), ($5, $6) ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn single_row_without_conflict_clause() {
        assert_eq!(
            METADATA.insert_statement(1).matches('$').count(),
            METADATA.columns.len()
        );
        assert!(!METADATA.insert_statement(1).contains("ON CONFLICT"));
    }

    #[test]
    fn row_cap_respects_parameter_limit() {
        for table in [&TICKERS, &DIVIDENDS, &METADATA, &INSTITUTIONAL_HOLDINGS] {
            assert!(table.max_rows() * table.columns.len() <= i16::MAX as usize);
        }
    }

    #[test]
    fn schema_declares_every_table() {
        for table in [&TICKERS, &DIVIDENDS, &METADATA, &INSTITUTIONAL_HOLDINGS] {
            assert!(SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table.name)));
            for column in table.columns {
                assert!(SCHEMA.contains(column), "{column} missing from schema.sql");
            }
        }
    }

    #[test]
    fn holdings_summary_columns_carry_their_unit() {
        let columns = INSTITUTIONAL_HOLDINGS.columns;
        assert!(columns.contains(&"shares_outstanding_millions"));
        assert!(columns.contains(&"holdings_value_millions"));
        assert!(SCHEMA.contains("COMMENT ON COLUMN institutional_holdings.holdings_value_millions"));
    }
}
