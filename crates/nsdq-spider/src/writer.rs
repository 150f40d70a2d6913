use crate::http::*;
use crate::nasdaq::{
    DividendRecord, InstitutionalHoldingRecord, MetadataRecord, Position, TickerRecord,
};
use crate::sql::{self, Table};
use std::ops::AddAssign;
use tokio_postgres::types::ToSql;
use tracing::{debug, error, trace, warn};

/// A record that maps onto one row of a [`Table`].
pub trait Insertable: Send + Sync {
    fn table() -> &'static Table;

    /// One parameter per column of [`Insertable::table`], in the same order.
    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;
}

/// Outcome of one write call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Rows that landed in the table.
    pub inserted: u64,

    /// Rows discarded by an `ON CONFLICT DO NOTHING` clause.
    pub skipped: u64,

    /// Rows the database rejected.
    pub failed: u64,
}

impl AddAssign for WriteReport {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
    }
}

/// Write `rows` with one multi-row INSERT per [`Table::max_rows`] slice.
///
/// If a bulk statement is rejected, its rows are retried one at a time so that a single bad
/// row costs only itself; the report then counts the failures instead of aborting the call.
/// No transaction spans the call, so anything inserted before a crash stays committed.
pub async fn insert<R: Insertable>(pool: &Pool, rows: &[R]) -> anyhow::Result<WriteReport> {
    let mut report = WriteReport::default();
    if rows.is_empty() {
        return Ok(report);
    }

    let time = std::time::Instant::now();
    let table = R::table();
    let pg_client = pool.get().await.map_err(|err| {
        error!("failed to get a client for {}, error({err})", table.name);
        err
    })?;

    for slice in rows.chunks(table.max_rows()) {
        let stmt = table.insert_statement(slice.len());
        let params: Vec<&(dyn ToSql + Sync)> = slice.iter().flat_map(|row| row.params()).collect();

        match pg_client.execute(stmt.as_str(), &params).await {
            Ok(n) => {
                trace!("{n} row(s) inserted into {}", table.name);
                report.inserted += n;
                report.skipped += slice.len() as u64 - n;
            }
            Err(err) => {
                warn!(
                    "bulk insert of {} row(s) into {} failed, retrying row by row, error({err})",
                    slice.len(),
                    table.name
                );
                report += insert_each(&pg_client, table, slice).await?;
            }
        }
    }

    debug!(
        "{} written: {report:?}. {}",
        table.name,
        crate::time_elapsed(time)
    );

    Ok(report)
}

// isolate the rows of a rejected bulk statement
async fn insert_each<R: Insertable>(
    pg_client: &PgClient,
    table: &Table,
    rows: &[R],
) -> anyhow::Result<WriteReport> {
    let mut report = WriteReport::default();
    let query = pg_client.prepare(&table.insert_statement(1)).await?;

    for row in rows {
        match pg_client.execute(&query, &row.params()).await {
            Ok(n) => {
                report.inserted += n;
                report.skipped += 1 - n.min(1);
            }
            Err(err) => {
                error!("failed to insert row into {}, error({err})", table.name);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

// records -> rows
// ----------------------------------------------------------------------------

impl Insertable for TickerRecord {
    fn table() -> &'static Table {
        &sql::TICKERS
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 8] = [
            &self.symbol,
            &self.company_name,
            &self.stock_type,
            &self.exchange,
            &self.asset_class,
            &self.is_nasdaq_listed,
            &self.is_nasdaq100,
            &self.is_held,
        ];
        params.to_vec()
    }
}

impl Insertable for DividendRecord {
    fn table() -> &'static Table {
        &sql::DIVIDENDS
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 8] = [
            &self.symbol,
            &self.ex_date,
            &self.payment_type,
            &self.amount,
            &self.declaration_date,
            &self.record_date,
            &self.payment_date,
            &self.currency,
        ];
        params.to_vec()
    }
}

impl Insertable for MetadataRecord {
    fn table() -> &'static Table {
        &sql::METADATA
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 22] = [
            &self.symbol,
            &self.exchange,
            &self.sector,
            &self.industry,
            &self.one_year_target,
            &self.today_high_low,
            &self.share_volume,
            &self.average_volume,
            &self.previous_close,
            &self.fifty_two_week_high_low,
            &self.market_cap,
            &self.pe_ratio,
            &self.forward_pe,
            &self.earnings_per_share,
            &self.annualized_dividend,
            &self.ex_dividend_date,
            &self.dividend_payment_date,
            &self.current_yield,
            &self.beta,
            &self.special_dividend_date,
            &self.special_dividend_amount,
            &self.special_dividend_payment_date,
        ];
        params.to_vec()
    }
}

impl Insertable for InstitutionalHoldingRecord {
    fn table() -> &'static Table {
        &sql::INSTITUTIONAL_HOLDINGS
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(16);
        params.push(&self.symbol);
        for position in Position::ALL {
            let count = self.positions.get_ref(position);
            params.push(&count.holders);
            params.push(&count.shares);
        }
        params.push(&self.shares_outstanding_pct);
        params.push(&self.shares_outstanding_millions);
        params.push(&self.holdings_value_millions);
        params
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
