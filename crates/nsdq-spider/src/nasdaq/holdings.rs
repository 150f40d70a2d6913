use super::{require, require_rows, Endpoint, FetchError};
use crate::normalize::numeric_field;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

pub struct Holdings;

impl Endpoint for Holdings {
    type Record = InstitutionalHoldingRecord;
    const NAME: &'static str = "institutional holdings";

    fn path(&self, ticker: &str) -> String {
        format!("/company/{ticker}/institutional-holdings?limit=0&type=TOTAL&sortColumn=marketValue")
    }

    fn map(
        &self,
        ticker: &str,
        json: &Value,
    ) -> Result<Vec<InstitutionalHoldingRecord>, FetchError> {
        let data = require(json, "/data")?;
        let active = require_rows(data, "/activePositions/rows")?;

        // new & sold out positions are reported separately, and not for every ticker
        let new_sold_out = data
            .pointer("/newSoldOutPositions/rows")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut positions = Positions::default();
        for (i, row) in active.iter().chain(new_sold_out).enumerate() {
            let row = match PositionRow::deserialize(row) {
                Ok(row) => row,
                Err(err) => {
                    warn!("skipping position row {i} for [{ticker}], error({err})");
                    continue;
                }
            };

            let label = row.positions.as_deref().map(str::trim).unwrap_or_default();
            match Position::from_label(label) {
                Some(position) => {
                    positions.set(
                        position,
                        PositionCount {
                            holders: numeric_field(row.holders.as_deref()).map(|n| n.as_i64()),
                            shares: numeric_field(row.shares.as_deref()).map(|n| n.as_i64()),
                        },
                    );
                }
                None => warn!("unrecognised position label \"{label}\" for [{ticker}]"),
            }
        }

        let summary = |key: &str| {
            data.pointer(&format!("/ownershipSummary/{key}/value"))
                .and_then(Value::as_str)
                .and_then(|raw| numeric_field(Some(raw)))
        };

        Ok(vec![InstitutionalHoldingRecord {
            symbol: ticker.to_string(),
            positions,
            shares_outstanding_pct: summary("SharesOutstandingPCT").map(|n| n.as_f64()),
            shares_outstanding_millions: summary("ShareoutstandingTotal").map(|n| n.as_i64()),
            holdings_value_millions: summary("TotalHoldingsValue").map(|n| n.as_i64()),
        }])
    }
}

// positions
// ----------------------------------------------------------------------------

/// The six categories of institutional position activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Increased,
    Decreased,
    Held,
    Total,
    New,
    SoldOut,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::Increased,
        Position::Decreased,
        Position::Held,
        Position::Total,
        Position::New,
        Position::SoldOut,
    ];

    /// The exact label used in the `positions` column of the API.
    pub fn label(self) -> &'static str {
        match self {
            Position::Increased => "Increased Positions",
            Position::Decreased => "Decreased Positions",
            Position::Held => "Held Positions",
            Position::Total => "Total Institutional Shares",
            Position::New => "New Positions",
            Position::SoldOut => "Sold Out Positions",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionCount {
    pub holders: Option<i64>,
    pub shares: Option<i64>,
}

/// Label -> (holders, shares); every category starts unset and is only filled in when the
/// API reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Positions([PositionCount; 6]);

impl Positions {
    pub fn get(&self, position: Position) -> PositionCount {
        self.0[position.index()]
    }

    pub fn get_ref(&self, position: Position) -> &PositionCount {
        &self.0[position.index()]
    }

    pub fn set(&mut self, position: Position, count: PositionCount) {
        self.0[position.index()] = count;
    }
}

// output
// ----------------------------------------------------------------------------

/// One row of `institutional_holdings`.
#[derive(Clone, Debug, PartialEq)]
pub struct InstitutionalHoldingRecord {
    pub symbol: String,
    pub positions: Positions,
    pub shares_outstanding_pct: Option<f64>,

    /// As reported; the API gives shares outstanding in millions.
    pub shares_outstanding_millions: Option<i64>,

    /// Millions of USD.
    pub holdings_value_millions: Option<i64>,
}

// input
// ----------------------------------------------------------------------------
//
//  {
//      "data": {
//          "ownershipSummary": {
//              "SharesOutstandingPCT": { "label": "Institutional Ownership", "value": "61.04%" },
//              "ShareoutstandingTotal": { "label": "Total Shares Outstanding (millions)", "value": "15,204" },
//              "TotalHoldingsValue": { "label": "Total Value of Holdings (millions)", "value": "$2,067,282" }
//          },
//          "activePositions": {
//              "headers": { ... },
//              "rows": [
//                  { "positions": "Increased Positions", "holders": "1,784", "shares": "254,369,811" },
//                  { "positions": "Decreased Positions", "holders": "2,119", "shares": "312,541,290" },
//                  { "positions": "Held Positions", "holders": "292", "shares": "8,713,021,454" },
//                  { "positions": "Total Institutional Shares", "holders": "4,195", "shares": "9,279,932,555" }
//              ]
//          },
//          "newSoldOutPositions": {
//              "rows": [
//                  { "positions": "New Positions", "holders": "149", "shares": "12,384,022" },
//                  { "positions": "Sold Out Positions", "holders": "109", "shares": "9,871,360" }
//              ]
//          },
//          "holdingsTransactions": { ... }
//      }
//  }
#[derive(Debug, Deserialize)]
struct PositionRow {
    positions: Option<String>,
    holders: Option<String>,
    shares: Option<String>,
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
