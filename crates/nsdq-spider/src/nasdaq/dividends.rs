use super::{require_rows, Endpoint, FetchError};
use crate::normalize::{date_field, numeric_field, string_field};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

pub struct Dividends;

impl Endpoint for Dividends {
    type Record = DividendRecord;
    const NAME: &'static str = "dividends";

    fn path(&self, ticker: &str) -> String {
        format!("/quote/{ticker}/dividends?assetclass=stocks")
    }

    fn map(&self, ticker: &str, json: &Value) -> Result<Vec<DividendRecord>, FetchError> {
        let rows = require_rows(json, "/data/dividends/rows")?;

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            match DividendRow::deserialize(row) {
                Ok(row) => records.push(row.into_record(ticker)),
                Err(err) => warn!("skipping dividend row {i} for [{ticker}], error({err})"),
            }
        }
        Ok(records)
    }
}

// output
// ----------------------------------------------------------------------------

/// One row of `dividends`.
#[derive(Clone, Debug, PartialEq)]
pub struct DividendRecord {
    pub symbol: String,
    pub ex_date: Option<NaiveDate>,
    pub payment_type: Option<String>,
    pub amount: Option<f64>,
    pub declaration_date: Option<NaiveDate>,
    pub record_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub currency: Option<String>,
}

// input
// ----------------------------------------------------------------------------
//
//  {
//      "data": {
//          "exDividendDate": "08/12/2024",
//          "dividends": {
//              "headers": { ... },
//              "rows": [
//                  {
//                      "exOrEffDate": "08/12/2024",
//                      "type": "Cash",
//                      "amount": "$0.25",
//                      "declarationDate": "08/01/2024",
//                      "recordDate": "08/12/2024",
//                      "paymentDate": "08/15/2024",
//                      "currency": "USD"
//                  },
//                  ...
//              ]
//          }
//      },
//      "message": null,
//      "status": { "rCode": 200, ... }
//  }
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DividendRow {
    ex_or_eff_date: Option<String>,
    #[serde(rename = "type")]
    payment_type: Option<String>,
    amount: Option<String>,
    declaration_date: Option<String>,
    record_date: Option<String>,
    payment_date: Option<String>,
    currency: Option<String>,
}

impl DividendRow {
    fn into_record(self, ticker: &str) -> DividendRecord {
        DividendRecord {
            symbol: ticker.to_string(),
            ex_date: date_field(self.ex_or_eff_date.as_deref()),
            payment_type: string_field(self.payment_type.as_deref()),
            amount: numeric_field(self.amount.as_deref()).map(|n| n.as_f64()),
            declaration_date: date_field(self.declaration_date.as_deref()),
            record_date: date_field(self.record_date.as_deref()),
            payment_date: date_field(self.payment_date.as_deref()),
            currency: string_field(self.currency.as_deref()),
        }
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn maps_rows() {
        let doc = json!({
            "data": { "dividends": { "rows": [
                {
                    "exOrEffDate": "08/12/2024",
                    "type": "Cash",
                    "amount": "$0.25",
                    "declarationDate": "08/01/2024",
                    "recordDate": "08/12/2024",
                    "paymentDate": "N/A",
                    "currency": " USD "
                }
            ]}}
        });

        let records = Dividends.map("VALE", &doc).unwrap();
        assert_eq!(
            records,
            vec![DividendRecord {
                symbol: "VALE".to_string(),
                ex_date: ymd(2024, 8, 12),
                payment_type: Some("Cash".to_string()),
                amount: Some(0.25),
                declaration_date: ymd(2024, 8, 1),
                record_date: ymd(2024, 8, 12),
                payment_date: None,
                currency: Some("USD".to_string()),
            }]
        );
    }

    #[test]
    fn malformed_row_is_skipped_not_fatal() {
        let doc = json!({
            "data": { "dividends": { "rows": [
                { "exOrEffDate": "05/10/2024", "type": "Cash", "amount": "$0.10" },
                { "exOrEffDate": "02/09/2024", "type": "Cash", "amount": 0.10 },
                "not even an object",
                { "exOrEffDate": "11/10/2023", "type": "Cash", "amount": "$0.09" }
            ]}}
        });

        let records = Dividends.map("KO", &doc).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ex_date, ymd(2024, 5, 10));
        assert_eq!(records[1].ex_date, ymd(2023, 11, 10));
        assert_eq!(records[1].amount, Some(0.09));
    }

    #[test]
    fn missing_rows_is_a_structure_error() {
        let doc = json!({ "data": { "dividends": null } });
        assert!(matches!(
            Dividends.map("ZZZZ", &doc),
            Err(FetchError::Structure(_))
        ));

        let doc = json!({ "data": null, "message": "Symbol not exists" });
        assert!(Dividends.map("ZZZZ", &doc).is_err());
    }

    #[test]
    fn empty_rows_is_not_an_error() {
        let doc = json!({ "data": { "dividends": { "rows": [] } } });
        assert!(Dividends.map("TSLA", &doc).unwrap().is_empty());
    }

    #[test]
    fn path() {
        assert_eq!(
            Dividends.path("AAPL"),
            "/quote/AAPL/dividends?assetclass=stocks"
        );
    }
}
