use super::{require, Endpoint, FetchError};
use crate::normalize::{normalize_flag, string_field};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

pub struct Info;

impl Endpoint for Info {
    type Record = TickerRecord;
    const NAME: &'static str = "info";

    fn path(&self, ticker: &str) -> String {
        format!("/quote/{ticker}/info?assetclass=stocks")
    }

    fn map(&self, ticker: &str, json: &Value) -> Result<Vec<TickerRecord>, FetchError> {
        let data = require(json, "/data")?;
        require(data, "/symbol")?;

        match InfoData::deserialize(data) {
            Ok(info) => Ok(vec![info.into_record(ticker)]),
            Err(err) => {
                warn!("skipping info for [{ticker}], error({err})");
                Ok(vec![])
            }
        }
    }
}

// output
// ----------------------------------------------------------------------------

/// One row of `tickers`. The requested symbol is the key, so that every later scrape joins
/// against the same spelling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickerRecord {
    pub symbol: String,
    pub company_name: Option<String>,
    pub stock_type: Option<String>,
    pub exchange: Option<String>,
    pub asset_class: Option<String>,
    pub is_nasdaq_listed: Option<bool>,
    pub is_nasdaq100: Option<bool>,
    pub is_held: Option<bool>,
}

// input
// ----------------------------------------------------------------------------
//
//  {
//      "data": {
//          "symbol": "AAPL",
//          "companyName": "Apple Inc. Common Stock",
//          "stockType": "Common Stock",
//          "exchange": "NASDAQ-GS",
//          "isNasdaqListed": true,
//          "isNasdaq100": true,
//          "isHeld": false,
//          "assetClass": "STOCKS",
//          "primaryData": { ... },
//          ...
//      }
//  }
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoData {
    company_name: Option<String>,
    stock_type: Option<String>,
    exchange: Option<String>,
    asset_class: Option<String>,
    #[serde(default)]
    is_nasdaq_listed: Value,
    #[serde(default)]
    is_nasdaq100: Value,
    #[serde(default)]
    is_held: Value,
}

impl InfoData {
    fn into_record(self, ticker: &str) -> TickerRecord {
        TickerRecord {
            symbol: ticker.to_string(),
            company_name: string_field(self.company_name.as_deref()),
            stock_type: string_field(self.stock_type.as_deref()),
            exchange: string_field(self.exchange.as_deref()),
            asset_class: string_field(self.asset_class.as_deref()),
            is_nasdaq_listed: normalize_flag(&self.is_nasdaq_listed),
            is_nasdaq100: normalize_flag(&self.is_nasdaq100),
            is_held: normalize_flag(&self.is_held),
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

    #[test]
    fn maps_info() {
        let doc = json!({
            "data": {
                "symbol": "AAPL",
                "companyName": "Apple Inc. Common Stock",
                "stockType": "Common Stock",
                "exchange": "NASDAQ-GS",
                "isNasdaqListed": true,
                "isNasdaq100": "Yes",
                "assetClass": "STOCKS"
            }
        });

        assert_eq!(
            Info.map("AAPL", &doc).unwrap(),
            vec![TickerRecord {
                symbol: "AAPL".to_string(),
                company_name: Some("Apple Inc. Common Stock".to_string()),
                stock_type: Some("Common Stock".to_string()),
                exchange: Some("NASDAQ-GS".to_string()),
                asset_class: Some("STOCKS".to_string()),
                is_nasdaq_listed: Some(true),
                is_nasdaq100: Some(true),
                is_held: None,
            }]
        );
    }

    #[test]
    fn unknown_symbol_is_a_structure_error() {
        let doc = json!({
            "data": null,
            "message": null,
            "status": { "rCode": 400, "bCodeMessage": [{ "code": 1001, "errorMessage": "Symbol not exists" }] }
        });
        assert!(matches!(Info.map("ZZZZ", &doc), Err(FetchError::Structure(_))));
    }
}
