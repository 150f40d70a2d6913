use super::{require, Endpoint, FetchError};
use crate::normalize::{date_field, numeric_field, string_field};
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

pub struct Summary;

impl Endpoint for Summary {
    type Record = MetadataRecord;
    const NAME: &'static str = "metadata";

    fn path(&self, ticker: &str) -> String {
        format!("/quote/{ticker}/summary?assetclass=stocks")
    }

    fn map(&self, ticker: &str, json: &Value) -> Result<Vec<MetadataRecord>, FetchError> {
        let summary = require(json, "/data/summaryData")?;

        // the panel is a single row; a malformed panel drops the row but is not a structure error
        match SummaryData::deserialize(summary) {
            Ok(data) => Ok(vec![data.into_record(ticker)]),
            Err(err) => {
                warn!("skipping summary data for [{ticker}], error({err})");
                Ok(vec![])
            }
        }
    }
}

// output
// ----------------------------------------------------------------------------

/// One row of `metadata`; a snapshot of the quote summary panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataRecord {
    pub symbol: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub one_year_target: Option<f64>,
    pub today_high_low: Option<String>,
    pub share_volume: Option<i64>,
    pub average_volume: Option<i64>,
    pub previous_close: Option<f64>,
    pub fifty_two_week_high_low: Option<String>,
    pub market_cap: Option<i64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub annualized_dividend: Option<f64>,
    pub ex_dividend_date: Option<NaiveDate>,
    pub dividend_payment_date: Option<NaiveDate>,
    pub current_yield: Option<f64>,
    pub beta: Option<f64>,
    pub special_dividend_date: Option<NaiveDate>,
    pub special_dividend_amount: Option<f64>,
    pub special_dividend_payment_date: Option<NaiveDate>,
}

// input
// ----------------------------------------------------------------------------
//
//  {
//      "data": {
//          "symbol": "AAPL",
//          "summaryData": {
//              "Exchange": { "label": "Exchange", "value": "NASDAQ-GS" },
//              "OneYrTarget": { "label": "1 Year Target", "value": "$250.00" },
//              "ShareVolume": { "label": "Share Volume", "value": "44,507,452" },
//              "Yield": { "label": "Current Yield", "value": "0.44%" },
//              "ExDividendDate": { "label": "Ex Dividend Date", "value": "Aug 12, 2024" },
//              ...
//          }
//      }
//  }
#[derive(Debug, Deserialize)]
struct Field {
    #[serde(default, deserialize_with = "text")]
    value: Option<String>,
}

// some values (e.g. "PERatio") arrive as bare numbers
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!("unexpected summary value {other}"))),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryData {
    #[serde(rename = "Exchange")]
    exchange: Option<Field>,
    #[serde(rename = "Sector")]
    sector: Option<Field>,
    #[serde(rename = "Industry")]
    industry: Option<Field>,
    #[serde(rename = "OneYrTarget")]
    one_year_target: Option<Field>,
    #[serde(rename = "TodayHighLow")]
    today_high_low: Option<Field>,
    #[serde(rename = "ShareVolume")]
    share_volume: Option<Field>,
    #[serde(rename = "AverageVolume")]
    average_volume: Option<Field>,
    #[serde(rename = "PreviousClose")]
    previous_close: Option<Field>,
    // sic
    #[serde(rename = "FiftTwoWeekHighLow")]
    fifty_two_week_high_low: Option<Field>,
    #[serde(rename = "MarketCap")]
    market_cap: Option<Field>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<Field>,
    #[serde(rename = "ForwardPE1Yr")]
    forward_pe: Option<Field>,
    #[serde(rename = "EarningsPerShare")]
    earnings_per_share: Option<Field>,
    #[serde(rename = "AnnualizedDividend")]
    annualized_dividend: Option<Field>,
    #[serde(rename = "ExDividendDate")]
    ex_dividend_date: Option<Field>,
    #[serde(rename = "DividendPaymentDate")]
    dividend_payment_date: Option<Field>,
    #[serde(rename = "Yield")]
    current_yield: Option<Field>,
    #[serde(rename = "Beta")]
    beta: Option<Field>,
    #[serde(rename = "SpecialDividendDate")]
    special_dividend_date: Option<Field>,
    #[serde(rename = "SpecialDividendAmount")]
    special_dividend_amount: Option<Field>,
    #[serde(rename = "SpecialDividendPaymentDate")]
    special_dividend_payment_date: Option<Field>,
}

#[inline]
fn value(field: &Option<Field>) -> Option<&str> {
    field.as_ref().and_then(|f| f.value.as_deref())
}

impl SummaryData {
    fn into_record(self, ticker: &str) -> MetadataRecord {
        let decimal = |f: &Option<Field>| numeric_field(value(f)).map(|n| n.as_f64());
        let count = |f: &Option<Field>| numeric_field(value(f)).map(|n| n.as_i64());

        MetadataRecord {
            symbol: ticker.to_string(),
            exchange: string_field(value(&self.exchange)),
            sector: string_field(value(&self.sector)),
            industry: string_field(value(&self.industry)),
            one_year_target: decimal(&self.one_year_target),
            today_high_low: string_field(value(&self.today_high_low)),
            share_volume: count(&self.share_volume),
            average_volume: count(&self.average_volume),
            previous_close: decimal(&self.previous_close),
            fifty_two_week_high_low: string_field(value(&self.fifty_two_week_high_low)),
            market_cap: count(&self.market_cap),
            pe_ratio: decimal(&self.pe_ratio),
            forward_pe: decimal(&self.forward_pe),
            earnings_per_share: decimal(&self.earnings_per_share),
            annualized_dividend: decimal(&self.annualized_dividend),
            ex_dividend_date: date_field(value(&self.ex_dividend_date)),
            dividend_payment_date: date_field(value(&self.dividend_payment_date)),
            current_yield: decimal(&self.current_yield),
            beta: decimal(&self.beta),
            special_dividend_date: date_field(value(&self.special_dividend_date)),
            special_dividend_amount: decimal(&self.special_dividend_amount),
            special_dividend_payment_date: date_field(value(&self.special_dividend_payment_date)),
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
    fn maps_summary_panel() {
        let doc = json!({
            "data": { "symbol": "AAPL", "summaryData": {
                "Exchange": { "label": "Exchange", "value": "NASDAQ-GS" },
                "Sector": { "label": "Sector", "value": "Technology" },
                "Industry": { "label": "Industry", "value": "Computer Manufacturing" },
                "OneYrTarget": { "label": "1 Year Target", "value": "$250.00" },
                "TodayHighLow": { "label": "Today's High/Low", "value": "$226.03/$223.22" },
                "ShareVolume": { "label": "Share Volume", "value": "44,507,452" },
                "AverageVolume": { "label": "Average Volume", "value": "52,376,128" },
                "PreviousClose": { "label": "Previous Close", "value": "$224.53" },
                "FiftTwoWeekHighLow": { "label": "52 Week High/Low", "value": "$237.23/$164.08" },
                "MarketCap": { "label": "Market Cap", "value": "3,412,548,329,120" },
                "PERatio": { "label": "P/E Ratio", "value": 34.1 },
                "ForwardPE1Yr": { "label": "Forward P/E 1 Yr.", "value": "30.19" },
                "EarningsPerShare": { "label": "Earnings Per Share(EPS)", "value": "$6.57" },
                "AnnualizedDividend": { "label": "Annualized Dividend", "value": "$1.00" },
                "ExDividendDate": { "label": "Ex Dividend Date", "value": "Aug 12, 2024" },
                "DividendPaymentDate": { "label": "Dividend Pay Date", "value": "Aug 15, 2024" },
                "Yield": { "label": "Current Yield", "value": "0.44%" },
                "Beta": { "label": "Beta", "value": "N/A" }
            }}
        });

        let records = Summary.map("AAPL", &doc).unwrap();
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.industry.as_deref(), Some("Computer Manufacturing"));
        assert_eq!(r.today_high_low.as_deref(), Some("$226.03/$223.22"));
        assert_eq!(r.previous_close, Some(224.53));
        assert_eq!(r.pe_ratio, Some(34.1));
        assert_eq!(r.forward_pe, Some(30.19));
        assert_eq!(r.earnings_per_share, Some(6.57));
        assert_eq!(r.dividend_payment_date, NaiveDate::from_ymd_opt(2024, 8, 15));
    }

    #[test]
    fn malformed_panel_drops_the_row() {
        let doc = json!({
            "data": { "summaryData": {
                "Exchange": { "label": "Exchange", "value": ["NASDAQ-GS"] }
            }}
        });
        assert!(Summary.map("AAPL", &doc).unwrap().is_empty());
    }

    #[test]
    fn maps_well_formed_panel() {
        let doc = json!({
            "data": { "summaryData": {
                "Exchange": { "label": "Exchange", "value": "NASDAQ-GS" },
                "OneYrTarget": { "label": "1 Year Target", "value": "$250.00" },
                "ShareVolume": { "label": "Share Volume", "value": "44,507,452" },
                "MarketCap": { "label": "Market Cap", "value": "3,412,548,329,120" },
                "ExDividendDate": { "label": "Ex Dividend Date", "value": "Aug 12, 2024" },
                "Yield": { "label": "Current Yield", "value": "0.44%" },
                "Beta": { "label": "Beta", "value": "N/A" },
                "SpecialDividendAmount": { "label": "Special Dividend Amount", "value": "" },
                "SomethingNew": { "label": "Ignored", "value": "?" }
            }}
        });

        let records = Summary.map("AAPL", &doc).unwrap();
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.symbol, "AAPL");
        assert_eq!(r.exchange.as_deref(), Some("NASDAQ-GS"));
        assert_eq!(r.sector, None);
        assert_eq!(r.one_year_target, Some(250.0));
        assert_eq!(r.share_volume, Some(44_507_452));
        assert_eq!(r.market_cap, Some(3_412_548_329_120));
        assert_eq!(r.ex_dividend_date, NaiveDate::from_ymd_opt(2024, 8, 12));
        assert_eq!(r.current_yield, Some(0.44));
        assert_eq!(r.beta, None);
        assert_eq!(r.special_dividend_amount, None);
    }

    #[test]
    fn missing_panel_is_a_structure_error() {
        let doc = json!({ "data": { "symbol": "AAPL" } });
        assert!(matches!(
            Summary.map("AAPL", &doc),
            Err(FetchError::Structure(_))
        ));
    }
}
