use crate::http::*;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Cash, stock & special dividend history.
pub mod dividends;

/// Institutional ownership summary & position activity.
pub mod holdings;

/// Company name, exchange and listing flags; used to seed `tickers`.
pub mod info;

/// The quote summary panel (sector, targets, volumes, ratios, dividend yield).
pub mod summary;

pub use dividends::{DividendRecord, Dividends};
pub use holdings::{Holdings, InstitutionalHoldingRecord, Position, PositionCount, Positions};
pub use info::{Info, TickerRecord};
pub use summary::{MetadataRecord, Summary};

pub const BASE_URL: &str = "https://api.nasdaq.com/api";

// the API refuses anything that does not look like a browser
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Why a ticker produced no data. Every variant marks the ticker as invalid for the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed, error({0})")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("response was not valid JSON, error({0})")]
    Decode(#[source] reqwest::Error),

    #[error("response is missing `{0}`")]
    Structure(String),

    #[error("`{0}` cannot be used as a path segment")]
    Symbol(String),
}

/// Symbols are pasted into the request path, so anything that would end or split the segment
/// (`/`, `?`, `#`, `%`, whitespace) is refused.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#' | '%')
        })
}

/// One data category of the quote API.
///
/// An endpoint knows where to find a ticker's document and how to turn that document into
/// records. `map` only fails when the document is missing the structure the category needs;
/// individual rows that cannot be mapped are logged and dropped.
pub trait Endpoint: Sync {
    type Record: Send;

    /// Used in logs.
    const NAME: &'static str;

    /// Path relative to the API base, e.g. `/quote/AAPL/dividends?assetclass=stocks`.
    fn path(&self, ticker: &str) -> String;

    fn map(&self, ticker: &str, json: &Value) -> Result<Vec<Self::Record>, FetchError>;
}

/// Thin wrapper around [`reqwest::Client`] with the headers and timeouts the API expects.
#[derive(Clone, Debug)]
pub struct NasdaqClient {
    http: HttpClient,
    base_url: String,
}

impl NasdaqClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::ClientBuilder::new()
            .user_agent(user_agent)
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `NSDQ_API_URL` and `USER_AGENT` override the defaults when set.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = var("NSDQ_API_URL").unwrap_or_else(|_| BASE_URL.to_string());
        let user_agent = var("USER_AGENT").unwrap_or_else(|_| USER_AGENT.to_string());
        Self::new(base_url, &user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET one ticker's document for `endpoint` and map it to records.
    pub async fn fetch<E: Endpoint>(
        &self,
        endpoint: &E,
        ticker: &str,
    ) -> Result<Vec<E::Record>, FetchError> {
        if !is_valid_symbol(ticker) {
            return Err(FetchError::Symbol(ticker.to_string()));
        }

        let url = format!("{}{}", self.base_url, endpoint.path(ticker));
        trace!("fetching {} for [{ticker}] from {url}", E::NAME);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let json: Value = response.json().await.map_err(FetchError::Decode)?;
        let records = endpoint.map(ticker, &json)?;

        debug!("{} {} record(s) mapped for [{ticker}]", records.len(), E::NAME);
        Ok(records)
    }
}

/// Follow a JSON pointer, treating `null` the same as absent.
pub(crate) fn require<'a>(json: &'a Value, pointer: &str) -> Result<&'a Value, FetchError> {
    match json.pointer(pointer) {
        Some(Value::Null) | None => Err(FetchError::Structure(pointer.to_string())),
        Some(value) => Ok(value),
    }
}

/// Like [`require`], but the target must be an array.
pub(crate) fn require_rows<'a>(
    json: &'a Value,
    pointer: &str,
) -> Result<&'a Vec<Value>, FetchError> {
    require(json, pointer)?
        .as_array()
        .ok_or_else(|| FetchError::Structure(pointer.to_string()))
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
