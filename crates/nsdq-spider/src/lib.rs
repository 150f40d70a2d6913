pub mod batch;
pub mod db;
pub mod nasdaq;
pub mod normalize;
pub mod pipeline;
pub mod seed;
pub mod sql;
pub mod tui;
pub mod writer;

/// Shortcut for required API elements.
pub mod http {
    pub use deadpool_postgres::Pool;
    pub use dotenv::var;
    pub use reqwest::Client as HttpClient;
    pub use tokio_postgres::Client as PgClient;
}

/// Highlighted elapsed time, for the tail of a log line.
pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!(
        "\x1b[38;5;208melapsed time: {} ms\x1b[0m",
        time.elapsed().as_millis()
    )
}
