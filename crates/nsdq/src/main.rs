mod cli;
mod spider;

// remote imports
use clap::Parser;
use cli::{Cli, TraceLevel};
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// set the trace level
fn preprocess(trace_level: Level) -> anyhow::Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        })?;
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    spider::run(cli.command, cli.batch_size, tui).await
}
