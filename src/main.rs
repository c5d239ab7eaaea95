mod cli;

use clap::Parser;
use cli::Cli;
use goldtbot::bot;
use goldtbot::config::Config;
use goldtbot::observability::{LogLevel, init_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let level: LogLevel = cli.loglevel.parse()?;
    init_logging(level, cli.logfile.as_deref())?;

    let config = Config::load(cli.config_file.as_deref(), &cli.overrides()).inspect_err(|e| {
        tracing::error!(error = %e, "Startup failed");
    })?;

    bot::run(config, cli.subreddit).await.inspect_err(|e| {
        tracing::error!(error = %e, "Bot stopped");
    })?;

    Ok(())
}
