use anyhow::Result;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::parse_cli;

mod cli;
mod config;
mod dump;
mod error;
mod notify;
mod pipeline;
mod progress;
mod storage;
#[cfg(test)]
mod testing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let options = parse_cli();

    // RUST_LOG wins over --silent.
    let default_level = if options.silent { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(&options)?;
    debug!("{config:?}");

    pipeline::run(&config).await?;
    Ok(())
}
