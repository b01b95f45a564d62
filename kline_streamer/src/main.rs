use std::{fs::File, io::BufReader};

use anyhow::Context;
use clap::Parser;
use kline_streamer::{
    build_ingestor,
    cli::{Cli, Commands},
    config::{Credentials, StreamConfig, load_dotenv},
    feed::{FeedClient, replay::replay},
    ingestor::RecentErrors,
    logging::init_logging,
};
use tracing::info;

/// Failures repeated in the end-of-run summary.
const RECENT_ERRORS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Before logging: .env may set RUST_LOG.
    load_dotenv();
    init_logging(cli.log_format)?;

    let config = StreamConfig::load(cli.config.as_deref())?;
    let mut ingestor = build_ingestor(&config, RecentErrors::new(RECENT_ERRORS))?;
    info!(
        output = %config.output_file().display(),
        window = config.indicator.window,
        mode = ?config.indicator.mode,
        "engine ready"
    );

    match cli.command {
        Commands::Stream => {
            let credentials = Credentials::from_env();
            let client = FeedClient::new(&config.feed.url).with_api_key(credentials.api_key);

            tokio::select! {
                result = client.run(&mut ingestor) => result?,
                _ = tokio::signal::ctrl_c() => info!("interrupted, shutting down"),
            }
        }

        Commands::Replay { input } => {
            let file = File::open(&input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            let delivered = replay(BufReader::new(file), &mut ingestor)?;
            info!(delivered, "replay complete");
        }
    }

    // Summary goes to stderr so stdout stays machine-readable.
    let stats = ingestor.stats();
    eprintln!(
        "SUMMARY: {} bars ingested, {} malformed, {} render faults",
        stats.accepted, stats.malformed, stats.render_faults
    );
    for error in ingestor.error_sink().entries() {
        eprintln!("  recent error: {error}");
    }
    if stats.accepted > 0 {
        println!("{}", config.output_file().display());
    }
    Ok(())
}
