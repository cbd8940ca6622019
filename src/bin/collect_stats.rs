#![forbid(unsafe_code)]

//! One-shot collector meant to be started by cron or a systemd timer. Reads
//! `YOUTUBE_API_KEY` and `YOUTUBE_CHANNEL_ID` from the environment or `.env`,
//! then writes the channel's statistics snapshot.

use anyhow::{Context, Result};
use channel_stats::collector::Collector;
use channel_stats::config::load_collector_config;
use channel_stats::youtube::YouTubeClient;
use chrono::Utc;
use env_logger::Env;
use log::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_collector_config().context("loading configuration")?;
    info!("Channel: {}", config.channel_id);
    info!("Latest snapshot: {}", config.output.latest.display());
    info!("Archive directory: {}", config.output.archive_dir.display());

    let client = YouTubeClient::from_config(&config);
    let collector = Collector::new(client, config);
    let summary = collector.run(Utc::now()).await?;

    if !summary.listing_converged {
        warn!(
            "Listing counts never agreed; snapshot may be missing videos ({} listed)",
            summary.listed
        );
    }
    if !summary.dropped.is_empty() {
        warn!(
            "{} video(s) returned no statistics and were left out",
            summary.dropped.len()
        );
    }
    info!(
        "Collected {} of {} video(s) into {} and {}",
        summary.snapshot_size,
        summary.listed,
        summary.latest_path.display(),
        summary.archive_path.display()
    );

    Ok(())
}
