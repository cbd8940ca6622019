#![forbid(unsafe_code)]

//! One collector run: list the channel, fetch statistics, write the snapshot.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::path::PathBuf;

use crate::api::VideoApi;
use crate::config::CollectorConfig;
use crate::formatter::format_snapshot;
use crate::lister::list_channel_videos;
use crate::persist::persist_snapshot;
use crate::reconcile::{reconcile_listing, reconcile_stats};
use crate::stats::fetch_all_stats;

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub listed: usize,
    pub listing_passes: usize,
    pub listing_converged: bool,
    pub stats_attempts: usize,
    pub dropped: Vec<String>,
    pub snapshot_size: usize,
    pub latest_path: PathBuf,
    pub archive_path: PathBuf,
}

pub struct Collector<A> {
    api: A,
    config: CollectorConfig,
}

impl<A: VideoApi> Collector<A> {
    pub fn new(api: A, config: CollectorConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// list → reconcile → fetch stats → reconcile → format → persist.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let config = &self.config;
        let channel_id = config.channel_id.as_str();

        info!("Listing videos for channel {channel_id}");
        let listing = reconcile_listing(config.listing_extra_passes, || {
            list_channel_videos(&self.api, channel_id, &config.retry)
        })
        .await
        .with_context(|| format!("listing videos for channel {channel_id}"))?;
        info!(
            "Found {} video(s) after {} listing pass(es)",
            listing.videos.len(),
            listing.passes
        );

        let video_ids: Vec<String> = listing.videos.into_iter().map(|video| video.id).collect();

        info!("Fetching statistics for {} video(s)", video_ids.len());
        let stats = reconcile_stats(&video_ids, config.fetch_attempts, || {
            fetch_all_stats(&self.api, &video_ids, &config.retry)
        })
        .await
        .context("fetching video statistics")?;

        let snapshot = format_snapshot(&stats.records);
        info!("Formatted {} video(s)", snapshot.len());

        let written = persist_snapshot(&snapshot, &config.output, now)
            .await
            .context("persisting snapshot")?;

        Ok(RunSummary {
            listed: video_ids.len(),
            listing_passes: listing.passes,
            listing_converged: listing.converged,
            stats_attempts: stats.attempts,
            dropped: stats.missing,
            snapshot_size: snapshot.len(),
            latest_path: written.latest,
            archive_path: written.archive,
        })
    }
}
