//! Channel listing: walks the search endpoint page by page.

use anyhow::Result;
use log::debug;
use std::collections::HashSet;

use crate::api::VideoApi;
use crate::models::VideoRef;
use crate::retry::{RetryPolicy, retry};

/// Returns every video id of `channel_id`, following continuation tokens
/// until the API stops handing one out. Each page is retried on its own; a
/// page that exhausts its retries fails the whole listing.
pub async fn list_channel_videos<A: VideoApi>(
    api: &A,
    channel_id: &str,
    policy: &RetryPolicy,
) -> Result<Vec<VideoRef>> {
    let mut videos = Vec::new();
    let mut seen = HashSet::new();
    let mut page_token: Option<String> = None;
    let mut page_number = 0usize;

    loop {
        page_number += 1;
        let label = format!("listing page {page_number} of {channel_id}");
        let token = page_token.as_deref();
        let page = retry(policy, &label, || api.search_videos(channel_id, token)).await?;

        debug!("{label}: {} video(s)", page.videos.len());
        for video in page.videos {
            if seen.insert(video.id.clone()) {
                videos.push(video);
            }
        }

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    Ok(videos)
}
