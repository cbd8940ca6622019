//! The seam between the collector and the video platform.
//!
//! Stages only talk to [`VideoApi`]; the production implementation lives in
//! [`crate::youtube`], tests use the in-memory fake below.

use anyhow::Result;
use std::future::Future;

use crate::models::{SearchPage, VideoStatRecord};

/// Number of results requested per listing page.
pub const PAGE_SIZE: u32 = 50;

pub trait VideoApi {
    /// Fetches one page of the channel's videos. `page_token` is `None` for
    /// the first page.
    fn search_videos(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<SearchPage>>;

    /// Looks up statistics and snippet of one video. `Ok(None)` when the
    /// platform returns no item (deleted or private video).
    fn video_stats(&self, video_id: &str) -> impl Future<Output = Result<Option<VideoStatRecord>>>;
}
