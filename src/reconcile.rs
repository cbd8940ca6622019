//! Compensates for the listing endpoint's read-after-write inconsistency.
//!
//! The search endpoint can under-report a channel's uploads on any single
//! call, so the listing is repeated until two passes agree on a count. The
//! stats batch is repeated too, but only a bounded number of times: videos
//! that keep coming back empty are dropped from the expected set.

use anyhow::Result;
use log::{info, warn};
use std::future::Future;
use std::iter;

use crate::models::{VideoRef, VideoStatRecord};

/// Outcome of [`reconcile_listing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingReconciliation {
    pub videos: Vec<VideoRef>,
    pub passes: usize,
    /// `false` when the extra passes ran out before any count repeated.
    pub converged: bool,
}

/// Runs two full listing passes and accepts the first when their counts
/// match. Otherwise runs up to `extra_passes` more, keeping the largest extra
/// result, and stops as soon as that count equals one of the first two.
/// Without convergence the largest result of all passes wins.
pub async fn reconcile_listing<F, Fut>(
    extra_passes: usize,
    mut list: F,
) -> Result<ListingReconciliation>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<VideoRef>>>,
{
    let first = list().await?;
    let second = list().await?;
    let mut passes = 2;

    if first.len() == second.len() {
        info!("Listing passes agree on {} video(s)", first.len());
        return Ok(ListingReconciliation {
            videos: first,
            passes,
            converged: true,
        });
    }

    warn!(
        "Listing passes disagree ({} vs {} video(s)); re-listing up to {} more time(s)",
        first.len(),
        second.len(),
        extra_passes
    );

    let mut best: Option<Vec<VideoRef>> = None;
    for _ in 0..extra_passes {
        let videos = list().await?;
        passes += 1;
        info!("Listing pass {passes} returned {} video(s)", videos.len());
        if best.as_ref().is_none_or(|best| videos.len() > best.len()) {
            best = Some(videos);
        }
        let best_len = best.as_ref().map_or(0, Vec::len);
        if best_len == first.len() || best_len == second.len() {
            return Ok(ListingReconciliation {
                videos: best.take().unwrap_or_default(),
                passes,
                converged: true,
            });
        }
    }

    let mut candidates = vec![first, second];
    candidates.extend(best);
    let videos = candidates
        .into_iter()
        .reduce(|largest, candidate| {
            if candidate.len() > largest.len() {
                candidate
            } else {
                largest
            }
        })
        .unwrap_or_default();
    warn!(
        "Listing never converged after {passes} passes; keeping the largest result ({} video(s))",
        videos.len()
    );
    Ok(ListingReconciliation {
        videos,
        passes,
        converged: false,
    })
}

/// Outcome of [`reconcile_stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReconciliation {
    /// Results of the accepted attempt, in input order.
    pub records: Vec<Option<VideoStatRecord>>,
    pub attempts: usize,
    /// Ids still absent after the last attempt; dropped from the snapshot.
    pub missing: Vec<String>,
}

/// Repeats `fetch` (one full stats batch over `video_ids`) until every id
/// yields a record, at most `max_attempts` times. After that the ids that
/// stayed absent are reported in `missing` and the last attempt is accepted
/// as is.
pub async fn reconcile_stats<F, Fut>(
    video_ids: &[String],
    max_attempts: usize,
    mut fetch: F,
) -> Result<StatsReconciliation>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<Option<VideoStatRecord>>>>,
{
    if video_ids.is_empty() {
        return Ok(StatsReconciliation {
            records: Vec::new(),
            attempts: 0,
            missing: Vec::new(),
        });
    }

    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let records = fetch().await?;
        let present = records.iter().flatten().count();
        if present == video_ids.len() {
            return Ok(StatsReconciliation {
                records,
                attempts,
                missing: Vec::new(),
            });
        }

        if attempts >= max_attempts {
            let missing: Vec<String> = video_ids
                .iter()
                .zip(records.iter().map(Option::is_some).chain(iter::repeat(false)))
                .filter(|(_, found)| !found)
                .map(|(id, _)| id.clone())
                .collect();
            warn!(
                "Statistics still missing for {} video(s) after {attempts} attempt(s); \
                 dropping: {}",
                missing.len(),
                missing.join(", ")
            );
            return Ok(StatsReconciliation {
                records,
                attempts,
                missing,
            });
        }

        warn!(
            "Statistics returned for {present} of {} video(s); fetching again ({}/{max_attempts})",
            video_ids.len(),
            attempts + 1
        );
    }
}
