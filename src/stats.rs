//! Per-video statistics lookups.

use anyhow::Result;
use futures::future::join_all;

use crate::api::VideoApi;
use crate::models::VideoStatRecord;
use crate::retry::{RetryPolicy, retry};

/// Fetches statistics and snippet of one video, retrying transient failures.
/// A video the platform no longer returns resolves to `Ok(None)`.
pub async fn fetch_video_stats<A: VideoApi>(
    api: &A,
    video_id: &str,
    policy: &RetryPolicy,
) -> Result<Option<VideoStatRecord>> {
    let label = format!("statistics for {video_id}");
    retry(policy, &label, || api.video_stats(video_id)).await
}

/// Fetches every id concurrently and returns the results in input order.
/// Fails with the first error (in input order) once all lookups finished.
pub async fn fetch_all_stats<A: VideoApi>(
    api: &A,
    video_ids: &[String],
    policy: &RetryPolicy,
) -> Result<Vec<Option<VideoStatRecord>>> {
    let lookups = video_ids
        .iter()
        .map(|video_id| fetch_video_stats(api, video_id, policy));
    join_all(lookups).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeApi, sample_record};

    #[tokio::test]
    async fn fetch_video_stats_returns_record() {
        let api = FakeApi::with_videos(1);
        let record = fetch_video_stats(&api, "vid0000", &RetryPolicy::immediate(1))
            .await
            .unwrap();
        assert_eq!(record, Some(sample_record("vid0000")));
    }

    #[tokio::test]
    async fn fetch_video_stats_missing_video_is_none() {
        let api = FakeApi::with_videos(1).missing("gone");
        let record = fetch_video_stats(&api, "gone", &RetryPolicy::immediate(3))
            .await
            .unwrap();
        assert!(record.is_none());
        assert_eq!(api.stat_calls.get(), 1);
    }

    #[tokio::test]
    async fn fetch_video_stats_retries_transient_errors() {
        let api = FakeApi::with_videos(1).failing_stats("vid0000", 2);
        let record = fetch_video_stats(&api, "vid0000", &RetryPolicy::immediate(3))
            .await
            .unwrap();
        assert!(record.is_some());
        assert_eq!(api.stat_calls.get(), 3);
    }

    #[tokio::test]
    async fn fetch_all_stats_keeps_input_order() {
        let api = FakeApi::with_videos(3).missing("b");
        let ids = vec!["c".to_string(), "b".to_string(), "a".to_string()];
        let records = fetch_all_stats(&api, &ids, &RetryPolicy::immediate(1))
            .await
            .unwrap();
        let ids: Vec<_> = records
            .iter()
            .map(|record| record.as_ref().map(|record| record.id.as_str()))
            .collect();
        assert_eq!(ids, vec![Some("c"), None, Some("a")]);
    }

    #[tokio::test]
    async fn fetch_all_stats_propagates_exhausted_lookup() {
        let api = FakeApi::with_videos(2).failing_stats("bad", 10);
        let ids = vec!["ok".to_string(), "bad".to_string()];
        let err = fetch_all_stats(&api, &ids, &RetryPolicy::immediate(2))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("statistics for bad"));
    }

    #[tokio::test]
    async fn fetch_all_stats_with_no_ids_makes_no_calls() {
        let api = FakeApi::with_videos(0);
        let records = fetch_all_stats(&api, &[], &RetryPolicy::immediate(1))
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(api.stat_calls.get(), 0);
    }
}
