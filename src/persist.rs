//! Writes snapshots to disk: a rolling "latest" file plus one archive file
//! per UTC day.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::FormattedSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub latest: PathBuf,
    pub archive_dir: PathBuf,
}

impl SnapshotPaths {
    /// `<archive_dir>/YYYY-MM-DD.json`. Reruns on the same day overwrite it.
    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.archive_dir
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }
}

/// Where one snapshot ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSnapshot {
    pub latest: PathBuf,
    pub archive: PathBuf,
    pub bytes: usize,
}

/// Serializes `snapshot` once and writes the same bytes to the latest and
/// archive paths concurrently. Both writes run to completion; if either
/// fails the first error is returned and the other file is left as written.
pub async fn persist_snapshot(
    snapshot: &FormattedSnapshot,
    paths: &SnapshotPaths,
    now: DateTime<Utc>,
) -> Result<PersistedSnapshot> {
    let payload = render_json(snapshot)?;
    let archive = paths.archive_path(now.date_naive());

    let (latest_written, archive_written) = tokio::join!(
        write_atomic(&paths.latest, &payload),
        write_atomic(&archive, &payload)
    );
    latest_written?;
    archive_written?;

    info!(
        "Wrote {} video(s) to {} and {}",
        snapshot.len(),
        paths.latest.display(),
        archive.display()
    );

    Ok(PersistedSnapshot {
        latest: paths.latest.clone(),
        archive,
        bytes: payload.len(),
    })
}

fn render_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).context("serializing snapshot")
}

async fn write_atomic(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload)
        .await
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("moving {} into place", path.display()))?;
    Ok(())
}
