//! Periodic cleanup of rendered artifacts.
//!
//! Deletes `<job-id>.png` files in the output directory once they are older
//! than the retention period. Any other file is left alone, since the
//! default output directory is the shared system temp dir.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use imagegen_core::job::JobId;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Artifacts whose modification time is older than this are deleted.
    pub max_age: Duration,
    /// How often the directory is scanned.
    pub interval: Duration,
}

/// Run the artifact retention loop until `cancel` is triggered.
pub async fn run(output_dir: PathBuf, policy: RetentionPolicy, cancel: CancellationToken) {
    tracing::info!(
        output_dir = %output_dir.display(),
        retention_secs = policy.max_age.as_secs(),
        interval_secs = policy.interval.as_secs(),
        "Artifact retention job started"
    );

    let mut interval = tokio::time::interval(policy.interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Artifact retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match purge_expired(&output_dir, policy.max_age).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Artifact retention: purged expired images");
                        } else {
                            tracing::debug!("Artifact retention: nothing to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Artifact retention: scan failed");
                    }
                }
            }
        }
    }
}

/// Delete artifacts in `dir` last modified more than `max_age` ago.
///
/// Returns the number of files removed. Failure to remove a single file is
/// logged and skipped. A `max_age` reaching past the representable date
/// range removes nothing.
pub async fn purge_expired(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let Some(cutoff) = chrono::Duration::from_std(max_age)
        .ok()
        .and_then(|age| Utc::now().checked_sub_signed(age))
    else {
        return Ok(0);
    };

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut deleted = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if JobId::from_file_name(name).is_none() {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let modified: DateTime<Utc> = match metadata.modified() {
            Ok(t) => t.into(),
            Err(_) => continue,
        };
        if modified >= cutoff {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => deleted += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(file = name, error = %e, "Artifact retention: failed to delete");
            }
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn write_aged(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[tokio::test]
    async fn removes_only_expired_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_aged(dir.path(), &JobId::new().file_name(), 2 * HOUR);
        let fresh = write_aged(dir.path(), &JobId::new().file_name(), Duration::ZERO);

        let deleted = purge_expired(dir.path(), HOUR).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn leaves_unrelated_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let notes = write_aged(dir.path(), "notes.txt", 48 * HOUR);
        let foreign_png = write_aged(dir.path(), "holiday.png", 48 * HOUR);

        assert_eq!(purge_expired(dir.path(), HOUR).await.unwrap(), 0);
        assert!(notes.exists());
        assert!(foreign_png.exists());
    }

    #[tokio::test]
    async fn huge_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_aged(dir.path(), &JobId::new().file_name(), 48 * HOUR);

        // Converts to a chrono duration but lies beyond the supported dates.
        let beyond_calendar = Duration::from_secs(i64::MAX as u64 / 1000);
        assert_eq!(purge_expired(dir.path(), beyond_calendar).await.unwrap(), 0);
        assert_eq!(purge_expired(dir.path(), Duration::MAX).await.unwrap(), 0);
        assert!(old.exists());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(purge_expired(&dir.path().join("gone"), HOUR).await.is_err());
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let policy = RetentionPolicy {
            max_age: HOUR,
            interval: Duration::from_millis(10),
        };
        let handle = tokio::spawn(run(dir.path().to_path_buf(), policy, cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("retention task did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn run_purges_on_first_tick() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_aged(dir.path(), &JobId::new().file_name(), 2 * HOUR);
        let cancel = CancellationToken::new();
        let policy = RetentionPolicy {
            max_age: HOUR,
            interval: Duration::from_secs(3600),
        };
        let handle = tokio::spawn(run(dir.path().to_path_buf(), policy, cancel.clone()));

        for _ in 0..200 {
            if !old.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!old.exists());

        cancel.cancel();
        handle.await.unwrap();
    }
}
