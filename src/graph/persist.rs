//! Link graph persistence
//!
//! Snapshots are full rewrites of the state file, written to a sibling
//! temporary file and renamed into place so a crash mid-write leaves the
//! previous snapshot intact.

use crate::graph::LinkGraph;
use crate::{CrawlError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;

/// Writes a serialized graph snapshot atomically (write to temp, then rename)
pub async fn write_snapshot(path: &Path, json: &str) -> Result<()> {
    let write_err = |source: std::io::Error| CrawlError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp = temp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
    file.write_all(json.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;
    drop(file);

    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}

/// Loads a persisted graph
pub fn load_graph(path: &Path) -> Result<LinkGraph> {
    let content = std::fs::read_to_string(path)?;
    Ok(LinkGraph::from_json(&content)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Debounce state for graph snapshots
///
/// At most one snapshot write is in flight; a new one starts only when the
/// graph is dirty and `interval` has passed since the previous one started.
#[derive(Debug)]
pub struct SnapshotSchedule {
    interval: Duration,
    last_started: Option<Instant>,
    in_flight: bool,
}

impl SnapshotSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_started: None,
            in_flight: false,
        }
    }

    /// Whether a snapshot should be started now
    pub fn is_due(&self, dirty: bool, now: Instant) -> bool {
        if !dirty || self.in_flight {
            return false;
        }

        match self.last_started {
            Some(started) => now.duration_since(started) >= self.interval,
            None => true,
        }
    }

    /// Time left until the interval allows another snapshot
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.last_started
            .map(|started| self.interval.saturating_sub(now.duration_since(started)))
            .unwrap_or(Duration::ZERO)
    }

    pub fn started(&mut self, now: Instant) {
        self.in_flight = true;
        self.last_started = Some(now);
    }

    pub fn finished(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_load_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let mut graph = LinkGraph::new();
        graph.record_edge("https://a.example/", "https://a.example/x", None);
        let json = graph.take_snapshot().unwrap();

        write_snapshot(&path, &json).await.unwrap();

        let loaded = load_graph(&path).unwrap();
        assert_eq!(loaded, graph);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_snapshot_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        write_snapshot(&path, "{}").await.unwrap();
        write_snapshot(&path, "{\n}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\n}");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_graph(Path::new("/nonexistent/data.json"));
        assert!(matches!(result, Err(CrawlError::Io(_))));
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("out/data.json")),
            PathBuf::from("out/data.json.tmp")
        );
    }

    #[test]
    fn test_schedule_debounces() {
        let now = Instant::now();
        let mut schedule = SnapshotSchedule::new(Duration::from_secs(1));

        assert!(!schedule.is_due(false, now));
        assert!(schedule.is_due(true, now));

        schedule.started(now);
        assert!(!schedule.is_due(true, now));

        schedule.finished();
        assert!(!schedule.is_due(true, now + Duration::from_millis(500)));
        assert!(schedule.is_due(true, now + Duration::from_secs(1)));
        assert_eq!(
            schedule.time_until_due(now + Duration::from_millis(400)),
            Duration::from_millis(600)
        );
    }
}
