//! JSON snapshot output.
//!
//! Each fetch cycle can be persisted for other tools to consume.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── latest.json
//! └── 2026-10-17/
//!     ├── 083015.json
//!     └── 091515.json
//! ```

use crate::models::{TrendItem, TrendSnapshot};
use chrono::{DateTime, Local};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Build a snapshot of `items` stamped with `now`.
pub fn snapshot_at(now: DateTime<Local>, source: &str, items: Vec<TrendItem>) -> TrendSnapshot {
    TrendSnapshot {
        local_date: now.date_naive().to_string(),
        local_time: now.format("%H:%M:%S").to_string(),
        source: source.to_string(),
        items,
    }
}

/// Write a [`TrendSnapshot`] under a date directory and refresh `latest.json`.
///
/// # Returns
///
/// The path of the dated file.
///
/// # Output Path
///
/// `{json_output_dir}/{local_date}/{HHMMSS}.json`
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_snapshot(
    snapshot: &TrendSnapshot,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    let day_dir = PathBuf::from(json_output_dir).join(&snapshot.local_date);
    info!(path = %day_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&day_dir).await {
        error!(path = %day_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let file_name = format!("{}.json", snapshot.local_time.replace(':', ""));
    let path = day_dir.join(file_name);
    fs::write(&path, &json).await?;
    fs::write(PathBuf::from(json_output_dir).join("latest.json"), &json).await?;
    info!(path = %path.display(), items = snapshot.items.len(), "Wrote trend snapshot");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::TimeZone;

    fn items() -> Vec<TrendItem> {
        vec![TrendItem {
            rank: 1,
            title: "话题".into(),
            hot_value: 42,
            category: Category::Society,
            heat_rise: Some(1),
            description: None,
        }]
    }

    #[test]
    fn test_snapshot_at_formats_date_and_time() {
        let now = Local.with_ymd_and_hms(2026, 10, 17, 8, 30, 15).unwrap();
        let snap = snapshot_at(now, "primary", items());
        assert_eq!(snap.local_date, "2026-10-17");
        assert_eq!(snap.local_time, "08:30:15");
        assert_eq!(snap.source, "primary");
    }

    #[tokio::test]
    async fn test_write_snapshot_layout() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2026, 10, 17, 8, 30, 15).unwrap();
        let snap = snapshot_at(now, "backup", items());

        let path = write_snapshot(&snap, dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(path, dir.path().join("2026-10-17").join("083015.json"));

        let latest = std::fs::read_to_string(dir.path().join("latest.json")).unwrap();
        let parsed: TrendSnapshot = serde_json::from_str(&latest).unwrap();
        assert_eq!(parsed.items, snap.items);
        assert_eq!(parsed.source, "backup");
    }
}
