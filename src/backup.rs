//! Backup management for local copies of the payments document.

use crate::error::Res;
use crate::{utils, Config};
use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;

/// Prefix for backups of a freshly loaded document.
pub const LOADED: &str = "loaded";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `data` as a pretty-printed JSON backup file.
    ///
    /// The filename format is `{prefix}.YYYY-MM-DD-NNN.json` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub(crate) async fn save_json<T>(&self, prefix: &str, data: &T) -> Res<PathBuf>
    where
        T: Serialize,
    {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}"));

        utils::serialize(&path, data).await?;
        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Res<u32> {
        let mut max_seq: u32 = 0;

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(seq) = parse_sequence_number(&name, prefix, date) {
                max_seq = max_seq.max(seq);
            }
        }

        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Res<()> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }

        // The name format sorts by date, then sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }

        Ok(())
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match `{prefix}.{date}-{NNN}.json`.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("loaded.2026-10-19-001.json", "loaded", "2026-10-19"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("loaded.2026-10-19-042.json", "loaded", "2026-10-19"),
            Some(42)
        );
        // Wrong date
        assert_eq!(
            parse_sequence_number("loaded.2026-10-18-001.json", "loaded", "2026-10-19"),
            None
        );
        // Wrong prefix
        assert_eq!(
            parse_sequence_number("saved.2026-10-19-001.json", "loaded", "2026-10-19"),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("loaded.2026-10-19-001.json", "loaded"));
        assert!(!is_backup_file("loaded.2026-10-19-001.txt", "loaded"));
        assert!(!is_backup_file("rates.json", "loaded"));
    }

    #[tokio::test]
    async fn test_save_and_rotate() {
        let dir = TempDir::new().unwrap();
        let backup = Backup {
            backups_dir: dir.path().to_path_buf(),
            backup_copies: 2,
        };

        let first = backup.save_json(LOADED, &json!({"n": 1})).await.unwrap();
        let second = backup.save_json(LOADED, &json!({"n": 2})).await.unwrap();
        let third = backup.save_json(LOADED, &json!({"n": 3})).await.unwrap();

        assert!(first.to_string_lossy().ends_with("-001.json"));
        assert!(third.to_string_lossy().ends_with("-003.json"));
        assert!(!first.exists());
        assert!(second.is_file());
        let content: serde_json::Value = utils::deserialize(&third).await.unwrap();
        assert_eq!(content["n"], 3);
    }
}
