use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::domain::{Digest, RecordKind};

const EXPORT_DIR_NAME: &str = "export";

/// Flat JSON snapshots, one directory per month (`2024_03/`) plus one for the
/// full-history export. Writes replace the previous snapshot wholesale.
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn month_dir(&self, year: i32, month: u32) -> PathBuf {
        self.root.join(format!("{year}_{month:02}"))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.root.join(EXPORT_DIR_NAME)
    }

    pub fn write(&self, year: i32, month: u32, digest: &Digest) -> Result<PathBuf, StoreError> {
        let dir = self.month_dir(year, month);
        write_digest(&dir, digest)?;
        Ok(dir)
    }

    pub fn read(&self, year: i32, month: u32) -> Result<Digest, StoreError> {
        read_digest(&self.month_dir(year, month))
    }

    pub fn write_export(&self, digest: &Digest) -> Result<PathBuf, StoreError> {
        let dir = self.export_dir();
        write_digest(&dir, digest)?;
        Ok(dir)
    }

    pub fn read_export(&self) -> Result<Digest, StoreError> {
        read_digest(&self.export_dir())
    }
}

fn write_digest(dir: &Path, digest: &Digest) -> Result<(), StoreError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    for kind in RecordKind::ALL {
        let path = dir.join(kind.file_name());
        match kind {
            RecordKind::Issues => write_records(&path, &digest.issues)?,
            RecordKind::Pulls => write_records(&path, &digest.pulls)?,
            RecordKind::IssueComments => write_records(&path, &digest.issue_comments)?,
            RecordKind::PrComments => write_records(&path, &digest.pr_comments)?,
        }
    }
    Ok(())
}

fn read_digest(dir: &Path) -> Result<Digest, StoreError> {
    Ok(Digest {
        issues: read_records(&dir.join(RecordKind::Issues.file_name()))?,
        pulls: read_records(&dir.join(RecordKind::Pulls.file_name()))?,
        issue_comments: read_records(&dir.join(RecordKind::IssueComments.file_name()))?,
        pr_comments: read_records(&dir.join(RecordKind::PrComments.file_name()))?,
    })
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let data = serde_json::to_string_pretty(records)?;
    fs::write(path, data)?;
    Ok(())
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(StoreError::SnapshotMissing(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No snapshot at {}; generate or export it first", .0.display())]
    SnapshotMissing(PathBuf),
    #[error("I/O error while handling snapshots: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to (de)serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{Actor, Comment, CommentKind, Item, ItemKind, ItemState};

    fn sample_digest() -> Digest {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        let item = |kind: ItemKind, number: u64, state: ItemState| Item {
            kind,
            number,
            title: format!("item {number}"),
            state,
            author: Some(Actor {
                login: "alice".into(),
            }),
            created_at: at,
            updated_at: at,
            closed_at: (state == ItemState::Closed).then_some(at),
            url: format!("https://github.com/google/transit/issues/{number}"),
        };
        Digest {
            issues: vec![
                item(ItemKind::Issue, 2, ItemState::Open),
                item(ItemKind::Issue, 1, ItemState::Closed),
            ],
            pulls: vec![item(ItemKind::PullRequest, 3, ItemState::Open)],
            issue_comments: vec![Comment {
                kind: CommentKind::Issue,
                id: 900,
                parent_ref: "https://api.github.com/repos/google/transit/issues/2".into(),
                author: None,
                body: String::new(),
                created_at: at,
            }],
            pr_comments: Vec::new(),
        }
    }

    #[test]
    fn month_snapshot_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        let digest = sample_digest();

        let written = store.write(2024, 3, &digest).expect("write");
        assert_eq!(written, dir.path().join("2024_03"));
        assert!(written.join("issues_comments.json").exists());

        assert_eq!(store.read(2024, 3).expect("read"), digest);
    }

    #[test]
    fn rewrite_replaces_previous_snapshot() {
        let dir = TempDir::new().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        store.write(2024, 3, &sample_digest()).expect("write");
        store.write(2024, 3, &Digest::default()).expect("rewrite");
        assert!(store.read(2024, 3).expect("read").is_empty());
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        assert!(matches!(store.read(2023, 1), Err(StoreError::SnapshotMissing(_))));
        assert!(matches!(store.read_export(), Err(StoreError::SnapshotMissing(_))));
    }

    #[test]
    fn export_lives_beside_months() {
        let dir = TempDir::new().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        let digest = sample_digest();
        store.write_export(&digest).expect("write");
        assert_eq!(store.read_export().expect("read"), digest);
        assert!(matches!(store.read(2024, 3), Err(StoreError::SnapshotMissing(_))));
    }
}
