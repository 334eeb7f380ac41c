use std::{collections::HashSet, hash::Hash};

use log::{debug, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::Settings,
    domain::{CommentKind, Credential, Digest, ItemKind, RecordKind},
    github::{self, FetchError, GitHubClient, PageSource},
    paginate::paginate,
    storage::{SnapshotStore, StoreError},
    window::TimeWindow,
};

const CREATED_AT: &str = "created_at";

/// Fetches one month of activity, keeps what was created inside the month and
/// persists it as that month's snapshot.
pub struct DigestFetcher<'a, S: PageSource> {
    source: &'a S,
    settings: &'a Settings,
    store: SnapshotStore,
}

impl<'a, S: PageSource> DigestFetcher<'a, S> {
    pub fn new(source: &'a S, settings: &'a Settings) -> Self {
        Self {
            source,
            settings,
            store: SnapshotStore::new(&settings.data_dir),
        }
    }

    pub fn generate(&self, year: i32, month: u32) -> Result<Digest, DigestError> {
        let window =
            TimeWindow::for_month(year, month).ok_or(DigestError::InvalidMonth { year, month })?;

        // The month is all or nothing: a fault in any kind empties all four.
        let digest = match self.fetch_window(&window) {
            Ok(digest) => digest,
            Err(err) => {
                warn!("digest for {year}-{month:02} degraded to empty: {err}");
                Digest::default()
            }
        };

        let dir = self.store.write(year, month, &digest)?;
        info!(
            "digest {year}-{month:02}: {} issues, {} pulls, {} comments -> {}",
            digest.issues.len(),
            digest.pulls.len(),
            digest.comment_count(),
            dir.display()
        );
        Ok(digest)
    }

    /// Full, unfiltered history of all four kinds, stored as the export.
    pub fn export_history(&self) -> Result<Digest, DigestError> {
        let raw = RawRecords {
            issues: self.fetch_kind(RecordKind::Issues, None)?,
            pulls: self.fetch_kind(RecordKind::Pulls, None)?,
            issue_comments: self.fetch_kind(RecordKind::IssueComments, None)?,
            pr_comments: self.fetch_kind(RecordKind::PrComments, None)?,
        };
        let digest = raw.into_digest(None);
        let dir = self.store.write_export(&digest)?;
        info!(
            "export: {} issues, {} pulls, {} comments -> {}",
            digest.issues.len(),
            digest.pulls.len(),
            digest.comment_count(),
            dir.display()
        );
        Ok(digest)
    }

    fn fetch_window(&self, window: &TimeWindow) -> Result<Digest, FetchError> {
        // `since` narrows the listing but is not upper-bounded; the window
        // filter below is what decides membership. Pulls ignore it.
        let since = Some(window.since_hint());
        let raw = RawRecords {
            issues: self.fetch_kind(RecordKind::Issues, since.clone())?,
            pulls: self.fetch_kind(RecordKind::Pulls, None)?,
            issue_comments: self.fetch_kind(RecordKind::IssueComments, since.clone())?,
            pr_comments: self.fetch_kind(RecordKind::PrComments, since)?,
        };
        Ok(raw.into_digest(Some(window)))
    }

    fn fetch_kind(&self, kind: RecordKind, since: Option<String>) -> Result<Vec<Value>, FetchError> {
        let url = github::endpoint_url(&self.settings.api_base, &self.settings.repo, kind.endpoint())?;
        let mut params = Vec::new();
        if matches!(kind, RecordKind::Issues | RecordKind::Pulls) {
            params.push(("state", "all".to_owned()));
        }
        if let Some(since) = since {
            params.push(("since", since));
        }
        Ok(paginate(self.source, &url, &params, self.settings.page_size()))
    }
}

struct RawRecords {
    issues: Vec<Value>,
    pulls: Vec<Value>,
    issue_comments: Vec<Value>,
    pr_comments: Vec<Value>,
}

impl RawRecords {
    fn into_digest(self, window: Option<&TimeWindow>) -> Digest {
        let keep = |record: &Value| window.is_none_or(|w| w.contains_field(record, CREATED_AT));
        let issues = self
            .issues
            .iter()
            .filter(|record| keep(*record))
            .filter_map(|record| github::parse_item(ItemKind::Issue, record));
        let pulls = self
            .pulls
            .iter()
            .filter(|record| keep(*record))
            .filter_map(|record| github::parse_item(ItemKind::PullRequest, record));
        let issue_comments = self
            .issue_comments
            .iter()
            .filter(|record| keep(*record))
            .filter_map(|record| github::parse_comment(CommentKind::Issue, record));
        let pr_comments = self
            .pr_comments
            .iter()
            .filter(|record| keep(*record))
            .filter_map(|record| github::parse_comment(CommentKind::PullRequest, record));

        Digest {
            issues: first_seen(issues, |item| (item.kind, item.number)),
            pulls: first_seen(pulls, |item| (item.kind, item.number)),
            issue_comments: first_seen(issue_comments, |comment| (comment.kind, comment.id)),
            pr_comments: first_seen(pr_comments, |comment| (comment.kind, comment.id)),
        }
    }
}

/// Keeps the first record for each key, in the order given. Page-number
/// pagination can shift a record onto the next page while a walk is running,
/// so the same record may come back twice.
fn first_seen<T, K: Eq + Hash>(
    records: impl Iterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    for record in records {
        if seen.insert(key(&record)) {
            kept.push(record);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        debug!("dropped {dropped} duplicate records");
    }
    kept
}

/// `generate_monthly_digest(credential, year, month)` against the live API.
pub fn generate_monthly_digest(
    settings: &Settings,
    credential: &Credential,
    year: i32,
    month: u32,
) -> Result<Digest, DigestError> {
    let client = GitHubClient::new(settings, credential)?;
    DigestFetcher::new(&client, settings).generate(year, month)
}

pub fn export_history(settings: &Settings, credential: &Credential) -> Result<Digest, DigestError> {
    let client = GitHubClient::new(settings, credential)?;
    DigestFetcher::new(&client, settings).export_history()
}

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("{year}-{month} is not a valid calendar month")]
    InvalidMonth { year: i32, month: u32 },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
