use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Domain data structures shared across modules.

#[derive(Clone)]
pub struct Credential {
    pub token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Open,
    Closed,
}

impl ItemState {
    pub fn label(&self) -> &'static str {
        match self {
            ItemState::Open => "open",
            ItemState::Closed => "closed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Issue => "Issue",
            ItemKind::PullRequest => "Pull request",
        }
    }
}

/// An issue or a pull request. Both share one shape; `kind` keeps track of
/// provenance because numbers are only unique within a kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub number: u64,
    pub title: String,
    pub state: ItemState,
    pub author: Option<Actor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub url: String,
}

impl Item {
    pub fn login(&self) -> Option<&str> {
        self.author.as_ref().map(|actor| actor.login.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Issue,
    PullRequest,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub kind: CommentKind,
    pub id: u64,
    pub parent_ref: String,
    pub author: Option<Actor>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn login(&self) -> Option<&str> {
        self.author.as_ref().map(|actor| actor.login.as_str())
    }

    pub fn parent_number(&self) -> Option<u64> {
        parse_parent_reference(&self.parent_ref)
    }
}

/// Reads the issue/PR number from the last path segment of a reference URL,
/// e.g. `.../repos/google/transit/issues/512` -> `512`.
pub fn parse_parent_reference(url: &str) -> Option<u64> {
    let (_, tail) = url.rsplit_once('/')?;
    tail.parse().ok()
}

/// The four record collections of one month (or of the full exported
/// history).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub issues: Vec<Item>,
    pub pulls: Vec<Item>,
    pub issue_comments: Vec<Comment>,
    pub pr_comments: Vec<Comment>,
}

impl Digest {
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.issues.iter().chain(self.pulls.iter())
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.issue_comments.iter().chain(self.pr_comments.iter())
    }

    pub fn comment_count(&self) -> usize {
        self.issue_comments.len() + self.pr_comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
            && self.pulls.is_empty()
            && self.issue_comments.is_empty()
            && self.pr_comments.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Issues,
    Pulls,
    IssueComments,
    PrComments,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Issues,
        RecordKind::Pulls,
        RecordKind::IssueComments,
        RecordKind::PrComments,
    ];

    /// Path below `/repos/{owner}/{repo}/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            RecordKind::Issues => "issues",
            RecordKind::Pulls => "pulls",
            RecordKind::IssueComments => "issues/comments",
            RecordKind::PrComments => "pulls/comments",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            RecordKind::Issues => "issues.json",
            RecordKind::Pulls => "pulls.json",
            RecordKind::IssueComments => "issues_comments.json",
            RecordKind::PrComments => "pr_comments.json",
        }
    }
}
