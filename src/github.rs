use std::time::Duration;

use log::debug;
use reqwest::{
    Url,
    blocking::Client,
    header::{ACCEPT, LINK, USER_AGENT},
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::Settings,
    domain::{Actor, Comment, CommentKind, Credential, Item, ItemKind, ItemState},
    window::parse_timestamp,
};

const USER_AGENT_HEADER: &str = "transit-digest/0.1";
const ACCEPT_HEADER: &str = "application/vnd.github+json";

/// One decoded page and the server-supplied link to the page after it.
#[derive(Clone, Debug)]
pub struct Page {
    pub body: Value,
    pub next: Option<String>,
}

/// "Fetch one page of JSON given a URL and query parameters."
pub trait PageSource {
    fn fetch_page(&self, url: &str, query: &[(&str, String)]) -> Result<Page, FetchError>;
}

pub struct GitHubClient {
    client: Client,
    token: String,
}

impl GitHubClient {
    pub fn new(settings: &Settings, credential: &Credential) -> Result<Self, FetchError> {
        if credential.is_empty() {
            return Err(FetchError::MissingToken);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT_HEADER)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(FetchError::Http)?;
        Ok(Self {
            client,
            token: credential.token.clone(),
        })
    }
}

impl PageSource for GitHubClient {
    fn fetch_page(&self, url: &str, query: &[(&str, String)]) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(USER_AGENT, USER_AGENT_HEADER)
            .header(ACCEPT, ACCEPT_HEADER)
            .bearer_auth(&self.token)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_next_link);
        let body = response.json()?;
        Ok(Page { body, next })
    }
}

/// Builds `{api_base}/repos/{owner}/{name}/{endpoint}`.
pub fn endpoint_url(api_base: &str, repo: &str, endpoint: &str) -> Result<String, FetchError> {
    let (owner, name) = split_repo(repo)?;
    let base = api_base.trim_end_matches('/');
    let url = Url::parse(&format!("{base}/repos/{owner}/{name}/{endpoint}"))
        .map_err(|_| FetchError::InvalidUrl(base.to_owned()))?;
    Ok(url.to_string())
}

fn split_repo(repo: &str) -> Result<(&str, &str), FetchError> {
    let mut parts = repo.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner, name))
        }
        _ => Err(FetchError::InvalidRepo(repo.to_owned())),
    }
}

/// Picks the `rel="next"` target out of an RFC 8288 `Link` header.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .map(str::to_owned)
    })
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub API answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Expected a JSON list from {url}")]
    MalformedPage { url: String },
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
    #[error("Repository must be <owner>/<name>, got '{0}'")]
    InvalidRepo(String),
    #[error("Account token is missing")]
    MissingToken,
}

// Response payloads ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ItemPayload {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    state: String,
    #[serde(default)]
    user: Option<Value>,
    created_at: Value,
    #[serde(default)]
    updated_at: Option<Value>,
    #[serde(default)]
    closed_at: Option<Value>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    id: u64,
    #[serde(default)]
    issue_url: Option<String>,
    #[serde(default)]
    pull_request_url: Option<String>,
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    body: Option<String>,
    created_at: Value,
}

/// `user` objects come back null for deleted accounts ("ghost").
pub fn parse_actor(value: &Value) -> Option<Actor> {
    let login = value.get("login")?.as_str()?;
    if login.is_empty() {
        return None;
    }
    Some(Actor {
        login: login.to_owned(),
    })
}

/// True when an entry of the issues endpoint is really a pull request.
pub fn is_pull_request_entry(record: &Value) -> bool {
    record.get("pull_request").is_some_and(|marker| !marker.is_null())
}

pub fn parse_item(kind: ItemKind, record: &Value) -> Option<Item> {
    if kind == ItemKind::Issue && is_pull_request_entry(record) {
        return None;
    }
    let payload = match ItemPayload::deserialize(record) {
        Ok(payload) => payload,
        Err(err) => {
            debug!("skipping malformed {} record: {err}", kind.label());
            return None;
        }
    };

    let state = match payload.state.as_str() {
        "open" => ItemState::Open,
        "closed" => ItemState::Closed,
        other => {
            debug!("skipping #{} with unknown state '{other}'", payload.number);
            return None;
        }
    };
    let created_at = parse_timestamp(&payload.created_at)?;
    let updated_at = payload
        .updated_at
        .as_ref()
        .and_then(parse_timestamp)
        .unwrap_or(created_at);
    let closed_at = match state {
        ItemState::Open => None,
        ItemState::Closed => match payload.closed_at.as_ref().and_then(parse_timestamp) {
            Some(at) => Some(at),
            None => {
                debug!("skipping closed #{} without closed_at", payload.number);
                return None;
            }
        },
    };

    Some(Item {
        kind,
        number: payload.number,
        title: payload.title.unwrap_or_default(),
        state,
        author: payload.user.as_ref().and_then(parse_actor),
        created_at,
        updated_at,
        closed_at,
        url: payload.html_url.or(payload.url).unwrap_or_default(),
    })
}

pub fn parse_comment(kind: CommentKind, record: &Value) -> Option<Comment> {
    let payload = match CommentPayload::deserialize(record) {
        Ok(payload) => payload,
        Err(err) => {
            debug!("skipping malformed comment record: {err}");
            return None;
        }
    };
    let parent_ref = match kind {
        CommentKind::Issue => payload.issue_url,
        CommentKind::PullRequest => payload.pull_request_url,
    }?;

    Some(Comment {
        kind,
        id: payload.id,
        parent_ref,
        author: payload.user.as_ref().and_then(parse_actor),
        body: payload.body.unwrap_or_default(),
        created_at: parse_timestamp(&payload.created_at)?,
    })
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
