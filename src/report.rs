use std::{collections::BTreeSet, fmt};

use crate::{
    aggregate::{self, CommentedItem, ContributorCount},
    domain::{Digest, ItemState},
    search::SearchOutcome,
    window::TimeWindow,
};

const TOP_CONTRIBUTORS: usize = 10;
const TOP_COMMENTED: usize = 5;

#[derive(Clone, Debug)]
pub struct DigestSummary {
    pub issues: usize,
    pub pulls: usize,
    pub issue_comments: usize,
    pub pr_comments: usize,
    pub top_contributors: Vec<ContributorCount>,
    pub states: Vec<(ItemState, usize)>,
    pub most_commented: Vec<CommentedItem>,
}

impl DigestSummary {
    pub fn build(digest: &Digest, window: &TimeWindow) -> Self {
        let mut top_contributors = aggregate::top_contributors(digest, window);
        top_contributors.truncate(TOP_CONTRIBUTORS);
        Self {
            issues: digest.issues.len(),
            pulls: digest.pulls.len(),
            issue_comments: digest.issue_comments.len(),
            pr_comments: digest.pr_comments.len(),
            top_contributors,
            states: aggregate::state_breakdown(digest.items()).into_iter().collect(),
            most_commented: aggregate::most_commented(digest, window, TOP_COMMENTED),
        }
    }

    pub fn render(&self, title: &str) -> String {
        format!("== {title} ==\n{self}")
    }
}

impl fmt::Display for DigestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} issues, {} PRs, {} comments ({} on issues, {} on PRs)",
            self.issues,
            self.pulls,
            self.issue_comments + self.pr_comments,
            self.issue_comments,
            self.pr_comments
        )?;

        writeln!(f, "\nTop contributors")?;
        if self.top_contributors.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for entry in &self.top_contributors {
            writeln!(f, "  {:<24} {}", entry.login, entry.count)?;
        }

        writeln!(f, "\nStatus of issues/PRs")?;
        for (state, count) in &self.states {
            writeln!(f, "  {:<24} {count}", state.label())?;
        }

        writeln!(f, "\nMost commented")?;
        if self.most_commented.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for entry in &self.most_commented {
            writeln!(
                f,
                "  #{:<6} {:>3}  {}  {}",
                entry.number, entry.comments, entry.title, entry.url
            )?;
        }
        Ok(())
    }
}

/// Listing of the logins first seen in a month.
pub struct NewContributors<'a> {
    pub window: &'a TimeWindow,
    pub logins: &'a BTreeSet<String>,
}

impl fmt::Display for NewContributors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} new contributor(s) in {}",
            self.logins.len(),
            self.window.start.format("%Y-%m")
        )?;
        for login in self.logins {
            writeln!(f, "  {login}")?;
        }
        Ok(())
    }
}

pub struct SearchReport<'a> {
    pub keyword: &'a str,
    pub outcome: &'a SearchOutcome<'a>,
}

impl fmt::Display for SearchReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = &self.outcome.items;
        writeln!(f, "Results: {} items found", items.len())?;
        for item in items {
            writeln!(
                f,
                "  #{:<6} {:<12} {:<7} {:<20} {}  {}",
                item.number,
                item.kind.label(),
                item.state.label(),
                item.login().unwrap_or("-"),
                item.created_at.format("%Y-%m-%d"),
                item.title
            )?;
        }

        if self.keyword.is_empty() || items.is_empty() {
            return Ok(());
        }
        writeln!(f, "\nMatching comments")?;
        if self.outcome.comments.is_empty() {
            writeln!(f, "  No comments matched the search term in the selected items.")?;
        }
        for comment in &self.outcome.comments {
            let first_line = comment.body.lines().next().unwrap_or_default();
            writeln!(
                f,
                "  {:<20} {}  {}",
                comment.login().unwrap_or("-"),
                comment.created_at.format("%Y-%m-%d"),
                first_line
            )?;
        }
        Ok(())
    }
}
