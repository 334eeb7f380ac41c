use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    domain::{Digest, Item, ItemState},
    window::TimeWindow,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContributorCount {
    pub login: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentedItem {
    pub number: u64,
    pub comments: usize,
    pub title: String,
    pub url: String,
}

/// Logins ranked by how many issues, pulls and comments they created inside
/// `window`. Equal counts are ordered by login.
pub fn top_contributors(digest: &Digest, window: &TimeWindow) -> Vec<ContributorCount> {
    let item_logins = digest
        .items()
        .filter(|item| window.contains(item.created_at))
        .filter_map(Item::login);
    let comment_logins = digest
        .comments()
        .filter(|comment| window.contains(comment.created_at))
        .filter_map(|comment| comment.login());

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for login in item_logins.chain(comment_logins) {
        *counts.entry(login).or_default() += 1;
    }

    let mut ranked: Vec<ContributorCount> = counts
        .into_iter()
        .map(|(login, count)| ContributorCount {
            login: login.to_owned(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.login.cmp(&b.login)));
    ranked
}

/// The `limit` parent items with the most comments inside `window`.
///
/// Parents are looked up in the issues first, then in the pulls; a parent
/// found in neither is left out, so fewer than `limit` entries may come back.
pub fn most_commented(digest: &Digest, window: &TimeWindow, limit: usize) -> Vec<CommentedItem> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for number in digest
        .comments()
        .filter(|comment| window.contains(comment.created_at))
        .filter_map(|comment| comment.parent_number())
    {
        *counts.entry(number).or_default() += 1;
    }

    let mut ranked: Vec<(u64, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .filter_map(|(number, comments)| {
            let item = digest
                .issues
                .iter()
                .find(|item| item.number == number)
                .or_else(|| digest.pulls.iter().find(|item| item.number == number))?;
            Some(CommentedItem {
                number,
                comments,
                title: item.title.clone(),
                url: item.url.clone(),
            })
        })
        .collect()
}

/// Distinct non-null logins across all four kinds created inside `window`.
pub fn contributors(digest: &Digest, window: &TimeWindow) -> BTreeSet<String> {
    let items = digest
        .items()
        .filter(|item| window.contains(item.created_at))
        .filter_map(Item::login);
    let comments = digest
        .comments()
        .filter(|comment| window.contains(comment.created_at))
        .filter_map(|comment| comment.login());
    items.chain(comments).map(str::to_owned).collect()
}

/// Logins active inside `window` that never appear before it. `history`
/// must reach back far enough to cover the earlier activity, e.g. an export.
pub fn new_contributors(history: &Digest, window: &TimeWindow) -> BTreeSet<String> {
    let current = contributors(history, window);
    let prior = contributors(history, &window.before());
    current.difference(&prior).cloned().collect()
}

pub fn state_breakdown<'a>(items: impl IntoIterator<Item = &'a Item>) -> BTreeMap<ItemState, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(item.state).or_default() += 1;
    }
    counts
}
