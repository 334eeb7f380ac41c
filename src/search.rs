use std::collections::BTreeSet;

use crate::{
    domain::{Comment, Item},
    window::TimeWindow,
};

/// Sidebar-style narrowing applied before any keyword search.
#[derive(Clone, Debug, Default)]
pub struct ItemFilter {
    /// Author logins to keep; empty keeps everyone.
    pub users: Vec<String>,
    /// Creation range, compared on whole UTC days.
    pub created: Option<TimeWindow>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        let user_ok = self.users.is_empty()
            || item
                .login()
                .is_some_and(|login| self.users.iter().any(|user| user == login));
        let date_ok = self
            .created
            .is_none_or(|window| window.contains(item.created_at));
        user_ok && date_ok
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchOutcome<'a> {
    pub items: Vec<&'a Item>,
    pub comments: Vec<&'a Comment>,
}

/// Finds items whose title mentions `keyword` or that have at least one
/// comment mentioning it. Matching is a case-insensitive substring test.
///
/// `filter` runs first; a matching comment whose parent was filtered out is
/// not returned. Comments with an unreadable parent reference never count.
/// The keyword is used as typed, surrounding spaces included. Only an empty
/// keyword returns the filtered items with no comments.
pub fn cross_reference<'a>(
    keyword: &str,
    filter: &ItemFilter,
    items: &'a [Item],
    issue_comments: &'a [Comment],
    pr_comments: &'a [Comment],
) -> SearchOutcome<'a> {
    let candidates: Vec<&Item> = items.iter().filter(|item| filter.matches(item)).collect();
    let needle = keyword.to_lowercase();
    if needle.is_empty() {
        return SearchOutcome {
            items: candidates,
            comments: Vec::new(),
        };
    }

    let matching_comments: Vec<&Comment> = issue_comments
        .iter()
        .chain(pr_comments.iter())
        .filter(|comment| contains_ignore_case(&comment.body, &needle))
        .collect();
    let commented: BTreeSet<u64> = matching_comments
        .iter()
        .filter_map(|comment| comment.parent_number())
        .collect();

    let found: Vec<&Item> = candidates
        .into_iter()
        .filter(|item| {
            contains_ignore_case(&item.title, &needle) || commented.contains(&item.number)
        })
        .collect();

    let found_numbers: BTreeSet<u64> = found.iter().map(|item| item.number).collect();
    let comments = matching_comments
        .into_iter()
        .filter(|comment| {
            comment
                .parent_number()
                .is_some_and(|number| found_numbers.contains(&number))
        })
        .collect();

    SearchOutcome {
        items: found,
        comments,
    }
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        aggregate::tests::{at, comment, item},
        domain::{CommentKind, ItemKind},
    };

    fn numbers(outcome: &SearchOutcome<'_>) -> Vec<u64> {
        outcome.items.iter().map(|item| item.number).collect()
    }

    #[test]
    fn title_and_comment_matches_are_unioned() {
        let items = vec![
            item(ItemKind::Issue, 1, "fix bus routing", Some("a"), at(1, 3)),
            item(ItemKind::Issue, 2, "add rail stop", Some("b"), at(1, 3)),
            item(ItemKind::Issue, 3, "docs", Some("c"), at(1, 3)),
        ];
        let issue_comments = vec![comment(
            CommentKind::Issue,
            "2",
            Some("d"),
            "this affects Routing too",
            at(2, 3),
        )];

        let outcome = cross_reference("routing", &ItemFilter::default(), &items, &issue_comments, &[]);
        assert_eq!(numbers(&outcome), vec![1, 2]);
        assert_eq!(outcome.comments.len(), 1);
    }

    #[test]
    fn keyword_is_case_insensitive() {
        let items = vec![item(ItemKind::Issue, 1, "GTFS-Realtime feed", None, at(1, 3))];
        let outcome = cross_reference("realTIME", &ItemFilter::default(), &items, &[], &[]);
        assert_eq!(numbers(&outcome), vec![1]);
    }

    #[test]
    fn keyword_keeps_its_spaces() {
        let items = vec![
            item(ItemKind::Issue, 1, "fix bus routing", None, at(1, 3)),
            item(ItemKind::Issue, 2, "busway stops", None, at(1, 3)),
        ];
        let outcome = cross_reference(" bus", &ItemFilter::default(), &items, &[], &[]);
        assert_eq!(numbers(&outcome), vec![1]);

        let blank = cross_reference("  ", &ItemFilter::default(), &items, &[], &[]);
        assert!(blank.items.is_empty());
    }

    #[test]
    fn malformed_parent_refs_are_ignored() {
        let items = vec![item(ItemKind::Issue, 4, "unrelated", None, at(1, 3))];
        let pr_comments = vec![comment(CommentKind::PullRequest, "four", None, "routing", at(1, 3))];
        let outcome = cross_reference("routing", &ItemFilter::default(), &items, &[], &pr_comments);
        assert!(outcome.items.is_empty());
        assert!(outcome.comments.is_empty());
    }

    #[test]
    fn comments_of_filtered_out_items_are_dropped() {
        let items = vec![
            item(ItemKind::Issue, 1, "routing", Some("alice"), at(1, 3)),
            item(ItemKind::Issue, 2, "stops", Some("bob"), at(1, 3)),
        ];
        let issue_comments = vec![
            comment(CommentKind::Issue, "1", None, "routing again", at(2, 3)),
            comment(CommentKind::Issue, "2", None, "routing here", at(2, 3)),
        ];
        let filter = ItemFilter {
            users: vec!["alice".into()],
            created: None,
        };
        let outcome = cross_reference("routing", &filter, &items, &issue_comments, &[]);
        assert_eq!(numbers(&outcome), vec![1]);
        assert_eq!(outcome.comments.len(), 1);
        assert_eq!(outcome.comments[0].parent_number(), Some(1));
    }

    #[test]
    fn date_filter_uses_whole_days() {
        let items = vec![
            item(ItemKind::Issue, 1, "a", None, at(10, 3)),
            item(ItemKind::Issue, 2, "b", None, at(11, 3)),
            item(ItemKind::Issue, 3, "c", None, at(12, 3)),
        ];
        let filter = ItemFilter {
            users: Vec::new(),
            created: TimeWindow::for_dates(
                NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            ),
        };
        let outcome = cross_reference("", &filter, &items, &[], &[]);
        assert_eq!(numbers(&outcome), vec![1, 2]);
        assert!(outcome.comments.is_empty());
    }

    #[test]
    fn users_filter_skips_anonymous_items() {
        let filter = ItemFilter {
            users: vec!["alice".into()],
            created: None,
        };
        assert!(!filter.matches(&item(ItemKind::Issue, 1, "x", None, at(1, 3))));
        assert!(filter.matches(&item(ItemKind::Issue, 1, "x", Some("alice"), at(1, 3))));
    }
}
