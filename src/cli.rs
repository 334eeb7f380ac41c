use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::{DEFAULT_API_BASE, DEFAULT_DATA_DIR, DEFAULT_REPO, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about = "Monthly contribution digests for a GitHub repository", long_about = None)]
pub struct Args {
    /// GitHub token used for API requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Repository to analyse, as <owner>/<name>
    #[arg(long, env = "DIGEST_REPO", default_value = DEFAULT_REPO, global = true)]
    pub repo: String,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Directory holding monthly snapshots and the export
    #[arg(long, env = "DIGEST_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Records requested per page (at most 100)
    #[arg(long, default_value_t = 100, global = true)]
    pub per_page: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            api_base: self.api_base.clone(),
            repo: self.repo.clone(),
            data_dir: self.data_dir.clone(),
            per_page: self.per_page,
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one month from GitHub, store it and print its summary
    Digest(MonthArg),
    /// Export the full issue/PR/comment history
    Export,
    /// Print the summary of a stored month without fetching
    Report(MonthArg),
    /// List logins active in a month that never appear before it in the export
    NewContributors(MonthArg),
    /// Search titles and comments for a keyword
    Search(SearchArgs),
}

#[derive(ClapArgs, Debug, Clone, Copy)]
pub struct MonthArg {
    #[arg(long)]
    pub year: i32,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    /// Text searched in titles and comment bodies (case-insensitive)
    #[arg(default_value = "")]
    pub keyword: String,

    /// Only keep items opened by these logins
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// Earliest creation date, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest creation date, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Search this month's snapshot instead of the export
    #[arg(long, requires = "month")]
    pub year: Option<i32>,

    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_command_parses_month() {
        let args = Args::try_parse_from([
            "transit-digest",
            "--repo",
            "google/transit",
            "digest",
            "--year",
            "2024",
            "--month",
            "3",
        ])
        .expect("parse");
        assert!(matches!(args.command, Command::Digest(MonthArg { year: 2024, month: 3 })));
        assert_eq!(args.settings().repo, "google/transit");
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        let result = Args::try_parse_from(["transit-digest", "report", "--year", "2024", "--month", "13"]);
        assert!(result.is_err());
    }

    #[test]
    fn search_accepts_filters() {
        let args = Args::try_parse_from([
            "transit-digest",
            "search",
            "routing",
            "--user",
            "alice",
            "--user",
            "bob",
            "--from",
            "2024-03-01",
        ])
        .expect("parse");
        let Command::Search(search) = args.command else {
            panic!("expected search");
        };
        assert_eq!(search.keyword, "routing");
        assert_eq!(search.users, vec!["alice", "bob"]);
        assert_eq!(search.from, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(search.year, None);
    }
}
