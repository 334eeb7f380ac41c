mod aggregate;
mod cli;
mod config;
mod digest;
mod domain;
mod github;
mod paginate;
mod report;
mod search;
mod storage;
mod window;

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use cli::{Args, Command, MonthArg, SearchArgs};
use config::Settings;
use digest::DigestError;
use domain::Credential;
use log::{error, warn};
use report::{DigestSummary, NewContributors, SearchReport};
use search::ItemFilter;
use storage::{SnapshotStore, StoreError};
use thiserror::Error;
use window::TimeWindow;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let settings = args.settings();
    match args.command {
        Command::Digest(MonthArg { year, month }) => {
            let credential = require_token(args.token)?;
            let window = month_window(year, month)?;
            let digest = digest::generate_monthly_digest(&settings, &credential, year, month)?;
            print!(
                "{}",
                DigestSummary::build(&digest, &window).render(&format!("Digest {year}-{month:02}"))
            );
        }
        Command::Export => {
            let credential = require_token(args.token)?;
            let digest = digest::export_history(&settings, &credential)?;
            println!(
                "Exported {} issues, {} PRs, {} comments.",
                digest.issues.len(),
                digest.pulls.len(),
                digest.comment_count()
            );
        }
        Command::Report(MonthArg { year, month }) => {
            let window = month_window(year, month)?;
            let digest = snapshot_store(&settings).read(year, month)?;
            if digest.is_empty() {
                warn!("snapshot for {year}-{month:02} holds no records");
            }
            print!(
                "{}",
                DigestSummary::build(&digest, &window).render(&format!("Report {year}-{month:02}"))
            );
        }
        Command::NewContributors(MonthArg { year, month }) => {
            let window = month_window(year, month)?;
            let history = snapshot_store(&settings).read_export()?;
            let fresh = aggregate::new_contributors(&history, &window);
            print!(
                "{}",
                NewContributors {
                    window: &window,
                    logins: &fresh,
                }
            );
        }
        Command::Search(search) => run_search(&settings, search)?,
    }
    Ok(())
}

fn run_search(settings: &Settings, search: SearchArgs) -> Result<(), AppError> {
    let store = snapshot_store(settings);
    let digest = match (search.year, search.month) {
        (Some(year), Some(month)) => store.read(year, month)?,
        _ => store.read_export()?,
    };

    let created = match (search.from, search.to) {
        (None, None) => None,
        (from, to) => {
            let from = from.unwrap_or(NaiveDate::MIN);
            let to = to.unwrap_or(NaiveDate::MAX);
            Some(TimeWindow::for_dates(from, to).ok_or(AppError::InvalidDateRange)?)
        }
    };
    let filter = ItemFilter {
        users: search.users,
        created,
    };

    let items: Vec<_> = digest.items().cloned().collect();
    let outcome = search::cross_reference(
        &search.keyword,
        &filter,
        &items,
        &digest.issue_comments,
        &digest.pr_comments,
    );
    print!(
        "{}",
        SearchReport {
            keyword: &search.keyword,
            outcome: &outcome,
        }
    );
    Ok(())
}

fn require_token(token: Option<String>) -> Result<Credential, AppError> {
    let credential = Credential::new(token.unwrap_or_default());
    if credential.is_empty() {
        return Err(AppError::MissingToken);
    }
    Ok(credential)
}

fn month_window(year: i32, month: u32) -> Result<TimeWindow, AppError> {
    TimeWindow::for_month(year, month)
        .ok_or(AppError::Digest(DigestError::InvalidMonth { year, month }))
}

fn snapshot_store(settings: &Settings) -> SnapshotStore {
    SnapshotStore::new(&settings.data_dir)
}

#[derive(Debug, Error)]
enum AppError {
    #[error("No GitHub token: pass --token or set GITHUB_TOKEN")]
    MissingToken,
    #[error("--from must not be later than --to")]
    InvalidDateRange,
    #[error(transparent)]
    Digest(#[from] DigestError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
