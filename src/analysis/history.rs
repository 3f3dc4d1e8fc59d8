use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, ErrorCode, Repository, Sort, Tree};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Outcome of asking history about one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLookup {
    Found(DateTime<Utc>),
    /// The query ran fine but no commit touches the path.
    NotTracked,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("HISTORY_QUERY_FAILED: could not run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("HISTORY_QUERY_FAILED: git exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("HISTORY_QUERY_FAILED: unexpected git output {0:?}")]
    Unparsable(String),

    #[error("HISTORY_QUERY_FAILED: timestamp {0} is out of range")]
    OutOfRange(i64),

    #[error("HISTORY_QUERY_FAILED: {0}")]
    Git(#[from] git2::Error),
}

/// Looks up the most recent change to a path, relative to the repository
/// root the implementation was created for.
pub trait HistoryQuery {
    fn last_change(&self, relative_path: &str) -> Result<HistoryLookup, HistoryError>;
}

/// Spawns `git log -1 --format=%ct -- <path>` once per lookup.
pub struct GitLogQuery {
    root: PathBuf,
}

impl GitLogQuery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl HistoryQuery for GitLogQuery {
    fn last_change(&self, relative_path: &str) -> Result<HistoryLookup, HistoryError> {
        let output = Command::new("git")
            .args(["log", "-1", "--format=%ct", "--"])
            .arg(relative_path)
            .current_dir(&self.root)
            .output()?;

        if !output.status.success() {
            return Err(HistoryError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("git log {relative_path}: {:?}", stdout.trim());
        parse_commit_time(&stdout)
    }
}

/// Parses the `%ct` output of `git log`; blank output means no history.
pub fn parse_commit_time(raw: &str) -> Result<HistoryLookup, HistoryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(HistoryLookup::NotTracked);
    }

    let seconds: i64 = trimmed
        .parse()
        .map_err(|_| HistoryError::Unparsable(trimmed.to_string()))?;
    found_at(seconds)
}

fn found_at(seconds: i64) -> Result<HistoryLookup, HistoryError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(HistoryLookup::Found)
        .ok_or(HistoryError::OutOfRange(seconds))
}

/// In-process lookup through libgit2.
///
/// History is walked once when the query is opened and every path is mapped
/// to the newest commit touching it, so each lookup is a map hit.
pub struct Git2Query {
    times: HashMap<String, DateTime<Utc>>,
}

impl Git2Query {
    pub fn open(root: &Path) -> Result<Self, HistoryError> {
        let repo = Repository::open(root)?;
        Ok(Self {
            times: index_history(&repo)?,
        })
    }
}

impl HistoryQuery for Git2Query {
    fn last_change(&self, relative_path: &str) -> Result<HistoryLookup, HistoryError> {
        Ok(match self.times.get(relative_path) {
            Some(modified) => HistoryLookup::Found(*modified),
            None => HistoryLookup::NotTracked,
        })
    }
}

fn index_history(repo: &Repository) -> Result<HashMap<String, DateTime<Utc>>, HistoryError> {
    let mut times = HashMap::new();

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(times);
        }
        Err(e) => return Err(e.into()),
    };

    let mut revwalk = repo.revwalk()?;
    revwalk.push(head.peel_to_commit()?.id())?;
    revwalk.set_sorting(Sort::TIME)?;

    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        let seconds = commit.time().seconds();
        let when = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or(HistoryError::OutOfRange(seconds))?;

        for path in changed_paths(repo, &commit)? {
            times.entry(path).or_insert(when);
        }
    }

    debug!("libgit2 indexed {} paths", times.len());
    Ok(times)
}

// Paths whose entry differs from every parent, which mirrors git's default
// history simplification for merges. Root commits touch everything they hold.
fn changed_paths(repo: &Repository, commit: &Commit) -> Result<HashSet<String>, git2::Error> {
    let tree = commit.tree()?;
    if commit.parent_count() == 0 {
        return diff_paths(repo, None, &tree);
    }

    let mut changed: Option<HashSet<String>> = None;
    for parent in commit.parents() {
        let paths = diff_paths(repo, Some(&parent.tree()?), &tree)?;
        changed = Some(match changed {
            None => paths,
            Some(prev) => prev.intersection(&paths).cloned().collect(),
        });
    }
    Ok(changed.unwrap_or_default())
}

fn diff_paths(repo: &Repository, old: Option<&Tree>, new: &Tree) -> Result<HashSet<String>, git2::Error> {
    let diff = repo.diff_tree_to_tree(old, Some(new), None)?;
    Ok(diff
        .deltas()
        .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
        .map(|path| path.to_string_lossy().into_owned())
        .collect())
}
