use filetime::FileTime;
use filetimes_lib::analysis::history::{HistoryError, HistoryLookup, HistoryQuery};
use filetimes_lib::codec::DocumentFormat;
use filetimes_lib::models::report::ApplyReport;
use filetimes_lib::{run, run_with_history, FileTimesError, HistoryBackend, Mode, RunOutcome, RunSettings};
use git2::{Commit, Repository, Signature, Time};
use serde_json::Value;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const COMMIT_TIME: i64 = 1_705_315_800;

fn commit_files(repo: &Repository, files: &[(&str, &str)], seconds: i64) {
    let root = repo.workdir().expect("workdir").to_path_buf();
    let mut index = repo.index().expect("open git index");

    for (relative, content) in files {
        let absolute = root.join(relative);
        fs::create_dir_all(absolute.parent().expect("parent")).expect("create dirs");
        fs::write(&absolute, content).expect("write file");
        index.add_path(Path::new(relative)).expect("add file");
    }
    index.write().expect("write git index");

    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let signature =
        Signature::new("Test User", "test@example.com", &Time::new(seconds, 0)).expect("signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, "change", &tree, &parents)
        .expect("commit");
}

/// Repository with `tracked.txt` committed at COMMIT_TIME and an
/// uncommitted `untracked.txt` next to it.
fn create_repo_with_one_tracked_file() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("init git repo");
    commit_files(&repo, &[("tracked.txt", "hello\n")], COMMIT_TIME);
    fs::write(temp_dir.path().join("untracked.txt"), "scratch\n").expect("write untracked");
    temp_dir
}

fn settings(target: &Path, mode: Mode, document: Option<&Path>) -> RunSettings {
    settings_with_backend(target, mode, document, HistoryBackend::Libgit2)
}

fn settings_with_backend(
    target: &Path,
    mode: Mode,
    document: Option<&Path>,
    backend: HistoryBackend,
) -> RunSettings {
    RunSettings::resolve(target, mode, document, None, backend).expect("settings")
}

#[derive(Default)]
struct CountingHistory {
    asked: Cell<usize>,
}

impl HistoryQuery for CountingHistory {
    fn last_change(&self, _relative_path: &str) -> Result<HistoryLookup, HistoryError> {
        self.asked.set(self.asked.get() + 1);
        Ok(HistoryLookup::NotTracked)
    }
}

fn mtime(path: &Path) -> i64 {
    let meta = fs::metadata(path).expect("metadata");
    FileTime::from_last_modification_time(&meta).unix_seconds()
}

fn set_mtime(path: &Path, seconds: i64) {
    let stamp = FileTime::from_unix_time(seconds, 0);
    filetime::set_file_times(path, stamp, stamp).expect("set times");
}

#[test]
fn document_json_lists_only_files_with_history() {
    let repo = create_repo_with_one_tracked_file();
    let out_dir = tempfile::tempdir().expect("out dir");
    let output = out_dir.path().join("times.json");

    let outcome = run(&settings(repo.path(), Mode::Document, Some(&output))).expect("document");

    assert_eq!(
        outcome,
        RunOutcome::Documented {
            path: output.clone(),
            format: DocumentFormat::Json,
            count: 1,
        }
    );

    let doc: Value = serde_json::from_str(&fs::read_to_string(&output).expect("read doc"))
        .expect("parse doc");
    let entries = doc.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["path"], "tracked.txt");
    assert_eq!(entries[0]["last_modified"], "2024-01-15T10:50:00Z");
    assert_eq!(entries[0]["unix_time"], COMMIT_TIME);
}

#[test]
fn document_defaults_to_json_inside_target() {
    let repo = create_repo_with_one_tracked_file();

    run(&settings(repo.path(), Mode::Document, None)).expect("document");

    let default_doc = repo.path().join("file_modification_times.json");
    assert!(default_doc.is_file());
}

#[test]
fn document_sorts_newest_first() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("init git repo");
    commit_files(&repo, &[("a_old.txt", "1")], 1_600_000_000);
    commit_files(&repo, &[("b_new.txt", "2")], 1_700_000_000);
    commit_files(&repo, &[("nested/c_mid.txt", "3")], 1_650_000_000);

    let out_dir = tempfile::tempdir().expect("out dir");
    let output = out_dir.path().join("times.csv");
    run(&settings(temp_dir.path(), Mode::Document, Some(&output))).expect("document");

    let raw = fs::read_to_string(&output).expect("read csv");
    let paths: Vec<&str> = raw
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap_or_default())
        .collect();
    assert_eq!(paths, vec!["b_new.txt", "nested/c_mid.txt", "a_old.txt"]);
}

#[test]
fn document_markdown_is_written_with_table() {
    let repo = create_repo_with_one_tracked_file();
    let out_dir = tempfile::tempdir().expect("out dir");
    let output = out_dir.path().join("times.md");

    run(&settings(repo.path(), Mode::Document, Some(&output))).expect("document");

    let doc = fs::read_to_string(&output).expect("read markdown");
    assert!(doc.contains("Total files: 1"));
    assert!(doc.contains("| tracked.txt | 2024-01-15 10:50:00 | 1705315800 |"));
}

#[test]
fn document_overwrites_existing_output() {
    let repo = create_repo_with_one_tracked_file();
    let out_dir = tempfile::tempdir().expect("out dir");
    let output = out_dir.path().join("times.json");
    fs::write(&output, "x".repeat(4096)).expect("seed output");

    run(&settings(repo.path(), Mode::Document, Some(&output))).expect("document");

    let raw = fs::read_to_string(&output).expect("read doc");
    assert!(serde_json::from_str::<Value>(&raw).is_ok());
}

#[test]
fn document_without_history_warns_and_writes_nothing() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    Repository::init(temp_dir.path()).expect("init git repo");
    fs::write(temp_dir.path().join("draft.txt"), "draft").expect("write file");
    let output = temp_dir.path().join("times.json");

    let outcome = run(&settings(temp_dir.path(), Mode::Document, Some(&output))).expect("document");

    assert_eq!(outcome, RunOutcome::NothingToDo);
    assert!(!output.exists());
}

#[test]
fn document_rejects_non_repository_before_writing() {
    let plain = tempfile::tempdir().expect("create temp dir");
    fs::write(plain.path().join("file.txt"), "x").expect("write file");
    let output = plain.path().join("times.json");

    let err = run(&settings(plain.path(), Mode::Document, Some(&output))).unwrap_err();

    assert!(matches!(err, FileTimesError::NotGitRepo(_)));
    assert!(err.to_string().starts_with("NOT_GIT_REPO"));
    assert!(!output.exists());
}

#[test]
fn adjust_rejects_missing_directory() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let missing = temp_dir.path().join("gone");

    let err = run(&settings(&missing, Mode::Adjust, None)).unwrap_err();
    assert!(matches!(err, FileTimesError::PathNotFound(_)));
}

#[test]
fn adjust_sets_tracked_file_and_leaves_untracked_alone() {
    let repo = create_repo_with_one_tracked_file();
    let untracked = repo.path().join("untracked.txt");
    set_mtime(&untracked, 1_000_000_000);

    let outcome = run(&settings(repo.path(), Mode::Adjust, None)).expect("adjust");

    match outcome {
        RunOutcome::Adjusted(report) => {
            assert_eq!(report.applied, 1);
            assert_eq!(report.failed, 0);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(mtime(&repo.path().join("tracked.txt")), COMMIT_TIME);
    assert_eq!(mtime(&untracked), 1_000_000_000);
}

#[test]
fn adjust_with_git_cli_backend_sets_tracked_file_only() {
    let repo = create_repo_with_one_tracked_file();
    let untracked = repo.path().join("untracked.txt");
    set_mtime(&untracked, 1_000_000_000);

    let outcome = run(&settings_with_backend(
        repo.path(),
        Mode::Adjust,
        None,
        HistoryBackend::GitCli,
    ))
    .expect("adjust");

    assert_eq!(
        outcome,
        RunOutcome::Adjusted(ApplyReport { applied: 1, failed: 0 })
    );
    assert_eq!(mtime(&repo.path().join("tracked.txt")), COMMIT_TIME);
    assert_eq!(mtime(&untracked), 1_000_000_000);
}

#[test]
fn document_with_git_cli_backend_matches_commit_time() {
    let repo = create_repo_with_one_tracked_file();
    let out_dir = tempfile::tempdir().expect("out dir");
    let output = out_dir.path().join("times.csv");

    run(&settings_with_backend(
        repo.path(),
        Mode::Document,
        Some(&output),
        HistoryBackend::GitCli,
    ))
    .expect("document");

    let raw = fs::read_to_string(&output).expect("read csv");
    assert_eq!(
        raw,
        "path,last_modified,unix_time\ntracked.txt,2024-01-15 10:50:00,1705315800\n"
    );
}

#[test]
fn custom_history_is_not_consulted_for_non_repository() {
    let plain = tempfile::tempdir().expect("create temp dir");
    fs::write(plain.path().join("file.txt"), "x").expect("write file");
    let history = CountingHistory::default();

    let err = run_with_history(&settings(plain.path(), Mode::Adjust, None), &history).unwrap_err();

    assert!(matches!(err, FileTimesError::NotGitRepo(_)));
    assert_eq!(history.asked.get(), 0);
}

#[test]
fn custom_history_drives_the_scan_of_a_repository() {
    let repo = create_repo_with_one_tracked_file();
    let history = CountingHistory::default();

    let outcome = run_with_history(&settings(repo.path(), Mode::Document, None), &history)
        .expect("document");

    assert_eq!(outcome, RunOutcome::NothingToDo);
    assert_eq!(history.asked.get(), 2);
    assert!(!repo.path().join("file_modification_times.json").exists());
}

#[test]
fn restore_from_csv_skips_malformed_rows() {
    let target = tempfile::tempdir().expect("create temp dir");
    fs::write(target.path().join("good.txt"), "g").expect("write good");
    fs::write(target.path().join("bad.txt"), "b").expect("write bad");
    set_mtime(&target.path().join("bad.txt"), 1_000_000_000);

    let input = target.path().join("times.csv");
    fs::write(
        &input,
        "path,last_modified,unix_time\n\
         bad.txt,not a time,never\n\
         good.txt,2024-01-15 10:50:00,1705315800\n",
    )
    .expect("write csv");

    let outcome = run(&settings(target.path(), Mode::Restore, Some(&input))).expect("restore");

    match outcome {
        RunOutcome::Restored { loaded, skipped, report } => {
            assert_eq!(loaded, 1);
            assert_eq!(skipped, 1);
            assert_eq!(report.applied, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(mtime(&target.path().join("good.txt")), COMMIT_TIME);
    assert_eq!(mtime(&target.path().join("bad.txt")), 1_000_000_000);
}

#[test]
fn restore_with_no_records_is_an_error() {
    let target = tempfile::tempdir().expect("create temp dir");
    let input = target.path().join("times.json");
    fs::write(&input, "[]").expect("write json");

    let err = run(&settings(target.path(), Mode::Restore, Some(&input))).unwrap_err();
    assert!(matches!(err, FileTimesError::NoRecords(_)));
}

#[test]
fn restore_rejects_missing_input_and_markdown() {
    let target = tempfile::tempdir().expect("create temp dir");

    let missing = target.path().join("nope.json");
    let err = run(&settings(target.path(), Mode::Restore, Some(&missing))).unwrap_err();
    assert!(matches!(err, FileTimesError::InputNotFound(_)));

    let markdown = target.path().join("times.md");
    fs::write(&markdown, "# File modification times document\n").expect("write md");
    let err = run(&settings(target.path(), Mode::Restore, Some(&markdown))).unwrap_err();
    assert!(err.to_string().starts_with("UNSUPPORTED_FORMAT"));
}

#[test]
fn document_then_restore_round_trips_disk_times() {
    let repo = create_repo_with_one_tracked_file();
    let out_dir = tempfile::tempdir().expect("out dir");
    let output = out_dir.path().join("times.json");
    run(&settings(repo.path(), Mode::Document, Some(&output))).expect("document");

    let tracked = repo.path().join("tracked.txt");
    set_mtime(&tracked, 1_234_567_890);

    run(&settings(repo.path(), Mode::Restore, Some(&output))).expect("restore");
    assert_eq!(mtime(&tracked), COMMIT_TIME);
}

#[test]
fn cli_exit_codes_follow_outcome() {
    let bin = env!("CARGO_BIN_EXE_filetimes");

    let usage = Command::new(bin).output().expect("run binary");
    assert_eq!(usage.status.code(), Some(1));

    let plain = tempfile::tempdir().expect("create temp dir");
    let output = plain.path().join("times.json");
    let not_repo = Command::new(bin)
        .arg(plain.path())
        .arg("document")
        .arg(&output)
        .output()
        .expect("run binary");
    assert_eq!(not_repo.status.code(), Some(1));
    assert!(!output.exists());

    let repo = create_repo_with_one_tracked_file();
    let ok = Command::new(bin)
        .arg(repo.path())
        .arg("adjust")
        .args(["--backend", "libgit2"])
        .output()
        .expect("run binary");
    assert_eq!(ok.status.code(), Some(0));
    assert_eq!(mtime(&repo.path().join("tracked.txt")), COMMIT_TIME);
}
