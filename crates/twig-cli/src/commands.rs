use std::fmt::Write as _;

use chrono::Local;
use colored::Colorize;
use twig_sdk::{Commit, MergeReport, RepoStatus, Repository, SdkError};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let dir = cli.dir;
    let format = cli.format;
    match cli.command {
        Command::Init => {
            Repository::init(&dir)?;
            Ok(())
        }
        Command::Add(args) => {
            Repository::open(&dir)?.add(&args.path)?;
            Ok(())
        }
        Command::Commit(args) => {
            Repository::open(&dir)?.commit(&args.message)?;
            Ok(())
        }
        Command::Rm(args) => {
            Repository::open(&dir)?.rm(&args.path)?;
            Ok(())
        }
        Command::Log => cmd_log(&Repository::open(&dir)?, false, format),
        Command::GlobalLog => cmd_log(&Repository::open(&dir)?, true, format),
        Command::Find(args) => cmd_find(&Repository::open(&dir)?, &args.message),
        Command::Status => cmd_status(&Repository::open(&dir)?, format),
        Command::Checkout(args) => cmd_checkout(&mut Repository::open(&dir)?, args),
        Command::Branch(args) => {
            Repository::open(&dir)?.branch(&args.name)?;
            Ok(())
        }
        Command::RmBranch(args) => {
            Repository::open(&dir)?.rm_branch(&args.name)?;
            Ok(())
        }
        Command::Reset(args) => {
            Repository::open(&dir)?.reset(&args.commit)?;
            Ok(())
        }
        Command::Merge(args) => cmd_merge(&mut Repository::open(&dir)?, &args.branch),
    }
}

fn cmd_log(repo: &Repository, global: bool, format: OutputFormat) -> anyhow::Result<()> {
    let commits = if global { repo.global_log()? } else { repo.log()? };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&commits)?),
        OutputFormat::Text => {
            let abbrev = repo.config().abbrev;
            let out: String = commits.iter().map(|c| render_log_entry(c, abbrev)).collect();
            print!("{out}");
        }
    }
    Ok(())
}

fn cmd_find(repo: &Repository, message: &str) -> anyhow::Result<()> {
    for id in repo.find(message)? {
        println!("{id}");
    }
    Ok(())
}

fn cmd_status(repo: &Repository, format: OutputFormat) -> anyhow::Result<()> {
    let status = repo.status()?;
    match format {
        OutputFormat::Json => {
            let unstaged: Vec<_> = status
                .workdir
                .unstaged
                .iter()
                .map(|e| serde_json::json!({ "path": e.path, "change": e.change.to_string() }))
                .collect();
            let value = serde_json::json!({
                "branch": status.current_branch,
                "branches": status.branches,
                "staged": status.workdir.staged,
                "removed": status.workdir.removed,
                "unstaged": unstaged,
                "untracked": status.workdir.untracked,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => print!("{}", render_status(&status)),
    }
    Ok(())
}

fn cmd_checkout(repo: &mut Repository, args: CheckoutArgs) -> anyhow::Result<()> {
    match (args.target, args.path) {
        (Some(branch), None) => repo.checkout_branch(&branch)?,
        (None, Some(path)) => repo.checkout_file(&path)?,
        (Some(commit), Some(path)) => repo.checkout_file_at(&commit, &path)?,
        (None, None) => println!("Incorrect operands."),
    }
    Ok(())
}

fn cmd_merge(repo: &mut Repository, branch: &str) -> anyhow::Result<()> {
    match repo.merge(branch)? {
        MergeReport::UpToDate => println!("Given branch is an ancestor of the current branch."),
        MergeReport::FastForwarded { .. } => println!("Current branch fast-forwarded."),
        MergeReport::Merged { conflicts, .. } => {
            if !conflicts.is_empty() {
                println!("{}", "Encountered a merge conflict.".yellow());
            }
        }
    }
    Ok(())
}

/// Print a designed error the way the tool always has: message on stdout.
///
/// Returns `false` for errors that are not meant for the user.
pub fn report_designed(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<SdkError>() {
        Some(e) if e.is_designed() => {
            println!("{e}");
            true
        }
        _ => false,
    }
}

/// One `log` block, trailing blank line included.
pub fn render_log_entry(commit: &Commit, abbrev: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "===");
    let _ = writeln!(out, "commit {}", commit.id);
    if let (Some(p1), Some(p2)) = (commit.parent, commit.merge_parent) {
        let _ = writeln!(out, "Merge: {} {}", p1.abbrev(abbrev), p2.abbrev(abbrev));
    }
    let date = commit.timestamp.with_timezone(&Local);
    let _ = writeln!(out, "Date: {}", date.format("%a %b %-d %H:%M:%S %Y %z"));
    let _ = writeln!(out, "{}", commit.message);
    out.push('\n');
    out
}

pub fn render_status(status: &RepoStatus) -> String {
    let mut out = String::from("=== Branches ===\n");
    for name in &status.branches {
        if *name == status.current_branch {
            out.push('*');
        }
        out.push_str(name);
        out.push('\n');
    }

    section(&mut out, "Staged Files", status.workdir.staged.iter().cloned());
    section(&mut out, "Removed Files", status.workdir.removed.iter().cloned());
    section(
        &mut out,
        "Modifications Not Staged For Commit",
        status
            .workdir
            .unstaged
            .iter()
            .map(|e| format!("{} ({})", e.path, e.change)),
    );
    section(&mut out, "Untracked Files", status.workdir.untracked.iter().cloned());
    out
}

fn section(out: &mut String, title: &str, lines: impl Iterator<Item = String>) {
    let _ = write!(out, "\n=== {title} ===\n");
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twig_sdk::{Change, StatusEntry, WorkdirStatus};

    #[test]
    fn log_entry_for_root_commit() {
        let root = Commit::root("initial commit", "master");
        let text = render_log_entry(&root, 7);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "===");
        assert_eq!(lines[1], format!("commit {}", root.id.to_hex()));
        assert!(lines[2].starts_with("Date: "));
        assert_eq!(lines[3], "initial commit");
        assert!(text.ends_with("initial commit\n\n"));
    }

    #[test]
    fn log_entry_for_merge_has_merge_line() {
        let root = Commit::root("initial commit", "master");
        let side = Commit::new("side", Default::default(), root.id, "side", chrono::Utc::now());
        let main = Commit::new("main", Default::default(), root.id, "master", chrono::Utc::now());
        let merge = Commit::merge(
            Default::default(),
            main.id,
            side.id,
            "master",
            "side",
            chrono::Utc::now(),
        );
        let text = render_log_entry(&merge, 7);
        let expected = format!("Merge: {} {}", main.id.abbrev(7), side.id.abbrev(7));
        assert_eq!(text.lines().nth(2), Some(expected.as_str()));
        assert_eq!(text.lines().nth(4), Some("Merged side into master."));
    }

    #[test]
    fn status_sections() {
        let status = RepoStatus {
            current_branch: "master".into(),
            branches: vec!["feature".into(), "master".into()],
            workdir: WorkdirStatus {
                staged: vec!["new.txt".into()],
                removed: vec!["old.txt".into()],
                unstaged: vec![StatusEntry {
                    path: "edit.txt".into(),
                    change: Change::Modified,
                }],
                untracked: vec!["loose.txt".into()],
            },
        };
        assert_eq!(
            render_status(&status),
            "=== Branches ===\nfeature\n*master\n\n\
             === Staged Files ===\nnew.txt\n\n\
             === Removed Files ===\nold.txt\n\n\
             === Modifications Not Staged For Commit ===\nedit.txt (modified)\n\n\
             === Untracked Files ===\nloose.txt\n"
        );
    }

    #[test]
    fn designed_errors_are_reported() {
        let err = anyhow::Error::new(SdkError::NothingToCommit);
        assert!(report_designed(&err));
        let err = anyhow::Error::new(SdkError::Config("bad".into()));
        assert!(!report_designed(&err));
    }

    #[test]
    fn commands_run_against_a_directory() {
        use clap::Parser;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let run = |args: &[&str]| {
            let mut argv = vec!["twig", "-C", root];
            argv.extend_from_slice(args);
            run_command(Cli::try_parse_from(argv).unwrap())
        };

        run(&["init"]).unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        run(&["add", "a.txt"]).unwrap();
        run(&["commit", "first"]).unwrap();
        run(&["branch", "feature"]).unwrap();
        run(&["status"]).unwrap();

        let err = run(&["commit", "again"]).unwrap_err();
        assert!(matches!(err.downcast_ref::<SdkError>(), Some(SdkError::NothingToCommit)));
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.find("first").unwrap().len(), 1);
    }
}
