use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "twig", about = "twig: a small local version-control system", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', global = true, default_value = ".")]
    pub dir: PathBuf,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a repository in the current directory
    Init,
    /// Stage a file for the next commit
    Add(PathArgs),
    /// Record staged changes
    Commit(CommitArgs),
    /// Unstage a file, or stage its removal
    Rm(PathArgs),
    /// Show first-parent history of HEAD
    Log,
    /// Show every commit ever made
    GlobalLog,
    /// Print ids of commits with the given message
    Find(FindArgs),
    /// Show branches, staged changes and working-tree changes
    Status,
    /// Switch branches or restore a file
    Checkout(CheckoutArgs),
    /// Create a branch at HEAD
    Branch(BranchArgs),
    /// Delete a branch pointer
    RmBranch(BranchArgs),
    /// Move the current branch to a commit
    Reset(ResetArgs),
    /// Merge a branch into the current branch
    Merge(MergeArgs),
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct CommitArgs {
    pub message: String,
}

#[derive(Args)]
pub struct FindArgs {
    pub message: String,
}

/// `checkout <branch>`, `checkout -- <path>` or `checkout <commit> -- <path>`.
#[derive(Args)]
pub struct CheckoutArgs {
    pub target: Option<String>,
    #[arg(last = true)]
    pub path: Option<String>,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: String,
}

#[derive(Args)]
pub struct ResetArgs {
    pub commit: String,
}

#[derive(Args)]
pub struct MergeArgs {
    pub branch: String,
}
