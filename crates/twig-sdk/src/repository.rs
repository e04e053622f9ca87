use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use twig_dag::CommitGraph;
use twig_index::{untracked_paths, Index, RemoveOutcome, StageOutcome, WorkdirStatus};
use twig_merge::{analyze, conflict_content, MergeAction, MergeAnalysis, MergePlan};
use twig_refs::{FsRefStore, InMemoryRefStore, RefStore};
use twig_store::{Blob, Commit, FsObjectStore, InMemoryObjectStore, ObjectStore};
use twig_types::ObjectId;

use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};
use crate::layout::Layout;
use crate::worktree::{normalize_path, Worktree};

/// How a merge ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeReport {
    /// The given branch was already part of the current history.
    UpToDate,
    /// The current head was an ancestor of the given head, so the given
    /// branch was checked out. No branch pointer moved.
    FastForwarded { target: ObjectId },
    /// A merge commit was created. `conflicts` lists paths left with
    /// conflict markers.
    Merged {
        commit: ObjectId,
        conflicts: Vec<String>,
    },
}

impl MergeReport {
    /// Returns `true` if a merge commit was made with conflict markers.
    pub fn has_conflicts(&self) -> bool {
        matches!(self, Self::Merged { conflicts, .. } if !conflicts.is_empty())
    }
}

/// Everything `status` reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoStatus {
    pub current_branch: String,
    /// All branch names, sorted.
    pub branches: Vec<String>,
    pub workdir: WorkdirStatus,
}

/// A twig repository: object store, refs, index and working tree.
pub struct Repository {
    layout: Layout,
    config: RepoConfig,
    objects: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
    index: Index,
    worktree: Worktree,
}

impl Repository {
    /// Create a repository at `root` with default settings.
    pub fn init(root: impl AsRef<Path>) -> SdkResult<Self> {
        Self::init_with_config(root, RepoConfig::default())
    }

    /// Create a repository at `root`.
    ///
    /// Writes the config, creates the root commit and points the default
    /// branch and HEAD at it.
    pub fn init_with_config(root: impl AsRef<Path>, config: RepoConfig) -> SdkResult<Self> {
        let layout = Layout::new(root.as_ref());
        if layout.is_initialized() {
            return Err(SdkError::AlreadyInitialized);
        }
        fs::create_dir_all(layout.dot_dir())?;
        config.save(&layout.config_file())?;
        let objects = Arc::new(FsObjectStore::open(layout.objects_dir())?);
        let refs = Arc::new(FsRefStore::open(layout.dot_dir())?);
        Self::bootstrap(layout, config, objects, refs)
    }

    /// Create a repository whose objects and refs live in memory.
    ///
    /// The working tree, index and config still live under `root`.
    pub fn init_in_memory(root: impl AsRef<Path>) -> SdkResult<Self> {
        let layout = Layout::new(root.as_ref());
        fs::create_dir_all(layout.dot_dir())?;
        Self::bootstrap(
            layout,
            RepoConfig::default(),
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
        )
    }

    fn bootstrap(
        layout: Layout,
        config: RepoConfig,
        objects: Arc<dyn ObjectStore>,
        refs: Arc<dyn RefStore>,
    ) -> SdkResult<Self> {
        let root_commit = Commit::root(config.initial_message.as_str(), config.default_branch.as_str());
        objects.put_commit(&root_commit)?;
        refs.write_branch(&config.default_branch, &root_commit.id)?;
        refs.set_head(&config.default_branch)?;

        let repo = Self {
            worktree: Worktree::new(layout.root()),
            layout,
            config,
            objects,
            refs,
            index: Index::new(),
        };
        repo.save_index()?;
        info!(root = %repo.layout.root().display(), commit = %root_commit.id.short_hex(), "initialized repository");
        Ok(repo)
    }

    /// Open the repository whose working tree root is `root`.
    ///
    /// Parent directories are not searched.
    pub fn open(root: impl AsRef<Path>) -> SdkResult<Self> {
        let layout = Layout::new(root.as_ref());
        if !layout.is_initialized() {
            return Err(SdkError::NotInitialized);
        }
        let config = RepoConfig::load(&layout.config_file())?;
        let objects = Arc::new(FsObjectStore::open(layout.objects_dir())?);
        let refs = Arc::new(FsRefStore::open(layout.dot_dir())?);
        let index = match fs::read(layout.index_file()) {
            Ok(bytes) => Index::from_bytes(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Index::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(root = %layout.root().display(), "opened repository");
        Ok(Self {
            worktree: Worktree::new(layout.root()),
            layout,
            config,
            objects,
            refs,
            index,
        })
    }

    // ---- Accessors ----

    /// The working tree root.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Settings loaded from `.twig/config.toml`.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// The staging area as last saved.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Name of the branch HEAD points at.
    pub fn current_branch(&self) -> SdkResult<String> {
        Ok(self.refs.current_branch()?)
    }

    /// Id of the commit at the tip of the current branch.
    pub fn head_id(&self) -> SdkResult<ObjectId> {
        Ok(self.refs.head_commit()?)
    }

    /// The commit at the tip of the current branch.
    pub fn head_commit(&self) -> SdkResult<Commit> {
        Ok(self.objects.get_commit(&self.head_id()?)?)
    }

    /// Load a commit by full id. A missing commit is corruption.
    pub fn get_commit(&self, id: &ObjectId) -> SdkResult<Commit> {
        Ok(self.objects.get_commit(id)?)
    }

    /// Load a blob by full id.
    pub fn get_blob(&self, id: &ObjectId) -> SdkResult<Blob> {
        Ok(self.objects.get_blob(id)?)
    }

    fn save_index(&self) -> SdkResult<()> {
        twig_store::write_atomic(&self.layout.index_file(), &self.index.to_bytes()?)?;
        Ok(())
    }

    // ---- Staging ----

    /// Stage the current content of `path`.
    pub fn add(&mut self, path: &str) -> SdkResult<StageOutcome> {
        let path = normalize_path(path)?;
        let data = self.worktree.read(&path)?.ok_or(SdkError::FileNotFound)?;
        let head = self.head_commit()?;
        let blob = Blob::new(path.as_str(), data);

        let outcome = self.index.stage_addition(&path, blob.id, head.files.get(&path))?;
        if outcome == StageOutcome::Staged {
            self.objects.put_blob(&blob)?;
        }
        self.save_index()?;
        Ok(outcome)
    }

    /// Unstage `path`, or stage its removal and delete it if tracked.
    pub fn rm(&mut self, path: &str) -> SdkResult<RemoveOutcome> {
        let path = normalize_path(path)?;
        let head = self.head_commit()?;
        let outcome = self
            .index
            .stage_removal(&path, head.files.get(&path).copied())?;
        if let RemoveOutcome::StagedRemoval(_) = outcome {
            self.worktree.remove(&path)?;
        }
        self.save_index()?;
        Ok(outcome)
    }

    // ---- Commits ----

    /// Record the staged changes as a new commit on the current branch.
    pub fn commit(&mut self, message: &str) -> SdkResult<ObjectId> {
        if message.trim().is_empty() {
            return Err(SdkError::EmptyMessage);
        }
        if self.index.is_empty() {
            return Err(SdkError::NothingToCommit);
        }
        let branch = self.current_branch()?;
        let head = self.head_commit()?;
        let files = self.index.apply_pending(&head.files);
        let commit = Commit::new(message, files, head.id, branch.as_str(), Utc::now());

        self.objects.put_commit(&commit)?;
        self.refs.write_branch(&branch, &commit.id)?;
        self.index.clear();
        self.save_index()?;
        info!(branch = %branch, commit = %commit.id.short_hex(), files = commit.files.len(), "committed");
        Ok(commit.id)
    }

    /// First-parent history of HEAD, newest first.
    pub fn log(&self) -> SdkResult<Vec<Commit>> {
        let head = self.head_id()?;
        Ok(CommitGraph::new(self.objects.as_ref()).history(&head)?)
    }

    /// Every commit ever made, newest first.
    pub fn global_log(&self) -> SdkResult<Vec<Commit>> {
        let mut commits = self
            .objects
            .commit_ids()?
            .iter()
            .map(|id| self.get_commit(id))
            .collect::<SdkResult<Vec<_>>>()?;
        commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(commits)
    }

    /// Ids of commits whose message is exactly `message`, newest first.
    pub fn find(&self, message: &str) -> SdkResult<Vec<ObjectId>> {
        let found: Vec<ObjectId> = self
            .global_log()?
            .into_iter()
            .filter(|c| c.message == message)
            .map(|c| c.id)
            .collect();
        if found.is_empty() {
            return Err(SdkError::NoCommitWithMessage);
        }
        Ok(found)
    }

    /// Resolve a full id or an unambiguous hex prefix.
    pub fn resolve_commit(&self, prefix: &str) -> SdkResult<ObjectId> {
        let prefix = prefix.trim();
        let matches: Vec<ObjectId> = self
            .objects
            .commit_ids()?
            .into_iter()
            .filter(|id| id.matches_prefix(prefix))
            .collect();
        match matches.as_slice() {
            [] => Err(SdkError::NoSuchCommit),
            [id] => Ok(*id),
            many => Err(SdkError::AmbiguousCommitId {
                prefix: prefix.to_string(),
                matches: many.len(),
            }),
        }
    }

    // ---- Status ----

    /// Branches plus staged, removed, unstaged and untracked paths.
    pub fn status(&self) -> SdkResult<RepoStatus> {
        let head = self.head_commit()?;
        let snapshot = self.worktree.snapshot()?;
        Ok(RepoStatus {
            current_branch: self.current_branch()?,
            branches: self.refs.branches()?.into_iter().map(|(name, _)| name).collect(),
            workdir: WorkdirStatus::compute(&head.files, &self.index, &snapshot),
        })
    }

    // ---- Checkout ----

    /// Restore `path` to its content at HEAD.
    pub fn checkout_file(&self, path: &str) -> SdkResult<()> {
        self.restore_file(&self.head_id()?, path)
    }

    /// Restore `path` to its content at the commit `prefix` names.
    pub fn checkout_file_at(&self, prefix: &str, path: &str) -> SdkResult<()> {
        let id = self.resolve_commit(prefix)?;
        self.restore_file(&id, path)
    }

    fn restore_file(&self, commit: &ObjectId, path: &str) -> SdkResult<()> {
        let path = normalize_path(path)?;
        let commit = self.get_commit(commit)?;
        let blob_id = commit.files.get(&path).ok_or(SdkError::FileNotInCommit)?;
        let blob = self.get_blob(blob_id)?;
        self.worktree.write(&path, &blob.data)?;
        info!(path = %path, commit = %commit.id.short_hex(), "restored file");
        Ok(())
    }

    /// Switch to `branch`, replacing the working tree with its head.
    pub fn checkout_branch(&mut self, branch: &str) -> SdkResult<()> {
        let target = self.refs.read_branch(branch)?.ok_or(SdkError::NoSuchBranch)?;
        if self.current_branch()? == branch {
            return Err(SdkError::AlreadyOnBranch);
        }
        let head = self.head_commit()?;
        self.ensure_no_untracked(&head)?;

        let target = self.get_commit(&target)?;
        self.materialize(&head, &target)?;
        self.refs.set_head(branch)?;
        self.index.clear();
        self.save_index()?;
        info!(branch, commit = %target.id.short_hex(), "checked out branch");
        Ok(())
    }

    // ---- Branches ----

    /// Create `name` pointing at HEAD. HEAD does not move.
    pub fn branch(&self, name: &str) -> SdkResult<()> {
        let head = self.head_id()?;
        self.refs.create_branch(name, &head)?;
        info!(branch = name, commit = %head.short_hex(), "created branch");
        Ok(())
    }

    /// Delete the pointer `name`. Its commits stay in the store.
    pub fn rm_branch(&self, name: &str) -> SdkResult<()> {
        if !self.refs.branch_exists(name)? {
            return Err(SdkError::BranchNotFound);
        }
        self.refs.delete_branch(name)?;
        info!(branch = name, "removed branch");
        Ok(())
    }

    // ---- Reset ----

    /// Move the current branch to the commit `prefix` names and check it out.
    pub fn reset(&mut self, prefix: &str) -> SdkResult<()> {
        let id = self.resolve_commit(prefix)?;
        let head = self.head_commit()?;
        self.ensure_no_untracked(&head)?;

        let target = self.get_commit(&id)?;
        let branch = self.current_branch()?;
        self.materialize(&head, &target)?;
        self.refs.write_branch(&branch, &id)?;
        self.index.clear();
        self.save_index()?;
        info!(branch = %branch, commit = %id.short_hex(), "reset");
        Ok(())
    }

    // ---- Merge ----

    /// Merge `given` into the current branch.
    ///
    /// When the current head is an ancestor of `given`'s head this is a
    /// checkout of `given`: HEAD moves and no merge commit is made.
    pub fn merge(&mut self, given: &str) -> SdkResult<MergeReport> {
        if !self.index.is_empty() {
            return Err(SdkError::UncommittedChanges);
        }
        let given_head = self.refs.read_branch(given)?.ok_or(SdkError::BranchNotFound)?;
        let current = self.current_branch()?;
        if current == given {
            return Err(SdkError::MergeWithSelf);
        }
        let head = self.head_commit()?;
        self.ensure_no_untracked(&head)?;

        match analyze(self.objects.as_ref(), &head.id, &given_head)? {
            MergeAnalysis::UpToDate => {
                info!(given, "given branch already merged");
                Ok(MergeReport::UpToDate)
            }
            MergeAnalysis::FastForward { target } => {
                let target_commit = self.get_commit(&target)?;
                self.materialize(&head, &target_commit)?;
                self.refs.set_head(given)?;
                self.index.clear();
                self.save_index()?;
                info!(from = %current, branch = given, commit = %target.short_hex(), "fast-forwarded");
                Ok(MergeReport::FastForwarded { target })
            }
            MergeAnalysis::ThreeWay { split, given: given_commit, plan } => {
                debug!(split = %split.short_hex(), "merging against split point");
                let conflicts = self.apply_plan(&head, &plan)?;
                let files = self.index.apply_pending(&head.files);
                let merge = Commit::merge(files, head.id, given_commit.id, &current, given, Utc::now());

                self.objects.put_commit(&merge)?;
                self.refs.write_branch(&current, &merge.id)?;
                self.index.clear();
                self.save_index()?;
                if !conflicts.is_empty() {
                    warn!(count = conflicts.len(), paths = ?conflicts, "merge left conflicts");
                }
                info!(branch = %current, given, commit = %merge.id.short_hex(), "merged");
                Ok(MergeReport::Merged {
                    commit: merge.id,
                    conflicts,
                })
            }
        }
    }

    /// Write the working-tree and index side of a three-way plan.
    ///
    /// Every blob is loaded before the first write, so a missing object
    /// aborts with nothing touched.
    fn apply_plan(&mut self, head: &Commit, plan: &MergePlan) -> SdkResult<Vec<String>> {
        enum Step {
            Write(Blob),
            Delete,
        }

        let mut steps = Vec::with_capacity(plan.actions().len());
        let mut conflicts = Vec::new();
        for (path, action) in plan.actions() {
            let step = match action {
                MergeAction::TakeGiven(id) => Step::Write(self.get_blob(id)?),
                MergeAction::Remove => Step::Delete,
                MergeAction::Conflict { current, given } => {
                    let ours = current.map(|id| self.get_blob(&id)).transpose()?;
                    let theirs = given.map(|id| self.get_blob(&id)).transpose()?;
                    let content = conflict_content(
                        ours.as_ref().map(|b| b.text.as_str()),
                        theirs.as_ref().map(|b| b.text.as_str()),
                    );
                    conflicts.push(path.clone());
                    Step::Write(Blob::new(path.as_str(), content.into_bytes()))
                }
            };
            steps.push((path, step));
        }

        // Deletions first, so a file can give way to a directory of the same
        // name and the reverse.
        steps.sort_by_key(|(_, step)| matches!(step, Step::Write(_)));
        for (path, step) in steps {
            let committed = head.files.get(path);
            match step {
                Step::Write(blob) => {
                    self.objects.put_blob(&blob)?;
                    self.worktree.write(path, &blob.data)?;
                    self.index.stage_addition(path, blob.id, committed)?;
                }
                Step::Delete => {
                    self.index.stage_removal(path, committed.copied())?;
                    self.worktree.remove(path)?;
                }
            }
        }
        Ok(conflicts)
    }

    // ---- Working-tree sync ----

    /// Fail if any working file is neither tracked by `head` nor staged.
    fn ensure_no_untracked(&self, head: &Commit) -> SdkResult<()> {
        let listed = self.worktree.list()?;
        let paths = untracked_paths(&head.files, &self.index, listed.iter().map(String::as_str));
        if paths.is_empty() {
            Ok(())
        } else {
            debug!(?paths, "untracked files in the way");
            Err(SdkError::UntrackedInTheWay { paths })
        }
    }

    /// Replace the tracked working tree of `head` with `target`'s.
    ///
    /// Deletes paths tracked by `head` or the index that `target` lacks, then
    /// writes every file of `target`. All blobs are loaded first.
    fn materialize(&self, head: &Commit, target: &Commit) -> SdkResult<()> {
        let blobs = target
            .files
            .iter()
            .map(|(path, id)| Ok((path, self.get_blob(id)?)))
            .collect::<SdkResult<Vec<_>>>()?;

        let tracked = head
            .files
            .keys()
            .chain(self.index.additions().keys())
            .chain(self.index.removals().keys());
        for path in tracked {
            if !target.files.contains_key(path) {
                self.worktree.remove(path)?;
            }
        }
        for (path, blob) in &blobs {
            self.worktree.write(path, &blob.data)?;
        }
        debug!(from = %head.id.short_hex(), to = %target.id.short_hex(), files = blobs.len(), "materialized commit");
        Ok(())
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.layout.root())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
