//! In-memory fakes for the collaborator traits.
//!
//! A `FakeRemote` stands in for the origin repository: each branch is a
//! snapshot of file contents plus a commit sha. `FakeGit` checkouts are real
//! directories so the transforms run against real files.

#![allow(dead_code)]

use release_tool::error::{GitError, GitHubError, Result};
use release_tool::git::{GitOperations, RepositoryCloner, WorkingCopy};
use release_tool::github::{
    DraftRelease, HostingClient, MergeMethod, MergeResult, MergeState, PullRequestRecord,
    ReleaseDraft, RepositoryHandle,
};
use release_tool::identity::ReleaseIdentity;
use release_tool::metadata::FileMetadataStore;
use release_tool::orchestrator::{Collaborators, MergePolicy};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub const ORG: &str = "spatialos";
pub const VERSION: &str = "0.12.0";
pub const SOURCE: &str = "master";
pub const CANDIDATE: &str = "0.12.0-rc";
pub const RELEASE: &str = "release";

pub type Files = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub sha: String,
    pub files: Files,
}

#[derive(Debug, Default)]
pub struct RemoteState {
    pub branches: BTreeMap<String, Snapshot>,
    pub pushes: Vec<String>,
    pub commits: Vec<String>,
    pub fetches: usize,
    next_sha: usize,
}

impl RemoteState {
    fn mint_sha(&mut self) -> String {
        self.next_sha += 1;
        format!("{:040x}", self.next_sha)
    }
}

/// Shared origin repository
#[derive(Debug, Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemote {
    pub fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap()
    }

    pub fn add_branch(&self, branch: &str, files: &[(&str, &str)]) -> String {
        let mut state = self.state();
        let sha = state.mint_sha();
        let files = files
            .iter()
            .map(|(path, contents)| (path.to_string(), contents.to_string()))
            .collect();
        state.branches.insert(
            branch.to_string(),
            Snapshot {
                sha: sha.clone(),
                files,
            },
        );
        sha
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<String> {
        self.state()
            .branches
            .get(branch)
            .and_then(|snapshot| snapshot.files.get(path).cloned())
    }

    pub fn sha(&self, branch: &str) -> Option<String> {
        self.state().branches.get(branch).map(|s| s.sha.clone())
    }

    pub fn pushes(&self) -> Vec<String> {
        self.state().pushes.clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.state().commits.clone()
    }
}

/// A checkout of the fake remote in a real directory
#[derive(Debug)]
pub struct FakeGit {
    root: PathBuf,
    remote: FakeRemote,
    head: Mutex<Snapshot>,
    staged: Mutex<BTreeSet<String>>,
}

impl FakeGit {
    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn write_tree(&self, files: &Files) {
        for entry in std::fs::read_dir(&self.root).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                std::fs::remove_dir_all(path).unwrap();
            } else {
                std::fs::remove_file(path).unwrap();
            }
        }
        for (relative, contents) in files {
            let path = self.root.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
    }
}

impl GitOperations for FakeGit {
    fn path(&self) -> &Path {
        &self.root
    }

    async fn fetch(&self) -> Result<()> {
        self.remote.state().fetches += 1;
        Ok(())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self.remote.state().branches.contains_key(branch))
    }

    async fn checkout_remote_branch(&self, branch: &str) -> Result<()> {
        let snapshot = self
            .remote
            .state()
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| GitError::BranchNotFound {
                branch: branch.to_string(),
            })?;
        self.write_tree(&snapshot.files);
        *self.head.lock().unwrap() = snapshot;
        self.staged.lock().unwrap().clear();
        Ok(())
    }

    async fn stage_file(&self, path: &Path) -> Result<()> {
        let relative = self.relative(path);
        self.staged.lock().unwrap().insert(relative);
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        let staged = std::mem::take(&mut *self.staged.lock().unwrap());
        let mut head = self.head.lock().unwrap();

        let mut changed = false;
        for relative in staged {
            let contents = std::fs::read_to_string(self.root.join(&relative))?;
            if head.files.get(&relative) != Some(&contents) {
                head.files.insert(relative, contents);
                changed = true;
            }
        }
        if !changed {
            return Err(GitError::NothingToCommit.into());
        }

        let mut remote = self.remote.state();
        head.sha = remote.mint_sha();
        remote.commits.push(message.to_string());
        Ok(())
    }

    async fn force_push(&self, branch: &str) -> Result<()> {
        let head = self.head.lock().unwrap().clone();
        let mut remote = self.remote.state();
        remote.branches.insert(branch.to_string(), head);
        remote.pushes.push(branch.to_string());
        Ok(())
    }

    async fn head_commit_sha(&self) -> Result<String> {
        Ok(self.head.lock().unwrap().sha.clone())
    }
}

/// Clones the fake remote into fresh directories under one temp dir
pub struct FakeCloner {
    base: tempfile::TempDir,
    remote: FakeRemote,
    clones: Mutex<usize>,
}

impl FakeCloner {
    pub fn new(remote: &FakeRemote) -> Self {
        Self {
            base: tempfile::tempdir().unwrap(),
            remote: remote.clone(),
            clones: Mutex::new(0),
        }
    }

    pub fn clone_count(&self) -> usize {
        *self.clones.lock().unwrap()
    }

    /// Number of checkout directories still on disk
    pub fn live_checkouts(&self) -> usize {
        std::fs::read_dir(self.base.path()).unwrap().count()
    }
}

impl RepositoryCloner for FakeCloner {
    type Repo = FakeGit;

    async fn clone_or_open(&self, _remote_url: &str) -> Result<WorkingCopy<FakeGit>> {
        let mut clones = self.clones.lock().unwrap();
        *clones += 1;
        let root = self.base.path().join(format!("clone-{}", clones));
        std::fs::create_dir_all(&root)?;

        Ok(WorkingCopy::new(FakeGit {
            root,
            remote: self.remote.clone(),
            head: Mutex::new(Snapshot::default()),
            staged: Mutex::new(BTreeSet::new()),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct OpenPullRequest {
    pub record: PullRequestRecord,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct HostingState {
    pub pull_requests: Vec<OpenPullRequest>,
    /// Merge states returned in order; `steady_state` once exhausted
    pub merge_states: VecDeque<MergeState>,
    pub steady_state: Option<MergeState>,
    /// Number of merge calls rejected with NotMergeable before one succeeds
    pub merge_rejections: usize,
    pub merge_calls: usize,
    pub merge_state_calls: usize,
    pub merge_messages: Vec<String>,
    pub releases: Vec<ReleaseDraft>,
    /// (head, base) pairs GitHub reports as identical
    pub no_commits_between: BTreeSet<(String, String)>,
    next_id: u64,
}

/// Scriptable hosting provider
#[derive(Debug, Clone, Default)]
pub struct FakeHosting {
    state: Arc<Mutex<HostingState>>,
}

impl FakeHosting {
    pub fn state(&self) -> MutexGuard<'_, HostingState> {
        self.state.lock().unwrap()
    }

    pub fn script_merge_states(&self, states: &[MergeState], steady_state: MergeState) {
        let mut state = self.state();
        state.merge_states = states.iter().copied().collect();
        state.steady_state = Some(steady_state);
    }

    pub fn add_open_pull_request(&self, repository: &str, head: &str, base: &str) -> PullRequestRecord {
        let mut state = self.state();
        state.next_id += 1;
        let record = PullRequestRecord {
            id: state.next_id,
            head_branch: head.to_string(),
            base_branch: base.to_string(),
            html_url: format!("https://github.com/{}/{}/pull/{}", ORG, repository, state.next_id),
            merge_state: MergeState::Blocked,
        };
        state.pull_requests.push(OpenPullRequest {
            record: record.clone(),
            title: String::new(),
            body: String::new(),
        });
        record
    }

    pub fn pull_requests_into(&self, base: &str) -> Vec<OpenPullRequest> {
        self.state()
            .pull_requests
            .iter()
            .filter(|pr| pr.record.base_branch == base)
            .cloned()
            .collect()
    }
}

impl HostingClient for FakeHosting {
    async fn repository_from_url(&self, url: &str) -> Result<RepositoryHandle> {
        let mut parts = url.trim_end_matches('/').rsplit('/');
        let name = parts.next().unwrap_or_default().to_string();
        let owner = parts.next().unwrap_or_default().to_string();
        Ok(RepositoryHandle {
            owner,
            name,
            clone_url: format!("{}.git", url),
        })
    }

    async fn find_pull_request(
        &self,
        _repo: &RepositoryHandle,
        _org: &str,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestRecord>> {
        Ok(self
            .state()
            .pull_requests
            .iter()
            .find(|pr| pr.record.head_branch == head && pr.record.base_branch == base)
            .map(|pr| pr.record.clone()))
    }

    async fn create_pull_request(
        &self,
        repo: &RepositoryHandle,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestRecord> {
        let mut state = self.state();
        if state
            .no_commits_between
            .contains(&(head.to_string(), base.to_string()))
        {
            return Err(GitHubError::NoCommitsBetween {
                message: format!("No commits between {} and {}", base, head),
            }
            .into());
        }

        state.next_id += 1;
        let record = PullRequestRecord {
            id: state.next_id,
            head_branch: head.to_string(),
            base_branch: base.to_string(),
            html_url: format!(
                "https://github.com/{}/{}/pull/{}",
                repo.owner, repo.name, state.next_id
            ),
            merge_state: MergeState::Unknown,
        };
        state.pull_requests.push(OpenPullRequest {
            record: record.clone(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(record)
    }

    async fn merge_state(&self, _repo: &RepositoryHandle, _pull_request: u64) -> Result<MergeState> {
        let mut state = self.state();
        state.merge_state_calls += 1;
        let next = state.merge_states.pop_front();
        Ok(next
            .or(state.steady_state)
            .unwrap_or(MergeState::ReadyToMerge))
    }

    async fn merge(
        &self,
        _repo: &RepositoryHandle,
        pull_request: u64,
        _method: MergeMethod,
        commit_message: &str,
    ) -> Result<MergeResult> {
        let mut state = self.state();
        state.merge_calls += 1;
        state.merge_messages.push(commit_message.to_string());

        if state.merge_rejections > 0 {
            state.merge_rejections -= 1;
            return Err(GitHubError::NotMergeable {
                pull_request,
                reason: "Base branch was modified".to_string(),
            }
            .into());
        }
        Ok(MergeResult {
            merged: true,
            sha: Some("merge-commit".to_string()),
        })
    }

    async fn find_release_by_tag(
        &self,
        repo: &RepositoryHandle,
        tag: &str,
    ) -> Result<Option<DraftRelease>> {
        let state = self.state();
        Ok(state
            .releases
            .iter()
            .position(|release| release.tag == tag)
            .map(|index| release_at(repo, index + 1)))
    }

    async fn create_draft_release(
        &self,
        repo: &RepositoryHandle,
        draft: &ReleaseDraft,
    ) -> Result<DraftRelease> {
        let mut state = self.state();
        state.releases.push(draft.clone());
        Ok(release_at(repo, state.releases.len()))
    }
}

fn release_at(repo: &RepositoryHandle, id: usize) -> DraftRelease {
    DraftRelease {
        id: id as u64,
        html_url: format!(
            "https://github.com/{}/{}/releases/tag/untagged-{}",
            repo.owner, repo.name, id
        ),
    }
}

/// Everything a test needs to drive and inspect one run
pub struct Harness {
    pub remote: FakeRemote,
    pub hosting: FakeHosting,
    pub metadata_dir: tempfile::TempDir,
    pub deps: Collaborators<FakeCloner, FakeHosting, FileMetadataStore>,
}

impl Harness {
    pub fn new(remote: FakeRemote) -> Self {
        let hosting = FakeHosting::default();
        let metadata_dir = tempfile::tempdir().unwrap();
        let metadata = FileMetadataStore::new(metadata_dir.path().join("metadata.json"));
        let deps = Collaborators::new(FakeCloner::new(&remote), hosting.clone(), metadata)
            .unwrap()
            .with_today(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_policy(MergePolicy::default());

        Self {
            remote,
            hosting,
            metadata_dir,
            deps,
        }
    }

    pub fn metadata(&self) -> &FileMetadataStore {
        &self.deps.metadata
    }
}

pub fn identity(repository: &str) -> ReleaseIdentity {
    ReleaseIdentity::new(VERSION, SOURCE, CANDIDATE, RELEASE, repository, ORG).unwrap()
}

pub const GDK_CHANGELOG: &str = "# Changelog\n\n## Unreleased\n\n## [`0.11.0`] - 2023-10-01\n\n### Features\n- Previous release.\n";

pub const GDK_PLUGIN: &str = r#"{
  "FileVersion": 3,
  "Version": 11,
  "VersionName": "0.11.0",
  "FriendlyName": "SpatialOS GDK for Unreal"
}"#;

/// Source branch of a GDK checkout
pub fn gdk_source_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("CHANGELOG.md", GDK_CHANGELOG),
        ("SpatialGDK/SpatialGDK.uplugin", GDK_PLUGIN),
        ("ci/unreal-engine.version", "HEAD 4.26-SpatialOSUnrealGDK\n"),
    ]
}
