//! In-memory git for engine tests.
//!
//! Understands exactly the command lines the inspector and the planner
//! emit. Commits are integers; a branch is the set of commits reachable
//! from it, so ancestry is set inclusion and a merge is a union.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use gitflow_git::{CommandOutput, CommandRunner, Result as GitResult};

use crate::flow_config::FlowConfig;
use crate::recovery::{Remediation, RemediationKind};
use crate::traits::Prompter;

type History = BTreeSet<u32>;

const CONFLICT_FILE: &str = "src/lib.rs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Merge { source: String, target: String },
    Rebase { branch: String, onto: String },
}

#[derive(Debug, Default)]
pub struct FakeRepo {
    pub head: String,
    pub branches: BTreeMap<String, History>,
    /// Keyed `remote/branch`.
    pub remote_branches: BTreeMap<String, History>,
    pub remotes: Vec<String>,
    pub tags: BTreeMap<String, History>,
    pub config: BTreeMap<String, String>,
    pub dirty: bool,
    pub merge_conflicts: HashSet<(String, String)>,
    pub rebase_conflicts: HashMap<String, usize>,
    pub push_rejections: usize,
    /// Canned outputs for commands starting with the given words.
    pub failures: Vec<(String, CommandOutput)>,
    pub pending: Option<Pending>,
    pub unmerged: Vec<String>,
    pub calls: Vec<Vec<String>>,
    next_commit: u32,
}

impl FakeRepo {
    fn commit(&mut self) -> u32 {
        self.next_commit += 1;
        self.next_commit
    }

    fn resolve(&self, name: &str) -> Option<&History> {
        self.branches
            .get(name)
            .or_else(|| self.remote_branches.get(name))
            .or_else(|| self.tags.get(name))
    }
}

/// Fake runner over a shared [`FakeRepo`].
#[derive(Debug, Default)]
pub struct FakeGit {
    repo: Mutex<FakeRepo>,
}

#[allow(clippy::unwrap_used, dead_code)]
impl FakeGit {
    /// An empty repository without commits.
    pub fn empty() -> Self {
        let fake = Self::default();
        fake.repo().head = "master".into();
        fake
    }

    /// A repository with one commit on `master` and no flow config.
    pub fn plain() -> Self {
        let fake = Self::empty();
        {
            let mut repo = fake.repo();
            let c = repo.commit();
            repo.branches.insert("master".into(), BTreeSet::from([c]));
        }
        fake
    }

    /// An initialized repository on `develop`, equal to `master`.
    pub fn flow() -> Self {
        let fake = Self::plain();
        {
            let mut repo = fake.repo();
            let master = repo.branches["master"].clone();
            repo.branches.insert("develop".into(), master);
            repo.head = "develop".into();
            for (key, value) in FlowConfig::default().entries() {
                repo.config.insert(key.into(), value.into());
            }
        }
        fake
    }

    pub fn repo(&self) -> MutexGuard<'_, FakeRepo> {
        self.repo.lock().unwrap()
    }

    /// Create `name` from `base` with one extra commit and check it out.
    pub fn with_branch(self, name: &str, base: &str) -> Self {
        {
            let mut repo = self.repo();
            let mut history = repo.branches[base].clone();
            let c = repo.commit();
            history.insert(c);
            repo.branches.insert(name.into(), history);
            repo.head = name.into();
        }
        self
    }

    /// Add a commit to an existing branch.
    pub fn with_commit_on(self, branch: &str) -> Self {
        {
            let mut repo = self.repo();
            let c = repo.commit();
            repo.branches.get_mut(branch).unwrap().insert(c);
        }
        self
    }

    pub fn with_head(self, branch: &str) -> Self {
        self.repo().head = branch.into();
        self
    }

    pub fn with_dirty_tree(self) -> Self {
        self.repo().dirty = true;
        self
    }

    pub fn with_remote(self, remote: &str) -> Self {
        self.repo().remotes.push(remote.into());
        self
    }

    /// Publish a local branch to `remote` as it is now.
    pub fn with_published(self, remote: &str, branch: &str) -> Self {
        {
            let mut repo = self.repo();
            let history = repo.branches[branch].clone();
            repo.remote_branches.insert(format!("{remote}/{branch}"), history);
        }
        self
    }

    /// Someone else pushed a commit to `remote/branch`.
    pub fn with_remote_commit(self, remote: &str, branch: &str) -> Self {
        {
            let mut repo = self.repo();
            let c = repo.commit();
            repo.remote_branches
                .get_mut(&format!("{remote}/{branch}"))
                .unwrap()
                .insert(c);
        }
        self
    }

    pub fn with_tag(self, tag: &str, on: &str) -> Self {
        {
            let mut repo = self.repo();
            let history = repo.branches[on].clone();
            repo.tags.insert(tag.into(), history);
        }
        self
    }

    pub fn with_merge_conflict(self, source: &str, target: &str) -> Self {
        self.repo()
            .merge_conflicts
            .insert((source.into(), target.into()));
        self
    }

    /// The next `times` rebases of `branch` stop with a conflict.
    pub fn with_rebase_conflict(self, branch: &str, times: usize) -> Self {
        self.repo().rebase_conflicts.insert(branch.into(), times);
        self
    }

    pub fn with_push_rejections(self, times: usize) -> Self {
        self.repo().push_rejections = times;
        self
    }

    /// Commands starting with `prefix` fail with `stderr`.
    pub fn with_failure(self, prefix: &str, code: i32, stderr: &str) -> Self {
        self.repo()
            .failures
            .push((prefix.into(), CommandOutput::failed(code, "", stderr)));
        self
    }

    /// The user fixes every conflicted file.
    pub fn resolve_conflicts(&self) {
        self.repo().unmerged.clear();
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.repo().branches.contains_key(name)
    }

    /// Whether `branch` contains every commit of `other`.
    pub fn contains(&self, branch: &str, other: &str) -> bool {
        let repo = self.repo();
        let branch = repo.resolve(branch).unwrap();
        let other = repo.resolve(other).unwrap();
        other.is_subset(branch)
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.repo().calls.clone()
    }

    /// Recorded commands that change the repository.
    pub fn mutations(&self) -> Vec<Vec<String>> {
        self.calls().into_iter().filter(|c| is_mutation(c)).collect()
    }
}

fn is_mutation(args: &[String]) -> bool {
    let args = strip_options(args);
    match args.first().map(String::as_str) {
        Some("commit" | "branch" | "checkout" | "merge" | "rebase" | "tag" | "push") => true,
        Some("symbolic-ref") => args.len() == 3 && args[1] == "HEAD",
        Some("config") => args.len() == 3 && args[1] != "--get",
        _ => false,
    }
}

/// Drop leading `-c key=value` pairs.
fn strip_options(args: &[String]) -> &[String] {
    let mut rest = args;
    while rest.len() >= 2 && rest[0] == "-c" {
        rest = &rest[2..];
    }
    rest
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput::ok(stdout)
}

fn fail(code: i32, stderr: impl Into<String>) -> CommandOutput {
    CommandOutput::failed(code, "", stderr)
}

fn probe(yes: bool) -> CommandOutput {
    if yes { ok("") } else { CommandOutput::failed(1, "", "") }
}

fn list<'a>(names: impl Iterator<Item = &'a String>) -> CommandOutput {
    ok(names.map(|n| format!("{n}\n")).collect::<String>())
}

impl FakeGit {
    #[allow(clippy::too_many_lines)]
    fn handle(&self, args: &[String]) -> CommandOutput {
        let mut repo = self.repo();
        repo.calls.push(args.to_vec());

        let line = args.join(" ");
        if let Some((_, output)) = repo.failures.iter().find(|(p, _)| line.starts_with(p.as_str())) {
            return output.clone();
        }

        let args: Vec<&str> = strip_options(args).iter().map(String::as_str).collect();
        match args.as_slice() {
            ["symbolic-ref", "--quiet", "--short", "HEAD"] => ok(format!("{}\n", repo.head)),
            ["symbolic-ref", "HEAD", reference] => {
                repo.head = reference.trim_start_matches("refs/heads/").into();
                ok("")
            }
            ["status", "--porcelain", "--untracked-files=no"] => {
                ok(if repo.dirty { " M src/main.rs\n" } else { "" })
            }
            ["show-ref", "--verify", "--quiet", reference] => {
                let found = if let Some(name) = reference.strip_prefix("refs/heads/") {
                    repo.branches.contains_key(name)
                } else if let Some(name) = reference.strip_prefix("refs/remotes/") {
                    repo.remote_branches.contains_key(name)
                } else if let Some(name) = reference.strip_prefix("refs/tags/") {
                    repo.tags.contains_key(name)
                } else {
                    false
                };
                probe(found)
            }
            ["for-each-ref", _, "refs/heads"] => list(repo.branches.keys()),
            ["for-each-ref", _, "refs/remotes"] => list(repo.remote_branches.keys()),
            ["remote"] => list(repo.remotes.iter()),
            ["rev-parse", "--verify", "--quiet", "HEAD"] => {
                let head = repo.head.clone();
                probe(repo.branches.contains_key(&head))
            }
            ["rev-parse", "--verify", "--quiet", "MERGE_HEAD"] => {
                probe(matches!(repo.pending, Some(Pending::Merge { .. })))
            }
            ["config", "--get", key] => match repo.config.get(*key) {
                Some(value) => ok(format!("{value}\n")),
                None => CommandOutput::failed(1, "", ""),
            },
            ["config", key, value] => {
                repo.config.insert((*key).into(), (*value).into());
                ok("")
            }
            ["merge-base", "--is-ancestor", a, b] => match (repo.resolve(a), repo.resolve(b)) {
                (Some(a), Some(b)) => probe(a.is_subset(b)),
                _ => fail(128, format!("fatal: Not a valid object name {a}")),
            },
            ["rev-list", "--left-right", "--count", range] => {
                let Some((a, b)) = range.split_once("...") else {
                    return fail(128, "fatal: bad range");
                };
                match (repo.resolve(a), repo.resolve(b)) {
                    (Some(a), Some(b)) => ok(format!(
                        "{}\t{}\n",
                        a.difference(b).count(),
                        b.difference(a).count()
                    )),
                    _ => fail(128, format!("fatal: ambiguous argument '{range}'")),
                }
            }
            ["diff", "--name-only", "--diff-filter=U"] => list(repo.unmerged.iter()),
            ["commit", "--allow-empty", ..] => {
                let c = repo.commit();
                let head = repo.head.clone();
                repo.branches.entry(head).or_default().insert(c);
                ok("")
            }
            ["commit", "--no-edit"] => match repo.pending.clone() {
                Some(Pending::Merge { source, target }) if repo.unmerged.is_empty() => {
                    apply_merge(&mut repo, &source, &target);
                    repo.pending = None;
                    ok("")
                }
                _ => fail(1, "nothing to commit, working tree clean"),
            },
            ["branch", "--track", name, upstream] | ["branch", "--no-track", name, upstream] => {
                if repo.branches.contains_key(*name) {
                    return fail(128, format!("fatal: a branch named '{name}' already exists"));
                }
                let Some(history) = repo.resolve(upstream).cloned() else {
                    return fail(128, format!("fatal: not a valid object name: '{upstream}'"));
                };
                repo.branches.insert((*name).into(), history);
                ok("")
            }
            ["branch", "-d", name] => {
                if repo.head == *name {
                    return fail(1, format!("error: cannot delete branch '{name}' used by worktree"));
                }
                match repo.branches.remove(*name) {
                    Some(_) => ok(format!("Deleted branch {name}\n")),
                    None => fail(1, format!("error: branch '{name}' not found.")),
                }
            }
            ["checkout", "-b", name, base] => {
                if repo.branches.contains_key(*name) {
                    return fail(128, format!("fatal: a branch named '{name}' already exists"));
                }
                let Some(history) = repo.resolve(base).cloned() else {
                    return fail(128, format!("fatal: '{base}' is not a commit"));
                };
                repo.branches.insert((*name).into(), history);
                repo.head = (*name).into();
                ok("")
            }
            ["checkout", name] => {
                if !repo.branches.contains_key(*name) {
                    return fail(1, format!("error: pathspec '{name}' did not match any file(s) known to git"));
                }
                repo.head = (*name).into();
                ok("")
            }
            ["fetch", "--prune", _] => ok(""),
            ["merge", "--abort"] | ["rebase", "--abort"] => {
                if repo.pending.take().is_none() {
                    return fail(128, "fatal: There is no merge to abort");
                }
                repo.unmerged.clear();
                ok("")
            }
            ["merge", "--no-ff", "--no-edit", source] => {
                let target = repo.head.clone();
                if !repo.branches.contains_key(*source) {
                    return fail(1, format!("merge: {source} - not something we can merge"));
                }
                if repo.merge_conflicts.remove(&((*source).to_string(), target.clone())) {
                    repo.pending = Some(Pending::Merge {
                        source: (*source).into(),
                        target,
                    });
                    repo.unmerged = vec![CONFLICT_FILE.into()];
                    return CommandOutput::failed(
                        1,
                        format!(
                            "Auto-merging {CONFLICT_FILE}\nCONFLICT (content): Merge conflict in {CONFLICT_FILE}\n\
                             Automatic merge failed; fix conflicts and then commit the result.\n"
                        ),
                        "",
                    );
                }
                apply_merge(&mut repo, source, &target);
                ok("Merge made by the 'ort' strategy.\n")
            }
            ["rebase", "--continue"] => match repo.pending.clone() {
                Some(Pending::Rebase { branch, onto }) if repo.unmerged.is_empty() => {
                    repo.pending = None;
                    if let Some(remaining) = repo.rebase_conflicts.get_mut(&branch) {
                        if *remaining > 0 {
                            *remaining -= 1;
                            repo.pending = Some(Pending::Rebase { branch, onto });
                            repo.unmerged = vec![CONFLICT_FILE.into()];
                            return rebase_conflict();
                        }
                    }
                    apply_rebase(&mut repo, &branch, &onto);
                    ok("Successfully rebased and updated.\n")
                }
                Some(_) => fail(1, format!("{CONFLICT_FILE}: needs merge\nYou must edit all merge conflicts")),
                None => fail(128, "fatal: No rebase in progress?"),
            },
            ["rebase", onto, branch] => {
                if !repo.branches.contains_key(*branch) || repo.resolve(onto).is_none() {
                    return fail(128, format!("fatal: invalid upstream '{onto}'"));
                }
                repo.head = (*branch).into();
                if let Some(remaining) = repo.rebase_conflicts.get_mut(*branch) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        repo.pending = Some(Pending::Rebase {
                            branch: (*branch).into(),
                            onto: (*onto).into(),
                        });
                        repo.unmerged = vec![CONFLICT_FILE.into()];
                        return rebase_conflict();
                    }
                }
                apply_rebase(&mut repo, branch, onto);
                ok("Successfully rebased and updated.\n")
            }
            ["tag", "-a", name, "-m", _, target] => {
                if repo.tags.contains_key(*name) {
                    return fail(128, format!("fatal: tag '{name}' already exists"));
                }
                let Some(history) = repo.resolve(target).cloned() else {
                    return fail(128, format!("fatal: Failed to resolve '{target}' as a valid ref."));
                };
                repo.tags.insert((*name).into(), history);
                ok("")
            }
            ["push", remote, "--delete", branch] => {
                let key = format!("{remote}/{branch}");
                match repo.remote_branches.remove(&key) {
                    Some(_) => ok(""),
                    None => fail(1, format!("error: unable to delete '{branch}': remote ref does not exist")),
                }
            }
            ["push", "--follow-tags", remote, branches @ ..] => {
                if repo.push_rejections > 0 {
                    repo.push_rejections -= 1;
                    return fail(
                        1,
                        format!(
                            "To {remote}\n ! [rejected]        develop -> develop (fetch first)\n\
                             error: failed to push some refs to '{remote}'"
                        ),
                    );
                }
                for branch in branches {
                    if let Some(history) = repo.branches.get(*branch).cloned() {
                        repo.remote_branches.insert(format!("{remote}/{branch}"), history);
                    }
                }
                ok("")
            }
            other => fail(128, format!("unscripted git command: {}", other.join(" "))),
        }
    }
}

fn rebase_conflict() -> CommandOutput {
    CommandOutput::failed(
        1,
        format!("Auto-merging {CONFLICT_FILE}\nCONFLICT (content): Merge conflict in {CONFLICT_FILE}\n"),
        "error: could not apply 1a2b3c4... work in progress\n\
         hint: Resolve all conflicts manually, mark them as resolved with\n",
    )
}

fn apply_merge(repo: &mut FakeRepo, source: &str, target: &str) {
    let source = repo.branches.get(source).cloned().unwrap_or_default();
    let c = repo.commit();
    if let Some(history) = repo.branches.get_mut(target) {
        history.extend(source);
        history.insert(c);
    }
}

fn apply_rebase(repo: &mut FakeRepo, branch: &str, onto: &str) {
    let onto = repo.resolve(onto).cloned().unwrap_or_default();
    if let Some(history) = repo.branches.get_mut(branch) {
        history.extend(onto);
    }
}

impl CommandRunner for FakeGit {
    fn run(
        &self,
        args: &[String],
        _cwd: &Path,
    ) -> impl Future<Output = GitResult<CommandOutput>> + Send {
        std::future::ready(Ok(self.handle(args)))
    }
}

/// A scripted answer to a remediation prompt.
#[derive(Debug, Clone, Copy)]
pub enum Answer {
    /// Fix the conflicted files, then choose.
    Resolve(RemediationKind),
    /// Choose without touching the working tree.
    Choose(RemediationKind),
    Decline,
}

/// Prompter replaying scripted answers; runs out into declining.
pub struct ScriptedPrompter<'a> {
    git: &'a FakeGit,
    answers: Mutex<VecDeque<Answer>>,
    confirm: bool,
    pub messages: Mutex<Vec<String>>,
}

#[allow(clippy::unwrap_used, dead_code)]
impl<'a> ScriptedPrompter<'a> {
    pub fn new(git: &'a FakeGit, answers: &[Answer]) -> Self {
        Self {
            git,
            answers: Mutex::new(answers.iter().copied().collect()),
            confirm: true,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn declining_confirmation(mut self) -> Self {
        self.confirm = false;
        self
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[allow(clippy::unwrap_used)]
impl Prompter for ScriptedPrompter<'_> {
    fn input_text(&self, _placeholder: &str, _prompt: &str) -> Option<String> {
        None
    }

    fn choose_remediation(&self, message: &str, options: &[Remediation]) -> Option<Remediation> {
        self.messages.lock().unwrap().push(message.to_string());
        let pick = |kind| options.iter().find(|o| o.kind == kind).copied();
        match self.answers.lock().unwrap().pop_front()? {
            Answer::Resolve(kind) => {
                self.git.resolve_conflicts();
                pick(kind)
            }
            Answer::Choose(kind) => pick(kind),
            Answer::Decline => None,
        }
    }

    fn confirm(&self, message: &str, _default: bool) -> bool {
        self.messages.lock().unwrap().push(message.to_string());
        self.confirm
    }
}
