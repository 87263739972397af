//! Git helper utilities for integration tests.
//!
//! Builds throwaway repositories with the `git` CLI so the libgit2 backend is
//! exercised against real on-disk state.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Initialize a bare repository whose default branch is `main`.
pub fn init_bare_repo(path: &Path) {
    fs::create_dir_all(path).unwrap();
    git(path, &["init", "--bare", "-b", "main"]);
}

/// Initialize a working copy on `main` with a local identity.
pub fn init_repo(path: &Path) {
    fs::create_dir_all(path).unwrap();
    git(path, &["init", "-b", "main"]);
    configure_identity(path);
}

/// Write, stage and commit a file. Returns the new HEAD sha.
pub fn commit_file(repo_path: &Path, filename: &str, content: &str, message: &str) -> String {
    fs::write(repo_path.join(filename), content).unwrap();
    git(repo_path, &["add", filename]);
    git(repo_path, &["commit", "-m", message]);
    get_head_sha(repo_path)
}

/// Overwrite a tracked file without staging it.
pub fn modify_file(repo_path: &Path, filename: &str, content: &str) {
    fs::write(repo_path.join(filename), content).unwrap();
}

pub fn create_branch(repo_path: &Path, branch_name: &str) {
    git(repo_path, &["checkout", "-b", branch_name]);
}

pub fn checkout(repo_path: &Path, rev: &str) {
    git(repo_path, &["checkout", "--quiet", rev]);
}

/// Create an annotated tag at HEAD.
pub fn tag(repo_path: &Path, name: &str) {
    git(repo_path, &["tag", "-a", name, "-m", name]);
}

pub fn add_remote(repo_path: &Path, name: &str, url: &str) {
    git(repo_path, &["remote", "add", name, url]);
}

pub fn push_branch(repo_path: &Path, remote: &str, branch: &str) {
    git(repo_path, &["push", "--quiet", remote, branch]);
}

pub fn fetch(repo_path: &Path, remote: &str) {
    git(repo_path, &["fetch", "--quiet", remote]);
}

/// Point `refs/remotes/<remote>/HEAD` at `<remote>/<branch>`.
pub fn set_remote_head(repo_path: &Path, remote: &str, branch: &str) {
    git(repo_path, &["remote", "set-head", remote, branch]);
}

/// Clone a repository (typically from a local path) and set an identity.
pub fn clone_repo(url: &str, dest: &Path) {
    let output = Command::new("git")
        .args(["clone", "--quiet", url, dest.to_str().unwrap()])
        .output()
        .expect("failed to clone repo");
    assert!(
        output.status.success(),
        "git clone failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    configure_identity(dest);
}

pub fn get_head_sha(repo_path: &Path) -> String {
    git_output(repo_path, &["rev-parse", "HEAD"])
}

/// The sha `rev` resolves to.
pub fn rev_parse(repo_path: &Path, rev: &str) -> String {
    git_output(repo_path, &["rev-parse", rev])
}

/// A linear history of `count` commits on the current branch, oldest first.
pub fn commit_chain(repo_path: &Path, prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            commit_file(
                repo_path,
                &format!("{prefix}-{i}.txt"),
                &format!("{prefix} {i}\n"),
                &format!("{prefix} commit {i}"),
            )
        })
        .collect()
}

fn configure_identity(path: &Path) {
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    git(path, &["config", "tag.gpgsign", "false"]);
}

/// Run a git command, panic on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Run a git command and return trimmed stdout.
pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
