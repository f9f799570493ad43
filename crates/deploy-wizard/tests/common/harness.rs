//! Test harness for isolated pipeline runs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use deploy_wizard::{Pipeline, Renderer};

/// Directory of the templates shipped with the crate.
pub fn templates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

pub fn renderer() -> Renderer {
    Renderer::new(templates_dir()).expect("shipped templates should compile")
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(renderer())
}

/// Returns true if a `git` executable can be run.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Runs git in `dir` and returns trimmed stdout, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Scratch directory with an optional bare "remote" repository.
pub struct TestHarness {
    temp_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Creates a bare repository seeded with one commit on `main` and
    /// returns its `file://` URL.
    pub fn init_remote(&self) -> String {
        let seed = self.path().join("seed");
        std::fs::create_dir_all(&seed).expect("failed to create seed dir");
        git(&seed, &["init", "--quiet"]);
        git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        std::fs::write(seed.join("README.md"), "deploy repository\n").expect("write README");
        git(&seed, &["add", "README.md"]);
        git(
            &seed,
            &[
                "-c",
                "user.name=seed",
                "-c",
                "user.email=seed@example.com",
                "commit",
                "-m",
                "initial",
            ],
        );

        let remote = self.remote_path();
        git(
            self.path(),
            &[
                "clone",
                "--bare",
                "--quiet",
                seed.to_str().expect("utf-8 path"),
                remote.to_str().expect("utf-8 path"),
            ],
        );
        format!("file://{}", remote.display())
    }

    pub fn remote_path(&self) -> PathBuf {
        self.path().join("remote.git")
    }

    /// Runs git against the bare remote.
    pub fn remote_git(&self, args: &[&str]) -> String {
        git(&self.remote_path(), args)
    }
}
