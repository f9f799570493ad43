//! Git output parsing helpers.

use std::process::Output;

/// Formats a git error with both stdout and stderr for better debugging.
pub fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}

/// Parses the object id printed by `git rev-parse`.
///
/// Accepts SHA-1 (40) and SHA-256 (64) hex ids.
pub fn parse_commit_id(stdout: &[u8]) -> Option<String> {
    let id = String::from_utf8_lossy(stdout).trim().to_string();
    let valid_len = id.len() == 40 || id.len() == 64;
    (valid_len && id.bytes().all(|b| b.is_ascii_hexdigit())).then_some(id)
}

/// Parses a branch name from `git symbolic-ref --short HEAD` output.
pub fn parse_branch(stdout: &[u8]) -> Option<String> {
    let branch = String::from_utf8_lossy(stdout).trim().to_string();
    (!branch.is_empty()).then_some(branch)
}
