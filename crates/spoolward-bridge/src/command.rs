// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subprocess helper shared by the shell-based backends.

use std::process::Command;

use tracing::debug;

/// Outcome of a finished command.
pub(crate) struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// The most useful single-line description of a failure.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.lines().next().unwrap_or(stderr).to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.lines().next().unwrap_or(stdout).to_string();
        }
        "command exited with a non-zero status".into()
    }
}

/// Run `program` with `args` under the C locale and capture its output.
///
/// Spawn failures (e.g. the tool is not installed) come back as `Err`;
/// a non-zero exit comes back as `Ok` with `success == false`.
pub(crate) fn run(program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
    debug!(program, ?args, "running spooler command");
    let output = Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .env("LANG", "C")
        .output()?;

    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
