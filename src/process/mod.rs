//! Collector subprocess boundary.
//!
//! Collectors are external programs: the engine hands them a command line
//! and a working directory and reads back exit status, stdout, and stderr.
//! A non-zero exit for one project degrades that project's result and never
//! aborts the run; timeouts are the collaborator's responsibility, not the
//! engine's.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A parsed collection command: program plus arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Split a whitespace-separated command string. Collector commands are
    /// tool invocations like `npx nx run-many -t scoremap`; no shell quoting
    /// is supported by design.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split_whitespace();
        let program = parts
            .next()
            .context("collection command must not be empty")?
            .to_string();
        Ok(Self {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }
}

impl TryFrom<String> for CommandLine {
    type Error = anyhow::Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<CommandLine> for String {
    fn from(cmd: CommandLine) -> String {
        let mut out = cmd.program;
        for arg in cmd.args {
            out.push(' ');
            out.push_str(&arg);
        }
        out
    }
}

/// Captured output of one collector invocation.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Seam for process execution so orchestration tests can run without
/// spawning anything.
pub trait ProcessRunner {
    fn run(&self, command: &CommandLine, cwd: &Path) -> Result<CommandOutput>;
}

/// Real implementation over `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandLine, cwd: &Path) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .output()
            .with_context(|| {
                format!(
                    "failed to spawn '{}' in {}",
                    command.program,
                    cwd.display()
                )
            })?;
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Directory the runner should execute a project's collection in.
pub fn project_cwd(workspace_root: &Path, project_root: &Path) -> PathBuf {
    if project_root.is_absolute() {
        project_root.to_path_buf()
    } else {
        workspace_root.join(project_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_and_args() {
        let cmd = CommandLine::parse("npx nx run-many -t scoremap").unwrap();
        assert_eq!(cmd.program, "npx");
        assert_eq!(cmd.args, vec!["nx", "run-many", "-t", "scoremap"]);
    }

    #[test]
    fn rejects_empty_command() {
        assert!(CommandLine::parse("   ").is_err());
    }

    #[test]
    fn command_line_round_trips_through_string() {
        let cmd = CommandLine::parse("npm run collect").unwrap();
        let raw: String = cmd.clone().into();
        assert_eq!(CommandLine::parse(&raw).unwrap(), cmd);
    }

    #[test]
    fn system_runner_captures_exit_status() {
        let runner = SystemRunner;
        let cmd = CommandLine::parse("true").unwrap();
        let output = runner.run(&cmd, Path::new(".")).unwrap();
        assert!(output.success());

        let cmd = CommandLine::parse("false").unwrap();
        let output = runner.run(&cmd, Path::new(".")).unwrap();
        assert!(!output.success());
        assert_eq!(output.status, 1);
    }
}
