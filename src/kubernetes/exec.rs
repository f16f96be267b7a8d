// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! External-process invocation.
//!
//! Every external tool is reached through an argument vector, never a shell
//! string, so no quoting is ever needed. Three run modes cover the callers:
//! captured output (kind listing, container probe), streamed stdout (the row
//! source), and terminal inheritance (edit, shell, followed logs).

use std::fmt;
use std::io::BufReader;
use std::process::{Child, ChildStdout, Command, ExitStatus, Output, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

/// Exit code to report for a child that died without one (e.g. killed by a
/// signal).
const SIGNALED_EXIT_CODE: i32 = 1;

/// A fully-specified external command: program plus argument vector.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self) -> Command {
        debug!("running: {}", self);
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run with all stdio inherited. Blocks until the child exits; used for
    /// interactive and streaming children that own the terminal.
    pub fn run(&self) -> Result<ExitStatus> {
        self.command()
            .status()
            .with_context(|| format!("failed to run {}", self.program))
    }

    /// Run with captured stdout/stderr.
    pub fn output(&self) -> Result<Output> {
        self.command()
            .output()
            .with_context(|| format!("failed to run {}", self.program))
    }

    /// Run captured, failing on a non-zero exit, and return stdout as UTF-8.
    pub fn output_text(&self) -> Result<String> {
        let output = self.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {}: {}",
                self.program,
                exit_code(output.status),
                stderr.trim_end()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Spawn with stdout piped (stderr inherited) for line-by-line
    /// streaming. The caller must wait on the returned child.
    pub fn spawn_streaming(&self) -> Result<(Child, BufReader<ChildStdout>)> {
        let mut child = self
            .command()
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run {}", self.program))?;
        let stdout = child
            .stdout
            .take()
            .with_context(|| format!("no stdout pipe from {}", self.program))?;
        Ok((child, BufReader::new(stdout)))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Extract the exit code from a child status.
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNALED_EXIT_CODE)
}
