// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The row decoder/filter/dispatcher.
//!
//! Streams the listing command's output, detects the column layout from the
//! first line, filters every following row through the matchspec, and runs
//! the configured action once per surviving row, strictly in arrival order.
//! Several actions are interactive (delete confirmation, edit, shell), so
//! rows are deliberately processed one at a time; a child that owns the
//! terminal blocks the loop until it exits.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use console::{Term, style};
use tracing::debug;

use crate::config::Config;
use crate::kubernetes::{CommandSpec, containers, exit_code};
use crate::matcher::MatchSpec;
use crate::output::RowFormat;
use crate::table::Layout;

/// Shown in dry-run shell commands instead of probing the pod for its
/// first container.
const CONTAINER_PLACEHOLDER: &str = "<first-container>";

/// The per-row action, chosen once per invocation.
#[derive(Debug, Clone)]
pub enum Action {
    /// Print the row; with `raw`, re-fetch the resource and print the
    /// unmodified kubectl output instead.
    Get { raw: bool },
    Delete,
    Edit,
    Logs {
        follow: bool,
        container: Option<String>,
    },
    Shell {
        container: Option<String>,
        tty: bool,
        stdin: bool,
    },
    /// One line per container: namespace, name, container name.
    Containers,
    Reconcile,
}

/// Everything one invocation needs, resolved up front and immutable.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Canonical plural kind name
    pub kind: String,
    pub action: Action,
    pub matchspec: MatchSpec,
    pub format: RowFormat,
    pub dry_run: bool,
    pub force: bool,
    /// Extra arguments forwarded to the listing command
    pub kubectl_args: Vec<String>,
}

/// Per-row outcome: keep going, or stop with an exit code to propagate.
enum Flow {
    Continue,
    Stop(i32),
}

pub struct Engine<'a> {
    config: &'a Config,
    inv: Invocation,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a Config, inv: Invocation) -> Self {
        Self { config, inv }
    }

    /// Run the full pipeline against a live listing child process.
    /// Returns the exit code to report.
    pub fn run(&self) -> Result<i32> {
        let listing = CommandSpec::new(&self.config.kubectl)
            .arg("get")
            .arg(&self.inv.kind)
            .args(self.inv.kubectl_args.iter().cloned());
        let (mut child, reader) = listing.spawn_streaming()?;

        let stdout = std::io::stdout();
        let code = self.process(reader, &mut stdout.lock())?;

        let status = child.wait().context("failed to wait for listing command")?;
        if code != 0 {
            return Ok(code);
        }
        if !status.success() {
            return Ok(exit_code(status));
        }
        Ok(0)
    }

    /// Decode, filter and dispatch every row from `reader`. Row output and
    /// dry-run command echoes go to `writer`; diagnostics go to stderr.
    fn process<R: BufRead, W: Write>(&self, reader: R, writer: &mut W) -> Result<i32> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line.context("failed to read listing output")?,
            // No output at all ("No resources found" goes to stderr):
            // empty result, not a malformed header.
            None => {
                warn_no_matches();
                return Ok(0);
            }
        };
        let layout = Layout::detect(&header)?;
        self.inv.matchspec.validate(layout.len())?;
        let namespaced = layout.is_namespaced();
        debug!(columns = layout.len(), namespaced, "detected table layout");

        let mut matched = 0usize;
        for line in lines {
            let line = line.context("failed to read listing output")?;
            if line.is_empty() {
                continue;
            }
            let row = layout.decode(&line);
            if !self.inv.matchspec.matches(&row) {
                continue;
            }
            matched += 1;
            match self.dispatch(&layout, &row, namespaced, writer)? {
                Flow::Continue => {}
                Flow::Stop(code) => return Ok(code),
            }
        }

        if matched == 0 {
            warn_no_matches();
        }
        Ok(0)
    }

    fn dispatch<W: Write>(
        &self,
        layout: &Layout,
        row: &[String],
        namespaced: bool,
        writer: &mut W,
    ) -> Result<Flow> {
        let (namespace, name) = split_target(row, namespaced);

        match &self.inv.action {
            Action::Get { raw: false } => {
                writeln!(writer, "{}", self.inv.format.format(layout, row))?;
                Ok(Flow::Continue)
            }

            Action::Get { raw: true } => {
                let cmd = self
                    .kubectl()
                    .arg("get")
                    .arg(&self.inv.kind)
                    .arg(name)
                    .args(ns_args(namespace));
                if self.inv.dry_run {
                    writeln!(writer, "{}", cmd)?;
                    return Ok(Flow::Continue);
                }
                let status = cmd.run()?;
                if !status.success() {
                    return Ok(Flow::Stop(exit_code(status)));
                }
                Ok(Flow::Continue)
            }

            Action::Delete => {
                let cmd = self
                    .kubectl()
                    .arg("delete")
                    .arg(&self.inv.kind)
                    .arg(name)
                    .args(ns_args(namespace));
                if self.inv.dry_run {
                    writeln!(writer, "{}", cmd)?;
                    return Ok(Flow::Continue);
                }
                if !self.inv.force && !confirm_delete(&self.inv.kind, namespace, name)? {
                    return Ok(Flow::Continue);
                }
                let status = cmd.run()?;
                if !status.success() {
                    return self.row_failure("delete", name, exit_code(status));
                }
                Ok(Flow::Continue)
            }

            Action::Edit => {
                let cmd = self
                    .kubectl()
                    .arg("edit")
                    .arg(&self.inv.kind)
                    .arg(name)
                    .args(ns_args(namespace));
                if self.inv.dry_run {
                    writeln!(writer, "{}", cmd)?;
                    return Ok(Flow::Continue);
                }
                let status = cmd.run()?;
                if !status.success() {
                    return self.row_failure("edit", name, exit_code(status));
                }
                Ok(Flow::Continue)
            }

            Action::Logs { follow, container } => {
                let mut cmd = self.kubectl().arg("logs").arg(name).args(ns_args(namespace));
                match container {
                    Some(c) => cmd = cmd.arg("-c").arg(c),
                    None => cmd = cmd.arg("--all-containers"),
                }
                if *follow {
                    cmd = cmd.arg("-f");
                }
                if self.inv.dry_run {
                    writeln!(writer, "{}", cmd)?;
                    return Ok(Flow::Continue);
                }
                let status = cmd.run()?;
                if !status.success() {
                    return Ok(Flow::Stop(exit_code(status)));
                }
                Ok(Flow::Continue)
            }

            Action::Shell { container, tty, stdin } => {
                let container = match container {
                    Some(c) => c.clone(),
                    None if self.inv.dry_run => CONTAINER_PLACEHOLDER.to_string(),
                    None => match self.probe_first_container(namespace, name) {
                        Ok(c) => {
                            eprintln!(
                                "Warning: no container specified; entering first container {:?} of {}",
                                c, name
                            );
                            c
                        }
                        Err(e) if self.inv.force => {
                            eprintln!("Warning: skipping {}: {:#}", name, e);
                            return Ok(Flow::Continue);
                        }
                        Err(e) => return Err(e),
                    },
                };
                let mut cmd = self.kubectl().arg("exec");
                if *stdin {
                    cmd = cmd.arg("-i");
                }
                if *tty {
                    cmd = cmd.arg("-t");
                }
                let cmd = cmd
                    .args(ns_args(namespace))
                    .arg(name)
                    .arg("-c")
                    .arg(container)
                    .arg("--")
                    .arg(&self.config.exec_shell);
                if self.inv.dry_run {
                    writeln!(writer, "{}", cmd)?;
                    return Ok(Flow::Continue);
                }
                let status = cmd.run()?;
                if !status.success() {
                    return self.row_failure("shell", name, exit_code(status));
                }
                Ok(Flow::Continue)
            }

            Action::Containers => {
                let cmd = self
                    .kubectl()
                    .arg("get")
                    .arg(&self.inv.kind)
                    .arg(name)
                    .args(ns_args(namespace))
                    .args(["-o", "json"]);
                if self.inv.dry_run {
                    writeln!(writer, "{}", cmd)?;
                    return Ok(Flow::Continue);
                }
                let output = cmd.output()?;
                if !output.status.success() {
                    eprint!("{}", String::from_utf8_lossy(&output.stderr));
                    return Ok(Flow::Stop(exit_code(output.status)));
                }
                let document = String::from_utf8_lossy(&output.stdout);
                for container in containers::container_names(&document)? {
                    match namespace {
                        Some(ns) => writeln!(writer, "{}\t{}\t{}", ns, name, container)?,
                        None => writeln!(writer, "{}\t{}", name, container)?,
                    }
                }
                Ok(Flow::Continue)
            }

            Action::Reconcile => {
                let cmd = CommandSpec::new(&self.config.flux)
                    .arg("reconcile")
                    .arg("kustomization")
                    .arg(name)
                    .args(ns_args(namespace))
                    .arg("--with-source");
                if self.inv.dry_run {
                    writeln!(writer, "{}", cmd)?;
                    return Ok(Flow::Continue);
                }
                let status = cmd.run()?;
                if !status.success() {
                    return Ok(Flow::Stop(exit_code(status)));
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn kubectl(&self) -> CommandSpec {
        CommandSpec::new(&self.config.kubectl)
    }

    /// Fetch the resource document and return its first container name.
    fn probe_first_container(&self, namespace: Option<&str>, name: &str) -> Result<String> {
        let document = self
            .kubectl()
            .arg("get")
            .arg(&self.inv.kind)
            .arg(name)
            .args(ns_args(namespace))
            .args(["-o", "json"])
            .output_text()?;
        containers::first_container(&document)
            .with_context(|| format!("no container to enter in {}", name))
    }

    /// Fail-fast by default; --force downgrades the failure to a warning.
    fn row_failure(&self, what: &str, name: &str, code: i32) -> Result<Flow> {
        if self.inv.force {
            eprintln!("Warning: {} failed for {} (exit {}), continuing", what, name, code);
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Stop(code))
        }
    }
}

/// Namespaced listings carry (namespace, name) in columns 0 and 1; anything
/// else carries the name in column 0 and no namespace.
fn split_target(row: &[String], namespaced: bool) -> (Option<&str>, &str) {
    if namespaced {
        (
            row.first().map(String::as_str),
            row.get(1).map(String::as_str).unwrap_or(""),
        )
    } else {
        (None, row.first().map(String::as_str).unwrap_or(""))
    }
}

fn ns_args(namespace: Option<&str>) -> Vec<String> {
    match namespace {
        Some(ns) => vec!["-n".to_string(), ns.to_string()],
        None => Vec::new(),
    }
}

fn warn_no_matches() {
    eprintln!("Warning: no rows matched (filters may be too strict)");
}

fn confirm_delete(kind: &str, namespace: Option<&str>, name: &str) -> Result<bool> {
    let target = match namespace {
        Some(ns) => format!("{}/{} (in {})", kind, name, ns),
        None => format!("{}/{}", kind, name),
    };
    let term = Term::stderr();
    term.write_str(&format!("delete {}? [y/N] ", style(target).red()))?;
    let answer = term.read_line()?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LISTING: &str = "\
NAMESPACE NAME      STATUS
default   pod-a     Running
kube-sys  pod-b     Pending
";

    fn invocation(action: Action, filters: &str) -> Invocation {
        Invocation {
            kind: "pods".to_string(),
            action,
            matchspec: MatchSpec::parse(filters).unwrap(),
            format: RowFormat::Tab,
            dry_run: false,
            force: false,
            kubectl_args: Vec::new(),
        }
    }

    fn run_engine(inv: Invocation, input: &str) -> (i32, String) {
        let config = Config::default();
        let engine = Engine::new(&config, inv);
        let mut out = Vec::new();
        let code = engine.process(Cursor::new(input), &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_get_emits_tab_joined_rows() {
        let (code, out) = run_engine(invocation(Action::Get { raw: false }, ""), LISTING);
        assert_eq!(code, 0);
        assert_eq!(out, "default\tpod-a\tRunning\nkube-sys\tpod-b\tPending\n");
    }

    #[test]
    fn test_get_preserve_columns_roundtrips_fields() {
        let mut inv = invocation(Action::Get { raw: false }, "");
        inv.format = RowFormat::PreserveColumns;
        let (code, out) = run_engine(inv, LISTING);
        assert_eq!(code, 0);
        let layout = Layout::detect("NAMESPACE NAME      STATUS").unwrap();
        let rows: Vec<Vec<String>> = out.lines().map(|l| layout.decode(l)).collect();
        assert_eq!(rows[0], ["default", "pod-a", "Running"]);
        assert_eq!(rows[1], ["kube-sys", "pod-b", "Pending"]);
    }

    #[test]
    fn test_include_filter_keeps_only_matching_rows() {
        let (code, out) = run_engine(invocation(Action::Get { raw: false }, "3=Running"), LISTING);
        assert_eq!(code, 0);
        assert_eq!(out, "default\tpod-a\tRunning\n");
    }

    #[test]
    fn test_exclude_filter_inverts() {
        let (code, out) = run_engine(invocation(Action::Get { raw: false }, "3=!Running"), LISTING);
        assert_eq!(code, 0);
        assert_eq!(out, "kube-sys\tpod-b\tPending\n");
    }

    #[test]
    fn test_header_row_is_exempt_from_filtering() {
        // The header would match 2=NAME but must never be dispatched.
        let (code, out) = run_engine(invocation(Action::Get { raw: false }, "2=NAME"), LISTING);
        assert_eq!(code, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn test_zero_matches_exits_zero() {
        let (code, out) = run_engine(
            invocation(Action::Get { raw: false }, "3=NoSuchStatus"),
            LISTING,
        );
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_input_exits_zero() {
        let (code, out) = run_engine(invocation(Action::Get { raw: false }, ""), "");
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_short_rows_are_padded_not_fatal() {
        let input = "NAMESPACE NAME      STATUS\ndefault\n";
        let (code, out) = run_engine(invocation(Action::Get { raw: false }, ""), input);
        assert_eq!(code, 0);
        assert_eq!(out, "default\t\t\n");
    }

    #[test]
    fn test_filter_index_out_of_range_is_fatal() {
        let config = Config::default();
        let engine = Engine::new(&config, invocation(Action::Get { raw: false }, "7=x"));
        let mut out = Vec::new();
        assert!(engine.process(Cursor::new(LISTING), &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_malformed_header_is_fatal() {
        let config = Config::default();
        let engine = Engine::new(&config, invocation(Action::Get { raw: false }, ""));
        let mut out = Vec::new();
        let input = "error: something went wrong\n";
        assert!(engine.process(Cursor::new(input), &mut out).is_err());
    }

    #[test]
    fn test_dry_run_delete_echoes_namespaced_commands() {
        let mut inv = invocation(Action::Delete, "");
        inv.dry_run = true;
        let (code, out) = run_engine(inv, LISTING);
        assert_eq!(code, 0);
        assert_eq!(
            out,
            "kubectl delete pods pod-a -n default\nkubectl delete pods pod-b -n kube-sys\n"
        );
    }

    #[test]
    fn test_dry_run_delete_cluster_scoped_has_no_namespace() {
        let input = "NAME      STATUS\nnode-1    Ready\n";
        let mut inv = invocation(Action::Delete, "");
        inv.kind = "nodes".to_string();
        inv.dry_run = true;
        let (code, out) = run_engine(inv, input);
        assert_eq!(code, 0);
        assert_eq!(out, "kubectl delete nodes node-1\n");
    }

    #[test]
    fn test_dry_run_logs_all_containers_and_follow() {
        let mut inv = invocation(
            Action::Logs {
                follow: true,
                container: None,
            },
            "",
        );
        inv.dry_run = true;
        let (_, out) = run_engine(inv, LISTING);
        assert_eq!(
            out.lines().next().unwrap(),
            "kubectl logs pod-a -n default --all-containers -f"
        );
    }

    #[test]
    fn test_dry_run_logs_single_container() {
        let mut inv = invocation(
            Action::Logs {
                follow: false,
                container: Some("app".to_string()),
            },
            "1=default",
        );
        inv.dry_run = true;
        let (_, out) = run_engine(inv, LISTING);
        assert_eq!(out, "kubectl logs pod-a -n default -c app\n");
    }

    #[test]
    fn test_dry_run_shell_uses_placeholder_container() {
        let mut inv = invocation(
            Action::Shell {
                container: None,
                tty: true,
                stdin: true,
            },
            "2=pod-a",
        );
        inv.dry_run = true;
        let (_, out) = run_engine(inv, LISTING);
        assert_eq!(
            out,
            "kubectl exec -i -t -n default pod-a -c <first-container> -- /bin/sh\n"
        );
    }

    #[test]
    fn test_dry_run_shell_explicit_container_no_tty() {
        let mut inv = invocation(
            Action::Shell {
                container: Some("sidecar".to_string()),
                tty: false,
                stdin: true,
            },
            "2=pod-b",
        );
        inv.dry_run = true;
        let (_, out) = run_engine(inv, LISTING);
        assert_eq!(
            out,
            "kubectl exec -i -n kube-sys pod-b -c sidecar -- /bin/sh\n"
        );
    }

    #[test]
    fn test_dry_run_reconcile() {
        let mut inv = invocation(Action::Reconcile, "");
        inv.kind = "kustomizations".to_string();
        inv.dry_run = true;
        let input = "NAMESPACE NAME    READY\nflux-sys  infra   True\n";
        let (_, out) = run_engine(inv, input);
        assert_eq!(
            out,
            "flux reconcile kustomization infra -n flux-sys --with-source\n"
        );
    }

    #[test]
    fn test_dry_run_get_raw() {
        let mut inv = invocation(Action::Get { raw: true }, "2=pod-a");
        inv.dry_run = true;
        let (_, out) = run_engine(inv, LISTING);
        assert_eq!(out, "kubectl get pods pod-a -n default\n");
    }

    #[test]
    fn test_dry_run_containers_probe() {
        let mut inv = invocation(Action::Containers, "2=pod-a");
        inv.dry_run = true;
        let (_, out) = run_engine(inv, LISTING);
        assert_eq!(out, "kubectl get pods pod-a -n default -o json\n");
    }

    #[test]
    fn test_split_target_namespaced() {
        let row: Vec<String> = ["default", "pod-a", "Running"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(split_target(&row, true), (Some("default"), "pod-a"));
        assert_eq!(split_target(&row, false), (None, "default"));
    }
}
