// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;
pub mod config;
mod engine;
mod kubernetes;
mod matcher;
mod output;
mod table;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::prelude::*;

use cli::{Args, Command, GetArgs};
use config::Config;
use engine::{Action, Engine, Invocation};
use kubernetes::{CommandSpec, KindRegistry, exit_code};
use matcher::MatchSpec;
use output::RowFormat;

/// The only resource kind the reconcile action applies to.
const RECONCILABLE_KIND: &str = "kustomizations";

/// Initialize logging with file output and optional stderr.
///
/// All tracing output goes to a rotating file under ~/.kmatch/log/ so stdout
/// stays reserved for row data; --verbose mirrors it to stderr.
fn init_logging(verbose: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};

    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return;
    }

    // Max 10MB per file, keep up to 5 files, also rotate daily
    let condition = RollingConditionBase::new().daily().max_size(10 * 1024 * 1024);
    let file_appender =
        match RollingFileAppenderBase::new(log_dir.join("kmatch.log"), condition, 5) {
            Ok(appender) => appender,
            Err(e) => {
                eprintln!("Warning: Could not create log file: {}", e);
                return;
            }
        };

    let (non_blocking, guard) = file_appender.get_non_blocking_appender();
    // Leak the guard to keep the background writer alive
    std::mem::forget(guard);

    let filter = if verbose { "kmatch=debug" } else { "kmatch=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    if verbose {
        let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load()?;
    let code = run(&args, &config)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn run(args: &Args, config: &Config) -> Result<i32> {
    // Passthrough actions skip kind resolution and row matching entirely.
    match &args.command {
        Some(Command::Explain { args: rest }) => {
            let cmd = CommandSpec::new(&config.kubectl)
                .arg("explain")
                .args(rest.iter().cloned());
            return passthrough(cmd, args.dry_run);
        }
        Some(Command::Build { args: rest }) => {
            let cmd = CommandSpec::new(&config.flux)
                .arg("build")
                .arg("kustomization")
                .args(rest.iter().cloned());
            return passthrough(cmd, args.dry_run);
        }
        _ => {}
    }

    let (kind_arg, action, kubectl_args) = match &args.command {
        None => from_get(&args.get)?,
        Some(Command::Get(get)) => from_get(get)?,
        Some(Command::Delete { kind, kubectl_args }) => {
            (kind.clone(), Action::Delete, kubectl_args.clone())
        }
        Some(Command::Edit { kind, kubectl_args }) => {
            (kind.clone(), Action::Edit, kubectl_args.clone())
        }
        Some(Command::Logs { kind, follow, container, kubectl_args }) => (
            kind.clone(),
            Action::Logs {
                follow: *follow,
                container: container.clone(),
            },
            kubectl_args.clone(),
        ),
        Some(Command::Shell { kind, container, no_tty, no_stdin, kubectl_args }) => (
            kind.clone(),
            Action::Shell {
                container: container.clone(),
                tty: !no_tty,
                stdin: !no_stdin,
            },
            kubectl_args.clone(),
        ),
        Some(Command::Containers { kind, kubectl_args }) => {
            (kind.clone(), Action::Containers, kubectl_args.clone())
        }
        Some(Command::Reconcile { kind, kubectl_args }) => {
            (kind.clone(), Action::Reconcile, kubectl_args.clone())
        }
        Some(Command::Explain { .. }) | Some(Command::Build { .. }) => unreachable!(),
    };

    let registry = KindRegistry::load(&config.kubectl)?;
    let kind = registry
        .resolve(&kind_arg)
        .map(str::to_string)
        .with_context(|| format!("unknown resource kind: {}", kind_arg))?;
    if matches!(action, Action::Reconcile) && kind != RECONCILABLE_KIND {
        bail!("reconcile only applies to {}, not {}", RECONCILABLE_KIND, kind);
    }

    let matchspec = match &args.filters {
        Some(expr) => MatchSpec::parse(expr)?,
        None => MatchSpec::default(),
    };
    let format = if args.preserve_columns {
        RowFormat::PreserveColumns
    } else {
        RowFormat::Tab
    };

    let inv = Invocation {
        kind,
        action,
        matchspec,
        format,
        dry_run: args.dry_run,
        force: args.force,
        kubectl_args,
    };
    Engine::new(config, inv).run()
}

fn from_get(get: &GetArgs) -> Result<(String, Action, Vec<String>)> {
    let kind = get
        .kind
        .clone()
        .context("resource kind required (e.g. kmatch pods)")?;
    Ok((kind, Action::Get { raw: get.raw }, get.kubectl_args.clone()))
}

fn passthrough(cmd: CommandSpec, dry_run: bool) -> Result<i32> {
    if dry_run {
        println!("{}", cmd);
        return Ok(0);
    }
    let status = cmd.run()?;
    Ok(exit_code(status))
}
