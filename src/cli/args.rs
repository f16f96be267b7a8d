// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "kmatch")]
#[command(author, version, about = "Filter kubectl table output and act on the matching rows")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Without a subcommand, behaves like `kmatch get`
    #[command(flatten)]
    pub get: GetArgs,

    /// Column filters: comma-separated INDEX=REGEX pairs with 1-based
    /// indices. INDEX=!REGEX keeps rows that do NOT match; "\," escapes a
    /// comma inside a regex. Example: -m '1=web,3=!Running'
    #[arg(short = 'm', long = "match", value_name = "FILTERS", global = true)]
    pub filters: Option<String>,

    /// Print the commands that would run instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Keep going after a per-row failure (and skip delete confirmations)
    #[arg(long, global = true)]
    pub force: bool,

    /// Re-emit rows in the source table's fixed-width layout instead of
    /// tab-joined
    #[arg(short = 'p', long, global = true)]
    pub preserve_columns: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct GetArgs {
    /// Resource kind (plural, singular, or short alias)
    pub kind: Option<String>,

    /// Re-fetch each matching resource individually and print the raw
    /// kubectl output
    #[arg(long)]
    pub raw: bool,

    /// Extra arguments passed through to the listing command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub kubectl_args: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print matching rows (tab-joined, or fixed-width with -p)
    Get(GetArgs),

    /// Delete each matching resource, asking per row unless --force
    Delete {
        /// Resource kind (plural, singular, or short alias)
        kind: String,

        /// Extra arguments passed through to the listing command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        kubectl_args: Vec<String>,
    },

    /// Open each matching resource in the interactive editor
    Edit {
        /// Resource kind (plural, singular, or short alias)
        kind: String,

        /// Extra arguments passed through to the listing command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        kubectl_args: Vec<String>,
    },

    /// Fetch logs for each matching resource
    Logs {
        /// Resource kind (plural, singular, or short alias)
        kind: String,

        /// Follow the log stream
        #[arg(short, long)]
        follow: bool,

        /// Limit to one container (default: all containers)
        #[arg(short, long)]
        container: Option<String>,

        /// Extra arguments passed through to the listing command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        kubectl_args: Vec<String>,
    },

    /// Start an interactive shell in each matching pod
    Shell {
        /// Resource kind (plural, singular, or short alias)
        kind: String,

        /// Container to enter (default: the pod's first container)
        #[arg(short, long)]
        container: Option<String>,

        /// Do not allocate a TTY
        #[arg(long)]
        no_tty: bool,

        /// Do not forward stdin
        #[arg(long)]
        no_stdin: bool,

        /// Extra arguments passed through to the listing command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        kubectl_args: Vec<String>,
    },

    /// List the containers of each matching resource
    Containers {
        /// Resource kind (plural, singular, or short alias)
        kind: String,

        /// Extra arguments passed through to the listing command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        kubectl_args: Vec<String>,
    },

    /// Reconcile each matching kustomization with its source
    Reconcile {
        /// Resource kind (must resolve to kustomizations)
        kind: String,

        /// Extra arguments passed through to the listing command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        kubectl_args: Vec<String>,
    },

    /// Pass through to `kubectl explain` (no row matching)
    Explain {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Pass through to `flux build kustomization` (no row matching)
    Build {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
