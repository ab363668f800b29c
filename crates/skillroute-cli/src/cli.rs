//! CLI argument definitions for SkillRoute.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// SkillRoute -- route a request to the best matching skill.
#[derive(Parser)]
#[command(
    name = "skillroute",
    version,
    about = "SkillRoute -- capability routing for self-contained skills",
    long_about = "Scores every loaded skill against a request, selects the best one above \
                  the threshold, and runs it."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file with a `[routing]` table.  Defaults to `config/default.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding one subdirectory per skill.
    #[arg(long, global = true)]
    pub skills_dir: Option<PathBuf>,

    /// Minimum score required for selection, in [0, 1].
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    /// Number of top-ranked skills inspected for the threshold.
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Per-call deadline for match, guard, and execute, in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Locale passed to skills through the context (e.g. `en`, `nb`).
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Caller identity passed to skills through the context.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// How a request is read from the command line.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// The request text.  With `--json`, a JSON document.
    #[arg(required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Parse the input as JSON instead of free text.
    #[arg(long)]
    pub json: bool,

    /// Hints as a JSON object, e.g. `{"lang": "en"}`.
    #[arg(long)]
    pub hints: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a request and run the selected skill.
    Run {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Show how every skill scores a request, without running anything.
    Route {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// List the loaded skills.
    List,

    /// Start an interactive session.
    Repl,
}
