//! CLI entry point for SkillRoute.
//!
//! This binary provides the `skillroute` command: it loads skills from a
//! directory, binds the built-in modules, and routes requests to them.

mod builtin;
mod cli;
mod config;
mod repl;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use serde_json::{Map, Value};
use skillroute_core::{
    OrchestratorOptions, Skill, SkillContext, SkillIO, SkillOrchestrator, SkillRegistry,
    TracingObserver,
};
use skillroute_skills::load_skills_from_dir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, GlobalArgs, RequestArgs};
use crate::config::Settings;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(if cli.global.verbose { "debug" } else { "warn" });

    let settings = config::load_settings(&cli.global)?;
    let skills = load_skills(&settings)?;
    let ctx = build_context(&cli.global);
    let options = settings
        .routing
        .into_options()
        .with_observer(Arc::new(TracingObserver));

    match cli.command {
        Commands::Run { request } => cmd_run(skills, options, ctx, &request).await,
        Commands::Route { request } => cmd_route(skills, options, ctx, &request).await,
        Commands::List => cmd_list(&skills),
        Commands::Repl => repl::cmd_repl(skills, ctx, options).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn cmd_run(
    skills: Vec<Arc<dyn Skill>>,
    options: OrchestratorOptions,
    ctx: SkillContext,
    request: &RequestArgs,
) -> Result<()> {
    let orchestrator = orchestrator(skills, options);
    let io = build_io(request)?;

    let output = orchestrator
        .run(&io, &ctx)
        .await
        .context("skill run failed")?;
    print_json(&output)
}

async fn cmd_route(
    skills: Vec<Arc<dyn Skill>>,
    options: OrchestratorOptions,
    ctx: SkillContext,
    request: &RequestArgs,
) -> Result<()> {
    let threshold = options.threshold;
    let orchestrator = orchestrator(skills, options);
    let io = build_io(request)?;

    let route = orchestrator.route(&io, &ctx).await;
    for (rank, entry) in route.ranked.iter().enumerate() {
        let marker = match &route.skill {
            Some(selected) if Arc::ptr_eq(selected, &entry.skill) => "*",
            _ => " ",
        };
        println!("{marker} {:>2}. {:<24} {:.3}", rank + 1, entry.skill.name(), entry.score);
    }

    match &route.skill {
        Some(skill) => println!("\nselected `{}` (score {:.3})", skill.name(), route.score),
        None => println!(
            "\nno skill selected (best {:.3}, threshold {threshold:.3})",
            route.best_score()
        ),
    }
    Ok(())
}

fn cmd_list(skills: &[Arc<dyn Skill>]) -> Result<()> {
    if skills.is_empty() {
        println!("No skills loaded.");
        return Ok(());
    }

    for skill in skills {
        println!(
            "{:<24} {:<8} {}",
            skill.name(),
            skill.version().unwrap_or("-"),
            skill.summary().unwrap_or("")
        );
        if !skill.tags().is_empty() {
            println!("{:<24} tags: {}", "", skill.tags().join(", "));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initialize the `tracing` subscriber with an env-filter.
///
/// `RUST_LOG` wins over `default_level`.  Logs go to stderr so that command
/// output on stdout stays machine-readable.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_skills(settings: &Settings) -> Result<Vec<Arc<dyn Skill>>> {
    let skills = load_skills_from_dir(&settings.skills_dir, &builtin::module_table())
        .with_context(|| format!("failed to load skills from `{}`", settings.skills_dir.display()))?;
    info!(count = skills.len(), dir = %settings.skills_dir.display(), "skills ready");
    Ok(skills)
}

fn orchestrator(skills: Vec<Arc<dyn Skill>>, options: OrchestratorOptions) -> SkillOrchestrator {
    let registry = SkillRegistry::new();
    registry.register_all(skills);
    SkillOrchestrator::new(registry, options)
}

fn build_context(args: &GlobalArgs) -> SkillContext {
    let mut ctx = SkillContext::new().with_now(Utc::now());
    if let Some(locale) = &args.locale {
        ctx = ctx.with_locale(locale.clone());
    }
    if let Some(user) = &args.user {
        ctx = ctx.with_user(user.clone());
    }
    ctx
}

fn build_io(request: &RequestArgs) -> Result<SkillIO> {
    let text = request.input.join(" ");
    let input = if request.json {
        serde_json::from_str(&text).context("--json input is not valid JSON")?
    } else {
        Value::String(text)
    };

    let mut io = SkillIO::new(input);
    if let Some(hints) = &request.hints {
        let hints: Map<String, Value> =
            serde_json::from_str(hints).context("--hints must be a JSON object")?;
        io = io.with_hints(hints);
    }
    Ok(io)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}
