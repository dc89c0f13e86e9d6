//! git-bard - CLI entry point.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use git_bard::git::GitRepo;
use git_bard::llm::{GeminiClient, RetryPolicy};
use git_bard::message::{BatchMessageGenerator, MessageGenerator, MessageSource};
use git_bard::rewrite::{
    Cmsg, Orchestrator, PublishGate, PublishPlan, RangeSpec, RewriteApplier, RunOptions, RunReport,
    run_checks,
};

/// Rewrite commit messages in place as conventional commits generated from each diff.
#[derive(Parser, Debug)]
#[command(name = "git-bard")]
#[command(about = "Rewrite commit messages with AI-generated conventional commits")]
#[command(version)]
struct Cli {
    /// Commits to rewrite: a revision range (HEAD~5..HEAD), a revision, or
    /// `head` for the tip only. Defaults to every commit.
    range: Option<String>,

    /// Skip the confirmation before rewriting
    #[arg(short = 'y', long)]
    yes: bool,

    /// Generate all messages in a single request before rewriting
    #[arg(long)]
    batch: bool,

    /// Model to use (overrides GIT_BARD_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Dry run - print generated messages without rewriting
    #[arg(long)]
    dry_run: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    // Step 1: Preflight checks
    println!("Preflight checks:");
    let preflight = run_checks(Path::new("."), cli.model.as_deref(), cli.dry_run)?;
    println!("  [PASS] Working tree is clean");
    if !cli.dry_run {
        println!("  [PASS] cmsg found");
    }
    println!("  [PASS] Using model {}", preflight.settings.model);
    println!();

    // Step 2: Pick the message source for the whole session
    let client = GeminiClient::new(&preflight.settings)
        .context("Failed to set up the completion client")?;
    let model = preflight.settings.model.clone();
    let policy = RetryPolicy::default();
    let mut source: Box<dyn MessageSource> = if cli.batch {
        Box::new(BatchMessageGenerator::new(client, model, policy))
    } else {
        Box::new(MessageGenerator::new(client, model, policy))
    };
    let mode = source.mode();

    let options = RunOptions {
        dry_run: cli.dry_run,
        ..RunOptions::default()
    };
    let mut orchestrator = Orchestrator::new(
        &preflight.repo,
        source.as_mut(),
        RewriteApplier::new(Cmsg),
        options,
    );

    // Step 3: Resolve the range into positions
    let spec = RangeSpec::parse(cli.range.as_deref());
    let plan = orchestrator
        .resolve(&spec)
        .context("Failed to resolve commit range")?;

    println!(
        "Found {} of {} commits to rewrite ({} mode)",
        plan.len(),
        plan.baseline_len,
        mode
    );

    if !cli.yes && !cli.dry_run {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Rewrite {} commit messages? This changes history.",
                plan.len()
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

        if !proceed {
            println!("Aborted. Nothing was changed.");
            return Ok(());
        }
    }

    // Step 4: Rewrite, highest position first
    println!();
    let report = match orchestrator.execute(&plan).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(remediation) = e.remediation() {
                eprintln!("{}", remediation);
            }
            return Err(e.into());
        }
    };

    print_summary(&report);

    if report.dry_run || report.rewritten.is_empty() {
        return Ok(());
    }

    // Step 5: Offer to publish
    offer_publish(&preflight.repo)
}

fn print_summary(report: &RunReport) {
    println!();
    if report.dry_run {
        println!(
            "Dry run: generated {} messages, skipped {}. Nothing was rewritten.",
            report.messages.len(),
            report.skipped.len()
        );
    } else {
        println!(
            "✓ Rewrote {} of {} commits (skipped {})",
            report.rewritten.len(),
            report.planned,
            report.skipped.len()
        );
    }
}

/// Ask before force-pushing; never push implicitly.
fn offer_publish(repo: &GitRepo) -> Result<()> {
    let plan = PublishPlan::detect(repo).context("Failed to inspect the current branch")?;

    if plan.upstream.is_none() {
        println!(
            "No upstream configured for '{}'. To publish the rewritten history, run:\n  {}",
            plan.branch,
            plan.command()
        );
        return Ok(());
    }

    println!();
    let pushed = PublishGate::new(plan)
        .confirm_then_execute(|plan| {
            Confirm::new()
                .with_prompt(format!("Publish with `{}`?", plan.command()))
                .default(false)
                .interact()
                .unwrap_or(false)
        })
        .context("Failed to publish rewritten history")?;

    if pushed {
        println!("✓ Pushed rewritten history");
    } else {
        println!("Not pushed. Rewritten history is local only.");
    }

    Ok(())
}
