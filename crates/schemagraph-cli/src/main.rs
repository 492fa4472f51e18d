use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemagraph_catalog::Dsn;
use schemagraph_core::{Config, Report, Schema, Severity};
use schemagraph_engine::SnapshotDiff;

/// Config file looked up in the working directory when --config is absent
const DEFAULT_CONFIG_FILE: &str = "schemagraph.toml";

/// schemagraph - Database schema snapshots with resolved relations
#[derive(Parser)]
#[command(name = "schemagraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemagraph.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a data source and write its schema snapshot
    Out {
        /// Data source (json://file, file.json, pg://...)
        #[arg(short, long)]
        dsn: Option<String>,

        /// Output file for the snapshot (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep tables and columns in source order
        #[arg(long)]
        no_sort: bool,
    },

    /// Compare an expected schema against an actual one
    Diff {
        /// Expected schema (DSN or snapshot path)
        expected: String,

        /// Actual schema (DSN or snapshot path)
        actual: String,

        /// Output file for report.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the SHA-256 fingerprint of a schema's canonical snapshot
    Fingerprint {
        /// Data source (json://file, file.json, pg://...)
        #[arg(short, long)]
        dsn: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Out { dsn, output, no_sort } => {
            out_command(&config, dsn.as_deref(), output.as_deref(), no_sort, cli.verbose).await
        }
        Commands::Diff { expected, actual, output } => {
            diff_command(&config, &expected, &actual, output.as_deref(), cli.verbose).await
        }
        Commands::Fingerprint { dsn } => fingerprint_command(&config, dsn.as_deref()).await,
    }
}

/// Analyze a data source and apply the config's additional data
///
/// Overrides are applied to every source, snapshots included. Relation
/// overrides the schema already carries as additional relations are
/// skipped, so a snapshot written by `out` can be loaded with the same
/// config without doubling its relations.
async fn load_schema(config: &Config, dsn: &str, verbose: bool) -> Result<Schema> {
    let parsed = Dsn::parse(dsn)?;
    if verbose {
        eprintln!("{} {}", "Analyzing".cyan(), parsed);
    }

    let source = parsed.connect().await?;
    let mut schema = source
        .analyze()
        .await
        .with_context(|| format!("Failed to analyze {}", parsed))?;

    let additional = config.additional_data().pending_for(&schema);
    if !additional.is_empty() {
        schema
            .load_additional_data(&additional)
            .context("Failed to merge additional data from config")?;

        if verbose {
            eprintln!(
                "{} {} overrides",
                "Merged".cyan(),
                additional.overrides.len()
            );
        }
    }

    tracing::debug!(
        schema = %schema.name,
        tables = schema.tables.len(),
        relations = schema.relations.len(),
        "loaded schema"
    );

    Ok(schema)
}

fn resolve_dsn(config: &Config, explicit: Option<&str>) -> Result<String> {
    config.resolve_dsn(explicit).ok_or_else(|| {
        anyhow::anyhow!(
            "No data source given. Pass --dsn, set `dsn` in {}, or set {}.",
            DEFAULT_CONFIG_FILE,
            schemagraph_core::config::DSN_ENV_VAR
        )
    })
}

/// Out command - write a schema snapshot
async fn out_command(
    config: &Config,
    dsn: Option<&str>,
    output: Option<&Path>,
    no_sort: bool,
    verbose: bool,
) -> Result<()> {
    let dsn = resolve_dsn(config, dsn)?;
    let mut schema = load_schema(config, &dsn, verbose).await?;

    if config.sort && !no_sort {
        schema.sort();
    }

    match output {
        Some(path) => {
            schema.save_to_file(path)?;
            if verbose {
                eprintln!(
                    "{} {} ({} tables, {} relations)",
                    "Snapshot saved to:".green(),
                    path.display(),
                    schema.tables.len(),
                    schema.relations.len()
                );
            }
        }
        None => println!("{}", schema.to_json()?),
    }

    Ok(())
}

/// Diff command - compare two schemas and report changes
async fn diff_command(
    config: &Config,
    expected: &str,
    actual: &str,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("{}", "Comparing schemas...".cyan());
    }

    let expected_schema = load_schema(config, expected, verbose).await?;
    let actual_schema = load_schema(config, actual, verbose).await?;

    let report = SnapshotDiff::compare(&expected_schema, &actual_schema)
        .into_report()
        .with_metadata(serde_json::json!({
            "expected": expected_schema.name,
            "actual": actual_schema.name,
        }));

    if let Some(path) = output {
        report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    print_diff_summary(&report);

    // Exit with error code if there are errors
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Fingerprint command - hash the canonical snapshot
async fn fingerprint_command(config: &Config, dsn: Option<&str>) -> Result<()> {
    let dsn = resolve_dsn(config, dsn)?;
    let schema = load_schema(config, &dsn, false).await?;
    println!("{}", schema.fingerprint()?);
    Ok(())
}

/// Print diff summary
fn print_diff_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Diff Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Tables compared:    {}", report.summary.tables_compared);
    println!("Relations compared: {}", report.summary.relations_compared);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Total changes: {}", report.summary.total);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ Schemas match!".green().bold());
    } else {
        println!("{}", "Changes:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if let Some(exp) = &diag.expected {
                println!("    Expected: {}", exp);
            }
            if let Some(act) = &diag.actual {
                println!("    Actual:   {}", act);
            }
            if !diag.impact.is_empty() {
                println!("    Referenced by: {}", diag.impact.join(", "));
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}
