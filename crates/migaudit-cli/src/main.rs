use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use migaudit_catalog::{RedshiftAdapter, SnowflakeAdapter};
use migaudit_core::{AuditConfig, ColumnDescriptor, ExistenceResult, FetchOutcome, RowSet, SourceKind};
use migaudit_engine::{AuditRunner, ColumnDiff, DateCountDiff, ExistenceVerdict, TotalsVerdict};
use migaudit_report::{ReportFormat, ReportWriter};

const DEFAULT_CONFIG: &str = "migaudit.toml";

/// migaudit - Snowflake to Redshift migration audit
#[derive(Parser)]
#[command(name = "migaudit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: migaudit.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(Args, Clone)]
struct TableArgs {
    /// Table name: table, schema.table or database.schema.table
    #[arg(short, long)]
    table: String,

    /// Date column used for sampling and per-date counts
    #[arg(long)]
    date_column: Option<String>,

    /// Sample date, or analysis date for reports (YYYY-MM-DD, default: audit.sample_date)
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl TableArgs {
    /// `--date`, falling back to the configured sample date
    fn date_or_default(&self, config: &AuditConfig) -> NaiveDate {
        self.date.unwrap_or(config.audit.sample_date)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the table exists in both warehouses
    Exists {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Show sample rows for one date from both warehouses
    Sample {
        #[command(flatten)]
        table: TableArgs,

        /// Maximum rows per warehouse
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Compare total row counts
    Totals {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Show per-date row counts over the trailing window
    Dates {
        #[command(flatten)]
        table: TableArgs,

        /// Window length in days, ending today
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Show the column listings of both warehouses
    Columns {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Run every check and write an audit report
    Report {
        #[command(flatten)]
        table: TableArgs,

        /// Window length in days for the per-date comparison
        #[arg(short, long)]
        days: Option<u32>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Pdf)]
        format: FormatArg,

        /// Directory for the report file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Markdown,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Pdf => ReportFormat::Pdf,
            FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG may be set in .env, so this runs before the subscriber. A missing .env is fine
    let _ = dotenvy::dotenv();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    let runner = AuditRunner::new(
        config.resolver(),
        Box::new(SnowflakeAdapter::new(config.origin.clone())),
        Box::new(RedshiftAdapter::new(config.target.clone())),
    );

    match cli.command {
        Commands::Exists { table } => exists_command(&runner, &table).await,
        Commands::Sample { table, limit } => sample_command(&runner, &config, &table, limit).await,
        Commands::Totals { table } => totals_command(&runner, &table).await,
        Commands::Dates { table, days } => dates_command(&runner, &config, &table, days).await,
        Commands::Columns { table } => columns_command(&runner, &table).await,
        Commands::Report {
            table,
            days,
            format,
            output_dir,
        } => report_command(&runner, &config, &table, days, format.into(), output_dir).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<AuditConfig> {
    let mut config = if let Some(path) = path {
        AuditConfig::from_file(path).with_context(|| format!("cannot load {}", path.display()))?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        AuditConfig::from_file(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("cannot load {}", DEFAULT_CONFIG))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults and environment".yellow());
        }
        AuditConfig::default()
    };

    config.apply_env()?;
    Ok(config)
}

fn banner(title: &str) {
    println!("{}", "=".repeat(60).bright_blue());
    println!("{}", title.bold());
    println!("{}", "=".repeat(60).bright_blue());
}

fn failure(kind: SourceKind, error: &str) {
    println!("  {} {}: {}", "✗".red(), kind, error.red());
}

async fn exists_command(runner: &AuditRunner, args: &TableArgs) {
    banner(&format!("Existence check: {}", args.table));

    let results = runner.check_existence(&args.table).await;
    for (kind, result) in results.iter() {
        print_existence(kind, result);
    }

    let verdict = results.compare();
    if verdict.is_consistent() {
        println!("\n{} {}", "✓".green(), existence_verdict(verdict).green());
    } else {
        println!("\n{} {}", "⚠".yellow(), existence_verdict(verdict).yellow());
    }
}

fn existence_verdict(verdict: ExistenceVerdict) -> &'static str {
    match verdict {
        ExistenceVerdict::BothExist => "The table exists in both warehouses",
        ExistenceVerdict::NeitherExists => "The table exists in neither warehouse",
        ExistenceVerdict::OnlyLeft => "The table exists only in Snowflake",
        ExistenceVerdict::OnlyRight => "The table exists only in Redshift",
    }
}

fn print_existence(kind: SourceKind, result: &ExistenceResult) {
    match (&result.error, result.exists) {
        (Some(error), _) => failure(kind, error),
        (None, true) => println!("  {} {}: exists", "✓".green(), kind),
        (None, false) => println!("  {} {}: does not exist", "✗".yellow(), kind),
    }
}

async fn sample_command(runner: &AuditRunner, config: &AuditConfig, args: &TableArgs, limit: Option<u32>) {
    let date_column = args.date_column.as_deref().unwrap_or(&config.audit.date_column);
    let date = args.date_or_default(config);
    let limit = limit.unwrap_or(config.audit.sample_limit);

    banner(&format!("Sample rows: {} ({} = {})", args.table, date_column, date));

    let results = runner.check_sample(&args.table, date_column, date, limit).await;
    for (kind, outcome) in results.iter() {
        println!("\n{}", kind.to_string().cyan().bold());
        match outcome.as_ref() {
            Some(rows) => print_rows(rows),
            None => failure(kind, outcome.error.as_deref().unwrap_or("unknown error")),
        }
    }
}

fn print_rows(rows: &RowSet) {
    if rows.is_empty() {
        println!("  {}", "(no rows)".dimmed());
        return;
    }

    println!("  {}", rows.columns.join(" | ").bold());
    for row in &rows.rows {
        let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("NULL")).collect();
        println!("  {}", cells.join(" | "));
    }
    println!("  {}", format!("{} row(s)", rows.len()).dimmed());
}

async fn totals_command(runner: &AuditRunner, args: &TableArgs) {
    banner(&format!("Total row counts: {}", args.table));

    let results = runner.check_totals(&args.table).await;
    for (kind, result) in results.iter() {
        match (result.total, &result.error) {
            (Some(total), _) => println!("  {} {}: {}", "✓".green(), kind, total),
            (None, error) => failure(kind, error.as_deref().unwrap_or("unknown error")),
        }
    }

    match results.compare() {
        TotalsVerdict::Match => println!("\n{}", "✓ Total counts match".green()),
        TotalsVerdict::Mismatch => {
            let origin = results.origin.total.unwrap_or_default();
            let target = results.target.total.unwrap_or_default();
            println!(
                "\n{} {}",
                "⚠ Total counts differ by".yellow(),
                origin.abs_diff(target).to_string().yellow()
            );
        }
        TotalsVerdict::Indeterminate => {
            println!("\n{}", "⚠ Totals could not be compared because of errors in the counts".yellow())
        }
    }
}

async fn dates_command(runner: &AuditRunner, config: &AuditConfig, args: &TableArgs, days: Option<u32>) {
    let date_column = args.date_column.as_deref().unwrap_or(&config.audit.date_column);
    let days = days.unwrap_or(config.audit.days);

    banner(&format!("Counts by {} (last {} days): {}", date_column, days, args.table));

    let results = runner.check_date_counts(&args.table, date_column, days).await;
    for (kind, outcome) in results.iter() {
        if let Some(error) = &outcome.error {
            failure(kind, error);
        }
    }

    match results.compare() {
        Some(diff) => print_date_diff(&diff),
        None => println!("\n{}", "⚠ Counts by date could not be compared because of query errors".yellow()),
    }
}

fn print_date_diff(diff: &DateCountDiff) {
    println!(
        "\n  {:<12} {:>12} {:>12}  {}",
        "date".bold(),
        "snowflake".bold(),
        "redshift".bold(),
        "match".bold()
    );
    for row in &diff.rows {
        let matches = if row.matches { "yes".green() } else { "no".red() };
        println!("  {:<12} {:>12} {:>12}  {}", row.date, row.left_count, row.right_count, matches);
    }

    let verdict = date_verdict(diff);
    if diff.all_match() {
        println!("\n{} {}", "✓".green(), verdict.green());
    } else {
        println!("\n{} {}", "⚠".yellow(), verdict.yellow());
    }
}

fn date_verdict(diff: &DateCountDiff) -> String {
    if diff.is_empty() {
        "Neither warehouse has rows in the window".to_string()
    } else if diff.all_match() {
        "Counts by date match in both warehouses".to_string()
    } else {
        format!("{} of {} dates differ", diff.mismatches().count(), diff.rows.len())
    }
}

async fn columns_command(runner: &AuditRunner, args: &TableArgs) {
    banner(&format!("Columns: {}", args.table));

    let results = runner.check_columns(&args.table).await;
    for (kind, outcome) in results.iter() {
        println!("\n{}", kind.to_string().cyan().bold());
        print_columns(kind, outcome);
    }

    match results.compare() {
        Some(diff) => print_column_diff(&diff),
        None => println!("\n{}", "⚠ Columns could not be compared because of query errors".yellow()),
    }
}

fn print_columns(kind: SourceKind, outcome: &FetchOutcome<Vec<ColumnDescriptor>>) {
    match outcome.as_ref() {
        Some(columns) => {
            for column in columns {
                println!("  {:<40} {}", column.name, column.data_type.dimmed());
            }
        }
        None => failure(kind, outcome.error.as_deref().unwrap_or("unknown error")),
    }
}

fn name_list(names: &std::collections::BTreeSet<String>) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn print_column_diff(diff: &ColumnDiff) {
    println!("\n{} {}", "Only in Snowflake:".bold(), name_list(&diff.only_in_left));
    println!("{} {}", "Only in Redshift:".bold(), name_list(&diff.only_in_right));

    if !diff.type_mismatches.is_empty() {
        println!("\n  {:<40} {:<20} {}", "column".bold(), "snowflake".bold(), "redshift".bold());
        for mismatch in &diff.type_mismatches {
            println!(
                "  {:<40} {:<20} {}",
                mismatch.column,
                mismatch.left_type,
                mismatch.right_type.red()
            );
        }
    }

    if diff.is_clean() {
        println!("\n{}", "✓ Columns and types match".green());
    } else {
        println!("\n{} {}", "⚠".yellow(), column_verdict(diff).yellow());
    }
}

fn column_verdict(diff: &ColumnDiff) -> String {
    if diff.is_clean() {
        return "Columns and types match".to_string();
    }
    format!(
        "{} column(s) only in Snowflake, {} only in Redshift, {} type mismatch(es)",
        diff.only_in_left.len(),
        diff.only_in_right.len(),
        diff.type_mismatches.len()
    )
}

async fn report_command(
    runner: &AuditRunner,
    config: &AuditConfig,
    args: &TableArgs,
    days: Option<u32>,
    format: ReportFormat,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let date_column = args.date_column.as_deref().unwrap_or(&config.audit.date_column);
    let days = days.unwrap_or(config.audit.days);
    let analysis_date = args.date_or_default(config);

    banner(&format!("Audit report: {}", args.table));

    let result = runner.full_audit(&args.table, date_column, days, analysis_date).await;

    let mut writer = ReportWriter::new(&config.report);
    if let Some(dir) = output_dir {
        writer = writer.with_output_dir(dir);
    }
    let path = writer.write(&result, format).context("failed to write audit report")?;

    if result.is_clean() {
        println!("{}", "✓ Every check passed".green());
    } else {
        println!("{}", "⚠ Discrepancies or errors found".yellow());
    }
    println!("{} {}", "Report written to".bold(), path.display());

    Ok(())
}
