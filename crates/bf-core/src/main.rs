//! Backlog Forecast Core - Weekly-rate Monte Carlo projection
//!
//! The main entry point for bf-core, handling:
//! - Record ingestion and author filtering
//! - Weekly rate estimation
//! - OPEN/CLOSED backlog projection
//! - Configuration inspection and JSON Schema export

use std::path::PathBuf;

use bf_common::{OutputFormat, StructuredError, SCHEMA_VERSION};
use bf_config::{
    get_preset, list_presets, load_config, validate_config, ConfigError, ForecastConfig, GroupBy,
    PresetName, ResolvedConfig, TotalRounding, ValidationError,
};
use bf_core::estimate::estimate_weekly_rates_with;
use bf_core::exit_codes::ExitCode;
use bf_core::ingest::{distinct_authors, read_records, RecordFilter, SelectedRecords};
use bf_core::log_event;
use bf_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogLevel, Stage,
};
use bf_core::output::{
    render_projection_md, render_projection_summary, render_rates_md, render_rates_summary,
    RateSummary,
};
use bf_core::report::{ProjectionEngine, ProjectionRequest};
use bf_core::schema::{available_schemas, generate_all_schemas, generate_schema};
use bf_core::IssueStatus;
use clap::{Args, Parser, Subcommand};

/// Backlog Forecast - probabilistic projection of issue backlog growth
#[derive(Parser)]
#[command(name = "bf-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to forecast.json (overrides BF_CONFIG and BF_CONFIG_DIR)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project OPEN and CLOSED issue totals over the coming weeks
    Forecast(ForecastArgs),

    /// Show estimated weekly rates for one status
    Rates(RatesArgs),

    /// List the authors present in the input
    Authors(InputArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print JSON Schema for output types
    Schema(SchemaArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Records as a JSON array or JSON Lines; stdin when omitted or "-"
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Keep only records by these authors (repeatable)
    #[arg(long = "author", short = 'a')]
    authors: Vec<String>,
}

#[derive(Args, Debug)]
struct ForecastArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Estimate one rate per group key instead of a single rate
    #[arg(long, value_enum)]
    group_by: Option<GroupBy>,

    /// Number of Monte Carlo trials
    #[arg(long, short = 'n')]
    simulations: Option<usize>,

    /// Forecast horizon in weeks
    #[arg(long, short = 'w')]
    weeks: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Start from a preset's simulation settings
    #[arg(long, value_enum)]
    preset: Option<PresetName>,

    /// Rounding of the estimated totals in md/summary output
    #[arg(long, value_enum)]
    rounding: Option<TotalRounding>,
}

#[derive(Args, Debug)]
struct RatesArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Status to estimate
    #[arg(long, value_enum, ignore_case = true, default_value_t = IssueStatus::Open)]
    status: IssueStatus,

    #[arg(long, value_enum)]
    group_by: Option<GroupBy>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// List built-in presets
    Presets,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type name; all schemas when omitted
    name: Option<String>,

    /// List available type names
    #[arg(long)]
    list: bool,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let cli_level = (cli.global.verbose > 0 || cli.global.quiet)
        .then(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    init_logging(&LogConfig::from_env(cli_level, None));

    let exit_code = match &cli.command {
        Commands::Forecast(args) => run_command(&cli.global, "forecast", |g, ctx| {
            run_forecast(g, ctx, args)
        }),
        Commands::Rates(args) => {
            run_command(&cli.global, "rates", |g, ctx| run_rates(g, ctx, args))
        }
        Commands::Authors(args) => {
            run_command(&cli.global, "authors", |g, _| run_authors(g, args))
        }
        Commands::Config(args) => {
            run_command(&cli.global, "config", |g, ctx| run_config(g, ctx, args))
        }
        Commands::Schema(args) => run_command(&cli.global, "schema", |_, _| run_schema(args)),
        Commands::Version => run_command(&cli.global, "version", |g, _| print_version(g)),
    };

    std::process::exit(exit_code.as_i32());
}

/// Run one command inside a correlated span, reporting any error on stderr.
fn run_command<F>(global: &GlobalOpts, command: &str, f: F) -> ExitCode
where
    F: FnOnce(&GlobalOpts, &LogContext) -> bf_common::Result<()>,
{
    let ctx = LogContext::new(generate_run_id()).with_command(command);
    let span = tracing::info_span!("run", run_id = %ctx.run_id, command = command);
    let _guard = span.enter();

    match f(global, &ctx) {
        Ok(()) => ExitCode::Clean,
        Err(err) => output_error(global, &ctx, &err),
    }
}

fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &bf_common::Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    log_event!(
        ctx,
        ERROR,
        event_names::RUN_FINISHED,
        Stage::Report,
        "command failed",
        code = err.code(),
        exit_code = exit_code.as_i32()
    );

    match global.format {
        OutputFormat::Json => {
            let structured =
                StructuredError::from(err).with_context("exit_code", exit_code.code_name());
            eprintln!("{}", structured.to_json_pretty());
        }
        OutputFormat::Md | OutputFormat::Summary => eprintln!("{}", err.to_human()),
    }
    exit_code
}

fn config_error(err: ConfigError) -> bf_common::Error {
    match err {
        ConfigError::NotFound(_) => bf_common::Error::Config(err.to_string()),
        ConfigError::Validation(
            ValidationError::IoError(_) | ValidationError::ParseError(_),
        ) => bf_common::Error::Config(err.to_string()),
        ConfigError::Validation(_) => bf_common::Error::InvalidConfig(err.to_string()),
    }
}

fn resolve_config(global: &GlobalOpts, ctx: &LogContext) -> bf_common::Result<ResolvedConfig> {
    match load_config(global.config.as_deref()) {
        Ok(resolved) => {
            log_event!(
                ctx,
                DEBUG,
                event_names::CONFIG_LOADED,
                Stage::Init,
                "configuration resolved",
                source = tracing::field::display(resolved.source)
            );
            Ok(resolved)
        }
        Err(err) => {
            log_event!(
                ctx,
                WARN,
                event_names::CONFIG_ERROR,
                Stage::Init,
                "configuration rejected",
                code = err.code()
            );
            Err(config_error(err))
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> bf_common::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_records(ctx: &LogContext, args: &InputArgs) -> bf_common::Result<SelectedRecords> {
    let records = read_records(args.input.as_deref())?;
    let read = records.len();
    let records = RecordFilter::with_authors(args.authors.iter().cloned()).apply(records);
    log_event!(
        ctx,
        INFO,
        event_names::INGEST_FINISHED,
        Stage::Ingest,
        "records loaded",
        read = read,
        kept = records.len()
    );
    Ok(records)
}

// ============================================================================
// Commands
// ============================================================================

/// Layer preset and flags over the file configuration.
fn forecast_config(base: ForecastConfig, args: &ForecastArgs) -> bf_common::Result<ForecastConfig> {
    let mut config = base;
    if let Some(preset) = args.preset {
        let preset = get_preset(preset);
        config.simulation.num_simulations = preset.simulation.num_simulations;
        config.simulation.num_weeks_future = preset.simulation.num_weeks_future;
    }
    if let Some(n) = args.simulations {
        config.simulation.num_simulations = n;
    }
    if let Some(w) = args.weeks {
        config.simulation.num_weeks_future = w;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(group_by) = args.group_by {
        config.estimation.group_by = group_by;
    }
    if let Some(rounding) = args.rounding {
        config.output.total_rounding = rounding;
    }
    validate_config(&config).map_err(|e| bf_common::Error::InvalidParameter(e.to_string()))?;
    Ok(config)
}

fn run_forecast(
    global: &GlobalOpts,
    ctx: &LogContext,
    args: &ForecastArgs,
) -> bf_common::Result<()> {
    log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "starting forecast");

    let resolved = resolve_config(global, ctx)?;
    let config = forecast_config(resolved.config, args)?;
    let selected = load_records(ctx, &args.input)?;

    let engine = ProjectionEngine::from_config(&config);
    let result = engine
        .project(&ProjectionRequest::from_records(selected.records()))
        .map_err(|e| selected.locate(e))?;
    let rounding = config.output.total_rounding;

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "run_id": ctx.run_id,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "config_source": resolved.source.to_string(),
            "projection": result,
            "rounded_totals": result.rounded_totals(rounding),
        }))?,
        OutputFormat::Md => print!("{}", render_projection_md(&result, rounding)),
        OutputFormat::Summary => println!("{}", render_projection_summary(&result, rounding)),
    }

    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "forecast finished",
        seed = result.parameters.seed
    );
    Ok(())
}

fn run_rates(global: &GlobalOpts, ctx: &LogContext, args: &RatesArgs) -> bf_common::Result<()> {
    let resolved = resolve_config(global, ctx)?;
    let mut settings = resolved.config.estimation;
    if let Some(group_by) = args.group_by {
        settings.group_by = group_by;
    }

    let selected = load_records(ctx, &args.input)?;
    let estimate = estimate_weekly_rates_with(selected.records(), args.status, &settings)
        .map_err(|e| selected.locate(e))?;
    let summary = RateSummary::new(args.status, settings.group_by, &estimate);

    match global.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Md => print!("{}", render_rates_md(&summary)),
        OutputFormat::Summary => println!("{}", render_rates_summary(&summary)),
    }
    Ok(())
}

fn run_authors(global: &GlobalOpts, args: &InputArgs) -> bf_common::Result<()> {
    let records = read_records(args.input.as_deref())?;
    let authors = distinct_authors(&records);

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "records": records.len(),
            "authors": authors,
        }))?,
        OutputFormat::Md => {
            println!("# Authors");
            println!();
            for author in &authors {
                println!("- {author}");
            }
        }
        OutputFormat::Summary => {
            println!("{} author(s) across {} record(s)", authors.len(), records.len())
        }
    }
    Ok(())
}

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> bf_common::Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let resolved = resolve_config(global, ctx)?;
            let path = resolved.path.as_ref().map(|p| p.display().to_string());
            match global.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "source": resolved.source.to_string(),
                    "path": path,
                    "config": resolved.config,
                }))?,
                _ => {
                    let sim = &resolved.config.simulation;
                    println!("# Forecast Configuration");
                    println!();
                    println!("Source: {}", resolved.source);
                    println!("Path: {}", path.as_deref().unwrap_or("(none)"));
                    println!("Simulations: {}", sim.num_simulations);
                    println!("Weeks: {}", sim.num_weeks_future);
                    match sim.seed {
                        Some(seed) => println!("Seed: {seed}"),
                        None => println!("Seed: (random)"),
                    }
                    println!("Max draws: {}", sim.max_draws);
                    println!("Group by: {}", resolved.config.estimation.group_by);
                    println!(
                        "Min distinct weeks: {}",
                        resolved.config.estimation.min_distinct_weeks
                    );
                    println!("Rounding: {}", resolved.config.output.total_rounding);
                }
            }
        }
        ConfigCommands::Validate => {
            let resolved = resolve_config(global, ctx)?;
            match global.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "status": "valid",
                    "source": resolved.source.to_string(),
                    "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                }))?,
                _ => println!("config validate: OK ({})", resolved.source),
            }
        }
        ConfigCommands::Presets => {
            let presets = list_presets();
            match global.format {
                OutputFormat::Json => print_json(&presets)?,
                _ => {
                    for preset in &presets {
                        println!(
                            "{:<10} {:>5} trials, {:>3} weeks  {}",
                            preset.name.as_str(),
                            preset.num_simulations,
                            preset.num_weeks_future,
                            preset.description
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_schema(args: &SchemaArgs) -> bf_common::Result<()> {
    if args.list {
        for (name, description) in available_schemas() {
            println!("{name:<22} {description}");
        }
        return Ok(());
    }

    match &args.name {
        Some(name) => match generate_schema(name) {
            Some(schema) => print_json(&schema),
            None => Err(bf_common::Error::InvalidParameter(format!(
                "unknown schema type {name:?}; see 'bf-core schema --list'"
            ))),
        },
        None => print_json(&generate_all_schemas()),
    }
}

fn print_version(global: &GlobalOpts) -> bf_common::Result<()> {
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "bf_core_version": env!("CARGO_PKG_VERSION"),
            "rust_version": env!("CARGO_PKG_RUST_VERSION"),
        })),
        _ => {
            println!("bf-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
            Ok(())
        }
    }
}
