//! Battery planner entry point: CLI wiring and settings-driven planning.

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, bail};
use chrono::{Local, NaiveTime};
use clap::{Parser, ValueEnum};
use tracing::info;

use battery_planner::config::{Settings, SolarStrategy};
use battery_planner::io::export::{export_csv, write_csv, write_json};
use battery_planner::io::input::read_inputs;
use battery_planner::plan::{HourlyInput, PlanSummary, Planner, replan_rolling};
use battery_planner::profile::SyntheticProfile;
use battery_planner::store::PlanStore;
use battery_planner::telemetry::init_tracing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Plan hourly charge/discharge/idle actions for a home battery
#[derive(Parser, Debug)]
#[command(name = "battery-planner", version, about, long_about = None)]
struct Args {
    /// Load settings from a TOML file
    #[arg(long, conflicts_with = "preset")]
    settings: Option<PathBuf>,

    /// Use a built-in preset (baseline, sell_all, small_battery)
    #[arg(long)]
    preset: Option<String>,

    /// Hourly inputs CSV (Time,Price,SpotPrice,Power,ExpectedConsumption);
    /// a synthetic horizon is generated when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Actual consumption CSV (same columns as --input) for a rolling re-plan
    #[arg(long)]
    actual: Option<PathBuf>,

    /// Override the synthetic generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the battery level at the start of the horizon (kWh)
    #[arg(long)]
    start_level: Option<f64>,

    /// Export unneeded solar surplus instead of storing it
    #[arg(long)]
    sell_all: bool,

    /// Output format for the plan on stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Also write the plan to a CSV file
    #[arg(long)]
    plan_out: Option<PathBuf>,

    /// Fail when the plan leaves capacity violations
    #[arg(long)]
    strict: bool,

    /// Debug logging for the planner phases
    #[arg(short, long)]
    verbose: bool,
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match (&args.settings, &args.preset) {
        (Some(path), _) => Settings::from_toml_file(path)?,
        (None, Some(name)) => Settings::from_preset(name)?,
        (None, None) => Settings::baseline(),
    };
    if let Some(seed) = args.seed {
        settings.synthetic.seed = seed;
    }
    if let Some(level) = args.start_level {
        settings.battery.default_start_level = level;
    }
    if args.sell_all {
        settings.solar.strategy = SolarStrategy::SellAll;
    }

    let errors = settings.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("{} invalid setting(s)", errors.len());
    }
    Ok(settings)
}

fn load_inputs(args: &Args, settings: &Settings) -> anyhow::Result<Vec<HourlyInput>> {
    match &args.input {
        Some(path) => Ok(read_inputs(path)?),
        None => {
            let start = Local::now().date_naive().and_time(NaiveTime::MIN);
            info!(
                hours = settings.synthetic.hours,
                seed = settings.synthetic.seed,
                "generating synthetic inputs"
            );
            Ok(SyntheticProfile::new(&settings.synthetic).generate(start))
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let settings = load_settings(args)?;
    let config = settings.planner_config();
    let inputs = load_inputs(args, &settings)?;

    if let Some(path) = &args.actual {
        let actual: Vec<f64> = read_inputs(path)?
            .iter()
            .map(|row| row.expected_consumption)
            .collect();
        let outcome = replan_rolling(&config, &inputs, &actual)?;
        println!("--- Rolling Re-plan ({} hours) ---", outcome.executed.len());
        for (row, level) in outcome.executed.iter().zip(&outcome.start_levels) {
            println!("{row}  (start {level:.3} kWh)");
        }
        return Ok(());
    }

    let planner = Planner::new(config)?;
    let store = PlanStore::new();
    let plan = if args.strict {
        store.refresh_strict(&planner, &inputs)?
    } else {
        store.refresh(&planner, &inputs)?
    };
    let summary = PlanSummary::from_plan(&plan, &inputs, planner.config());

    match args.format {
        OutputFormat::Table => {
            println!(
                "Battery: {:.1} kWh, buffer {:.1} kWh, {:.1} kWh/h, solar strategy {}",
                planner.config().max_capacity,
                planner.config().min_capacity,
                planner.config().max_charge_rate,
                planner.config().solar_strategy.description()
            );
            for row in &plan.rows {
                println!("{row}");
            }
            println!();
            println!("{summary}");
        }
        OutputFormat::Csv => write_csv(&plan, io::stdout().lock())?,
        OutputFormat::Json => write_json(&plan, &summary, io::stdout().lock())?,
    }

    if let Some(path) = &args.plan_out {
        export_csv(&plan, path)
            .with_context(|| format!("cannot write plan to \"{}\"", path.display()))?;
        info!(path = %path.display(), "plan written");
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
