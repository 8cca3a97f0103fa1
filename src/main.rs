use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use goalrs::config::AppConfig;
use goalrs::logging::{init_logging, LogLevel};
use goalrs::models::{ForecastMode, GoalMetric, NormalizedActivity, Sport, YearGoals};
use goalrs::progress::{build_athlete_stats, StatsParams};
use goalrs::report;
use goalrs::{
    aggregate_year, build_dashboard_model, calculate_forecast, daily_count_series,
    daily_metric_series, load_activities, load_goals, normalize_activities, ForecastInput,
    NormalizeOptions,
};

/// goalrs - Yearly training goal tracking CLI
///
/// Reads Run and Ride activities plus yearly goals from local files and
/// reports progress, pace forecasts, and a combined dashboard.
#[derive(Parser)]
#[command(name = "goalrs")]
#[command(version = "0.1.0")]
#[command(about = "Yearly training goal forecasting", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weekly-rate progress report for one sport
    Progress {
        /// Activity file (JSON or CSV)
        #[arg(short, long)]
        activities: PathBuf,

        /// Goals file (JSON or TOML)
        #[arg(short, long)]
        goals: Option<PathBuf>,

        /// Season year (defaults to the as-of year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Sport to report on (run, ride)
        #[arg(short, long, default_value = "run")]
        sport: Sport,

        /// Evaluation instant, YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (defaults to now)
        #[arg(long, value_name = "DATETIME")]
        as_of: Option<String>,

        /// Weekly-rate strategy (ytd, rolling28, blend)
        #[arg(short, long)]
        mode: Option<ForecastMode>,

        /// Rolling share for the blend strategy, 0 to 1
        #[arg(long)]
        blend_weight: Option<Decimal>,

        /// Drop commute-flagged activities
        #[arg(long)]
        exclude_commute: bool,

        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Day-granular pace forecast for one metric
    Forecast {
        /// Activity file (JSON or CSV)
        #[arg(short, long)]
        activities: PathBuf,

        /// Goals file (JSON or TOML)
        #[arg(short, long)]
        goals: PathBuf,

        /// Season year (defaults to the as-of year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Sport to forecast (run, ride)
        #[arg(short, long, default_value = "run")]
        sport: Sport,

        /// Goal metric (distance, count, elevation)
        #[arg(short, long, default_value = "distance")]
        metric: GoalMetric,

        /// Evaluation instant, YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (defaults to now)
        #[arg(long, value_name = "DATETIME")]
        as_of: Option<String>,

        /// Trend window in days
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Drop commute-flagged activities
        #[arg(long)]
        exclude_commute: bool,

        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Combined dashboard for both sports
    Dashboard {
        /// Activity file (JSON or CSV)
        #[arg(short, long)]
        activities: PathBuf,

        /// Goals file (JSON or TOML)
        #[arg(short, long)]
        goals: Option<PathBuf>,

        /// Season year (defaults to the as-of year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Evaluation instant, YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (defaults to now)
        #[arg(long, value_name = "DATETIME")]
        as_of: Option<String>,

        /// Drop commute-flagged activities
        #[arg(long)]
        exclude_commute: bool,

        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Show or initialize the configuration file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

struct LoadedInputs {
    normalized: Vec<NormalizedActivity>,
    goals: Option<YearGoals>,
}

fn load_inputs(
    activities: &Path,
    goals: Option<&Path>,
    include_commute: bool,
) -> Result<LoadedInputs> {
    let records = load_activities(activities)
        .with_context(|| format!("Failed to read activities from {}", activities.display()))?;
    let options = NormalizeOptions { include_commute };
    let normalized = normalize_activities(&records, &options);

    let goals = match goals {
        Some(path) => Some(
            load_goals(path)
                .with_context(|| format!("Failed to read goals from {}", path.display()))?,
        ),
        None => None,
    };

    Ok(LoadedInputs { normalized, goals })
}

/// The only place wall-clock time enters the program.
fn parse_as_of(raw: Option<&str>) -> Result<NaiveDateTime> {
    let Some(raw) = raw else {
        return Ok(Local::now().naive_local());
    };

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        // A bare date means the whole day counts.
        if let Some(dt) = date.and_hms_opt(23, 59, 59) {
            return Ok(dt);
        }
    }
    bail!("Unrecognized --as-of value: {raw} (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Progress {
            activities,
            goals,
            year,
            sport,
            as_of,
            mode,
            blend_weight,
            exclude_commute,
            json,
        } => {
            let as_of = parse_as_of(as_of.as_deref())?;
            let year = year.unwrap_or_else(|| as_of.date().year());
            let include_commute = config.forecast.include_commute && !exclude_commute;
            let inputs = load_inputs(&activities, goals.as_deref(), include_commute)?;

            let aggregate = aggregate_year(&inputs.normalized, year, sport, as_of);
            let sport_goals = inputs
                .goals
                .as_ref()
                .filter(|g| g.year == year)
                .and_then(|g| g.for_sport(sport));

            let params = StatsParams {
                aggregate: &aggregate,
                as_of,
                retrieved_at_local: as_of.format("%Y-%m-%dT%H:%M:%S").to_string(),
                goals: sport_goals,
                mode: mode.unwrap_or(config.forecast.mode),
                blend_weight_rolling: Some(
                    blend_weight.unwrap_or(config.forecast.blend_weight_rolling),
                ),
            };
            let stats = build_athlete_stats(&params);

            if json {
                println!("{}", report::render_json(&stats)?);
            } else {
                print!("{}", report::render_progress(&stats));
            }
        }

        Commands::Forecast {
            activities,
            goals,
            year,
            sport,
            metric,
            as_of,
            lookback_days,
            exclude_commute,
            json,
        } => {
            let as_of = parse_as_of(as_of.as_deref())?;
            let year = year.unwrap_or_else(|| as_of.date().year());
            let include_commute = config.forecast.include_commute && !exclude_commute;
            let inputs = load_inputs(&activities, Some(goals.as_path()), include_commute)?;

            let goal = inputs
                .goals
                .as_ref()
                .and_then(|g| g.metric_goal(year, sport, metric))
                .with_context(|| {
                    format!(
                        "No {} goal set for {} in {}",
                        metric.label().to_lowercase(),
                        sport,
                        year
                    )
                })?;

            let aggregate = aggregate_year(&inputs.normalized, year, sport, as_of);
            let series = daily_metric_series(&inputs.normalized, year, sport, metric);
            let counts = daily_count_series(&inputs.normalized, year, sport);

            let mut input =
                ForecastInput::new(goal, aggregate.totals.metric(metric), as_of.date(), year);
            input.daily_series = Some(&series);
            input.activity_count_by_day = Some(&counts);
            input.lookback_days = lookback_days.unwrap_or(config.forecast.lookback_days);

            let result = calculate_forecast(&input);

            if json {
                println!("{}", report::render_json(&result)?);
            } else {
                print!("{}", report::render_forecast(sport, metric, goal, &result));
            }
        }

        Commands::Dashboard {
            activities,
            goals,
            year,
            as_of,
            exclude_commute,
            json,
        } => {
            let as_of = parse_as_of(as_of.as_deref())?;
            let year = year.unwrap_or_else(|| as_of.date().year());
            let include_commute = config.forecast.include_commute && !exclude_commute;
            let inputs = load_inputs(&activities, goals.as_deref(), include_commute)?;

            let model =
                build_dashboard_model(&inputs.normalized, year, inputs.goals.as_ref(), as_of);

            if json {
                println!("{}", report::render_json(&model)?);
            } else {
                print!("{}", report::render_dashboard(&model));
            }
        }

        Commands::Config { init } => {
            let path = AppConfig::default_config_path();
            if init {
                if path.exists() {
                    println!(
                        "{}",
                        format!("Config already exists at {}", path.display()).yellow()
                    );
                } else {
                    let mut fresh = AppConfig::default();
                    fresh
                        .save_default()
                        .context("Failed to write default config")?;
                    println!(
                        "{}",
                        format!("✓ Wrote default config to {}", path.display()).green()
                    );
                }
            } else {
                println!("{}", format!("Config file: {}", path.display()).bold());
                let rendered = toml::to_string_pretty(&config)
                    .context("Failed to render configuration")?;
                print!("{rendered}");
            }
        }
    }

    Ok(())
}
