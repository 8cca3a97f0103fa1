//! Terminal rendering for the progress, forecast, and dashboard commands:
//! tables for the numbers, colored pills for pace status, and a plain JSON
//! dump for piping.

use colored::{ColoredString, Colorize};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::dashboard::{DashboardModel, SportDashboard};
use crate::error::{GoalrsError, Result};
use crate::forecast::{ForecastResult, ForecastStatus};
use crate::insights::{derive_metric_facts, GoalStatus};
use crate::models::{round_dp, GoalMetric, Sport};
use crate::progress::AthleteStats;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Pretty-printed JSON for `--json` output.
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| GoalrsError::Report(e.to_string()))
}

fn fmt_opt_decimal(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn fmt_opt_bool(value: Option<bool>) -> String {
    match value {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => "-".to_string(),
    }
}

fn fmt_percent(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{}%", round_dp(v * Decimal::from(100), 1)))
        .unwrap_or_else(|| "-".to_string())
}

fn metric_heading(metric: GoalMetric) -> String {
    let unit = metric.unit();
    if unit.is_empty() {
        metric.label().to_string()
    } else {
        format!("{} ({})", metric.label(), unit)
    }
}

fn goal_status_pill(status: GoalStatus) -> ColoredString {
    match status {
        GoalStatus::OnTrack => "ON TRACK".green().bold(),
        GoalStatus::CatchUp => "CATCH UP".yellow().bold(),
        GoalStatus::OffTrack => "OFF TRACK".red().bold(),
    }
}

fn forecast_status_pill(status: ForecastStatus) -> ColoredString {
    match status {
        ForecastStatus::OnTrack => "ON TRACK".green().bold(),
        ForecastStatus::Warning => "WARNING".yellow().bold(),
        ForecastStatus::Danger => "DANGER".red().bold(),
    }
}

#[derive(Tabled)]
struct ProgressRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "YTD")]
    ytd: String,
    #[tabled(rename = "Per week")]
    per_week: String,
    #[tabled(rename = "Forecast EOY")]
    forecast: String,
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Reachable")]
    reachable: String,
    #[tabled(rename = "Reached on")]
    reached_on: String,
}

/// Render the rate-based progress report for one sport.
pub fn render_progress(stats: &AthleteStats) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{}\n",
        format!(
            "{} progress {} ({} strategy)",
            stats.sport.display_name(),
            stats.retrieved_at_local,
            stats.mode
        )
        .bold()
    ));
    out.push_str(&format!(
        "Weeks elapsed {} · weeks left {} (rounds up to {})\n",
        stats.weeks_elapsed, stats.weeks_left_exact, stats.weeks_left_display
    ));
    if stats.sport == Sport::Run {
        out.push_str(&format!(
            "Average distance per run: {} km\n",
            stats.avg_dist_per_run_km
        ));
    }
    out.push('\n');

    let rows: Vec<ProgressRow> = GoalMetric::ALL
        .iter()
        .map(|&metric| {
            let p = stats.progress.metric(metric);
            ProgressRow {
                metric: metric_heading(metric),
                ytd: p.ytd.to_string(),
                per_week: p.avg_per_week.to_string(),
                forecast: p.forecast.to_string(),
                goal: fmt_opt_decimal(p.goal),
                remaining: fmt_opt_decimal(p.to_victory),
                reachable: fmt_opt_bool(p.reachable),
                reached_on: p
                    .reached_on_local
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    out.push_str(&table.to_string());
    out.push('\n');

    let mut status_lines = Vec::new();
    for metric in GoalMetric::ALL {
        if let Some(facts) = derive_metric_facts(stats, metric) {
            let suffix = if metric.unit().is_empty() {
                String::new()
            } else {
                format!(" {}", metric.unit())
            };
            status_lines.push(format!(
                "  {} {}  need {}{}/week, at {}{}/week",
                facts.metric.label(),
                goal_status_pill(facts.status),
                facts.required_per_week,
                suffix,
                facts.current_per_week,
                suffix
            ));
        }
    }
    if !status_lines.is_empty() {
        out.push_str("\nGoal status:\n");
        for line in status_lines {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Ideal")]
    ideal: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Forecast")]
    forecast: String,
}

/// Render the day-granular forecast report for one (sport, metric).
pub fn render_forecast(
    sport: Sport,
    metric: GoalMetric,
    goal: Decimal,
    result: &ForecastResult,
) -> String {
    let mut out = String::new();
    let unit = metric.unit();
    let suffix = if unit.is_empty() {
        String::new()
    } else {
        format!(" {unit}")
    };

    out.push_str(&format!(
        "{}\n",
        format!(
            "{} {} forecast (goal {}{})",
            sport.display_name(),
            metric.label().to_lowercase(),
            goal,
            suffix
        )
        .bold()
    ));
    out.push_str(&format!(
        "Status: {} ({})\n",
        forecast_status_pill(result.status),
        result.label
    ));
    out.push_str(&format!(
        "Expected today {}{} · delta {}{}\n",
        result.expected_today, suffix, result.delta, suffix
    ));
    out.push_str(&format!(
        "Trend {}{}/day ({}{}/week)\n",
        result.trend_per_day, suffix, result.trend_per_week, suffix
    ));
    out.push_str(&format!(
        "Forecast EOY {}{} · required {}{}/week\n",
        result.forecast_eoy, suffix, result.required_per_week, suffix
    ));
    if let Some(per_activity) = result.per_activity {
        out.push_str(&format!("Per activity: {}{}\n", per_activity, suffix));
    }
    out.push('\n');

    let rows: Vec<MonthRow> = result
        .lines
        .ideal
        .iter()
        .enumerate()
        .map(|(i, ideal)| MonthRow {
            month: MONTH_NAMES.get(i).copied().unwrap_or("?").to_string(),
            ideal: ideal.y.to_string(),
            actual: result
                .lines
                .actual
                .get(i)
                .map(|p| p.y.to_string())
                .unwrap_or_default(),
            forecast: result
                .lines
                .forecast
                .get(i)
                .map(|p| p.y.to_string())
                .unwrap_or_default(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    out.push_str(&table.to_string());
    out.push('\n');

    out
}

#[derive(Tabled)]
struct DashboardRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "YTD")]
    ytd: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Projected EOY")]
    projected: String,
    #[tabled(rename = "Required/week")]
    required: String,
    #[tabled(rename = "On track")]
    on_track: String,
}

fn sport_section(section: &SportDashboard) -> String {
    let mut out = String::new();
    let totals = &section.aggregate.totals;

    out.push_str(&format!(
        "{}\n",
        section.aggregate.sport.display_name().bold()
    ));
    out.push_str(&format!(
        "YTD: {} km · {} activities · {} m climbed · {} h moving\n",
        totals.distance_km,
        totals.count,
        totals.elevation_m,
        round_dp(totals.moving_time_hours, 1)
    ));

    let rows: Vec<DashboardRow> = GoalMetric::ALL
        .iter()
        .map(|&metric| {
            let m = section.forecast.metric(metric);
            DashboardRow {
                metric: metric_heading(metric),
                goal: fmt_opt_decimal(m.goal),
                ytd: m.ytd.to_string(),
                progress: fmt_percent(m.percent),
                projected: m.projected_year_end.to_string(),
                required: m.required_per_week.to_string(),
                on_track: if m.on_track { "yes" } else { "no" }.to_string(),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    out.push_str(&table.to_string());
    out.push('\n');

    if !section.insights.is_empty() {
        out.push_str("Insights:\n");
        for line in &section.insights {
            out.push_str(&format!("  • {}\n", line));
        }
    }

    let review = &section.review;
    out.push_str(&format!(
        "Form: consistency {}/100",
        review.consistency_score
    ));
    if review.risk_flags.is_empty() {
        out.push_str(" · no risk flags\n");
    } else {
        let flags: Vec<String> = review
            .risk_flags
            .iter()
            .map(|flag| flag.to_string())
            .collect();
        out.push_str(&format!(" · {}\n", flags.join(", ").red()));
    }
    out.push_str(&format!(
        "Baseline EOY from 28-day pace: {} km · {} activities · {} m\n",
        review.baseline_forecast_eoy.distance_km,
        review.baseline_forecast_eoy.count,
        review.baseline_forecast_eoy.elevation_m
    ));

    out
}

/// Render the full dashboard report for both sports.
pub fn render_dashboard(model: &DashboardModel) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{}\n\n",
        format!(
            "Dashboard {} (as of {})",
            model.year,
            model.generated_at_local.format("%Y-%m-%d %H:%M")
        )
        .bold()
    ));

    out.push_str(&sport_section(&model.run));
    out.push('\n');
    out.push_str(&sport_section(&model.ride));

    out
}
