//! Deterministic insight generation: distilled per-metric facts from the
//! progress stats, a three-band goal status, and short human-readable
//! one-liners derived from the year-linear forecast.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::forecast::Forecast;
use crate::models::{round_dp, GoalMetric};
use crate::progress::AthleteStats;

/// Three-band reading of weekly pace against the required pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    OnTrack,
    CatchUp,
    OffTrack,
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalStatus::OnTrack => write!(f, "on track"),
            GoalStatus::CatchUp => write!(f, "catch up"),
            GoalStatus::OffTrack => write!(f, "off track"),
        }
    }
}

/// Classify current weekly pace against the required weekly pace.
///
/// A non-positive requirement means the goal is already covered. With a
/// requirement but no pace at all the goal is off track. Otherwise the
/// catch-up band reaches up to 20% above the current pace.
pub fn classify_goal_status(required_per_week: Decimal, current_per_week: Decimal) -> GoalStatus {
    if required_per_week <= Decimal::ZERO {
        return GoalStatus::OnTrack;
    }
    if current_per_week <= Decimal::ZERO {
        return GoalStatus::OffTrack;
    }
    if current_per_week >= required_per_week {
        return GoalStatus::OnTrack;
    }
    if required_per_week <= current_per_week * Decimal::new(12, 1) {
        return GoalStatus::CatchUp;
    }
    GoalStatus::OffTrack
}

/// Flat facts for one metric with a set goal, all values at two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricFacts {
    pub metric: GoalMetric,
    pub goal: Decimal,
    pub current: Decimal,
    /// Still to cover, floored at zero.
    pub remaining: Decimal,
    pub required_per_week: Decimal,
    pub current_per_week: Decimal,
    /// Linear continuation of the current pace, never below the current
    /// total.
    pub forecast_eoy: Decimal,
    pub weeks_left: Decimal,
    pub status: GoalStatus,
    /// Distance per activity; only for the distance metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_per_unit: Option<Decimal>,
}

/// Derive facts for one metric from assembled stats. `None` when the metric
/// has no positive goal.
pub fn derive_metric_facts(stats: &AthleteStats, metric: GoalMetric) -> Option<MetricFacts> {
    let progress = stats.progress.metric(metric);
    let goal = progress.goal.filter(|goal| *goal > Decimal::ZERO)?;

    let current = progress.ytd;
    let current_per_week = progress.avg_per_week;
    let weeks_left = stats.weeks_left_exact;

    let remaining = (goal - current).max(Decimal::ZERO);
    let required_per_week = if weeks_left > Decimal::ZERO {
        round_dp(remaining / weeks_left, 2)
    } else {
        Decimal::ZERO
    };
    let forecast_eoy = round_dp((current + current_per_week * weeks_left).max(current), 2);

    let count_ytd = stats.progress.count.ytd;
    let avg_per_unit = if metric == GoalMetric::DistanceKm && count_ytd > Decimal::ZERO {
        Some(round_dp(current / count_ytd, 2))
    } else {
        None
    };

    Some(MetricFacts {
        metric,
        goal: round_dp(goal, 2),
        current: round_dp(current, 2),
        remaining: round_dp(remaining, 2),
        required_per_week,
        current_per_week: round_dp(current_per_week, 2),
        forecast_eoy,
        weeks_left: round_dp(weeks_left, 2),
        status: classify_goal_status(required_per_week, current_per_week),
        avg_per_unit,
    })
}

fn unit_suffix(metric: GoalMetric) -> String {
    let unit = metric.unit();
    if unit.is_empty() {
        String::new()
    } else {
        format!(" {unit}")
    }
}

/// One line per metric with a set goal, in metric order, capped at four.
pub fn build_insights(forecast: &Forecast) -> Vec<String> {
    let mut lines = Vec::new();

    for metric in GoalMetric::ALL {
        let projection = forecast.metric(metric);
        let Some(goal) = projection.goal.filter(|goal| *goal > Decimal::ZERO) else {
            continue;
        };

        let label = metric.label();
        let suffix = unit_suffix(metric);

        let line = if projection.ytd >= goal {
            format!(
                "{label}: goal reached ({ytd}{suffix} of {goal}{suffix})",
                ytd = projection.ytd,
            )
        } else if projection.on_track {
            format!(
                "{label}: on pace (projected {projected}{suffix} by year end, goal {goal}{suffix})",
                projected = projection.projected_year_end,
            )
        } else {
            format!(
                "{label}: need ~{required}{suffix} per week to reach {goal}{suffix}",
                required = projection.required_per_week,
            )
        };

        lines.push(line);
        if lines.len() == 4 {
            break;
        }
    }

    lines
}
