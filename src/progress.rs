//! Rate-based goal progress: weekly pace per strategy, linear forecast, and
//! reachability, assembled into presentation-ready per-sport stats.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::models::{round_dp, AggregateYear, ForecastMode, GoalMetric, Sport, SportGoals};

/// Rolling weight used by the blend strategy when none is configured.
pub fn default_blend_weight() -> Decimal {
    Decimal::new(6, 1)
}

/// Progress toward one metric's goal. Goal-derived fields stay `None` when
/// no goal is set — absence, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub metric: GoalMetric,

    pub ytd: Decimal,

    pub avg_per_week: Decimal,

    /// Linear extrapolation from the current weekly pace.
    pub forecast: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Decimal>,

    /// Remaining to target, floored at zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_victory: Option<Decimal>,

    /// Can the rest be covered at the current pace in the remaining weeks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_in_weeks: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_on_local: Option<NaiveDate>,
}

/// Per-metric progress for one sport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressByMetric {
    pub distance_km: GoalProgress,
    pub count: GoalProgress,
    pub elevation_m: GoalProgress,
}

impl ProgressByMetric {
    pub fn metric(&self, metric: GoalMetric) -> &GoalProgress {
        match metric {
            GoalMetric::DistanceKm => &self.distance_km,
            GoalMetric::Count => &self.count,
            GoalMetric::ElevationM => &self.elevation_m,
        }
    }
}

/// Presentation-ready stats for one (year, sport) under one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteStats {
    pub sport: Sport,

    pub retrieved_at_local: String,

    pub weeks_left_display: u32,

    pub weeks_left_exact: Decimal,

    pub weeks_elapsed: Decimal,

    pub avg_dist_per_run_km: Decimal,

    pub mode: ForecastMode,

    pub progress: ProgressByMetric,
}

/// Inputs to [`build_athlete_stats`].
#[derive(Debug, Clone)]
pub struct StatsParams<'a> {
    pub aggregate: &'a AggregateYear,
    pub as_of: NaiveDateTime,
    pub retrieved_at_local: String,
    pub goals: Option<&'a SportGoals>,
    pub mode: ForecastMode,
    pub blend_weight_rolling: Option<Decimal>,
}

struct WeeklyRates {
    distance_km: Decimal,
    count: Decimal,
    elevation_m: Decimal,
}

/// Assemble per-sport stats: week arithmetic, strategy rates, and per-metric
/// progress. Pure composition over the aggregate.
pub fn build_athlete_stats(params: &StatsParams) -> AthleteStats {
    let aggregate = params.aggregate;
    let as_of = params.as_of;
    let seven = Decimal::from(7);
    let one_seventh = Decimal::ONE / seven;

    let soy = calendar::start_of_year_dt(aggregate.year);
    let eoy = calendar::end_of_year_dt(aggregate.year);

    // Fractional days, inclusive of today; floors keep day one sane.
    let days_elapsed = (calendar::frac_days_between(soy, as_of) + Decimal::ONE).max(Decimal::ONE);
    let weeks_elapsed = (days_elapsed / seven).max(one_seventh);

    let days_left = calendar::frac_days_between(as_of, eoy).max(Decimal::ZERO);
    let weeks_left_exact = days_left / seven;
    let weeks_left_display = weeks_left_exact.ceil().to_u32().unwrap_or(0);

    let totals = &aggregate.totals;
    let ytd_count = Decimal::from(totals.count);
    let avg_dist_per_run = if totals.count > 0 {
        totals.distance_km / ytd_count
    } else {
        Decimal::ZERO
    };

    let rates = weekly_rates(aggregate, weeks_elapsed, params.mode, params.blend_weight_rolling);
    let goal = |metric: GoalMetric| params.goals.and_then(|g| g.metric(metric));

    let progress = ProgressByMetric {
        distance_km: build_progress(
            GoalMetric::DistanceKm,
            totals.distance_km,
            rates.distance_km,
            weeks_left_exact,
            as_of,
            goal(GoalMetric::DistanceKm),
        ),
        count: build_progress(
            GoalMetric::Count,
            ytd_count,
            rates.count,
            weeks_left_exact,
            as_of,
            goal(GoalMetric::Count),
        ),
        elevation_m: build_progress(
            GoalMetric::ElevationM,
            totals.elevation_m,
            rates.elevation_m,
            weeks_left_exact,
            as_of,
            goal(GoalMetric::ElevationM),
        ),
    };

    AthleteStats {
        sport: aggregate.sport,
        retrieved_at_local: params.retrieved_at_local.clone(),
        weeks_left_display,
        weeks_left_exact: round_dp(weeks_left_exact, 2),
        weeks_elapsed: round_dp(weeks_elapsed, 2),
        avg_dist_per_run_km: round_dp(avg_dist_per_run, 2),
        mode: params.mode,
        progress,
    }
}

fn weekly_rates(
    aggregate: &AggregateYear,
    weeks_elapsed: Decimal,
    mode: ForecastMode,
    blend_weight_rolling: Option<Decimal>,
) -> WeeklyRates {
    let one_seventh = Decimal::ONE / Decimal::from(7);
    let denom = weeks_elapsed.max(one_seventh);

    let ytd = WeeklyRates {
        distance_km: aggregate.totals.distance_km / denom,
        count: Decimal::from(aggregate.totals.count) / denom,
        elevation_m: aggregate.totals.elevation_m / denom,
    };

    // The last 28 days count as exactly four weeks.
    let four = Decimal::from(4);
    let rolling = WeeklyRates {
        distance_km: aggregate.rolling.last28.distance_km / four,
        count: Decimal::from(aggregate.rolling.last28.count) / four,
        elevation_m: aggregate.rolling.last28.elevation_m / four,
    };

    match mode {
        ForecastMode::Ytd => ytd,
        ForecastMode::Rolling28 => rolling,
        ForecastMode::Blend => {
            let w = blend_weight_rolling.unwrap_or_else(default_blend_weight);
            let inv = Decimal::ONE - w;
            WeeklyRates {
                distance_km: inv * ytd.distance_km + w * rolling.distance_km,
                count: inv * ytd.count + w * rolling.count,
                elevation_m: inv * ytd.elevation_m + w * rolling.elevation_m,
            }
        }
    }
}

fn build_progress(
    metric: GoalMetric,
    ytd: Decimal,
    per_week: Decimal,
    weeks_left_exact: Decimal,
    as_of: NaiveDateTime,
    goal: Option<Decimal>,
) -> GoalProgress {
    let forecast = ytd + per_week * weeks_left_exact;

    let mut to_victory = None;
    let mut reachable = None;
    let mut reached_in_weeks = None;
    let mut reached_on_local = None;

    if let Some(goal_value) = goal {
        let remaining = (goal_value - ytd).max(Decimal::ZERO);
        reachable = Some(remaining <= per_week * weeks_left_exact);

        if per_week > Decimal::ZERO && remaining > Decimal::ZERO {
            let weeks = remaining / per_week;
            reached_in_weeks = Some(round_dp(weeks, 2));
            reached_on_local = reach_date(as_of, weeks);
        }

        to_victory = Some(round_dp(remaining, if metric.is_count() { 0 } else { 2 }));
    }

    let (ytd_dp, avg_dp, forecast_dp) = if metric.is_count() { (0, 2, 0) } else { (1, 1, 2) };

    GoalProgress {
        metric,
        ytd: round_dp(ytd, ytd_dp),
        avg_per_week: round_dp(per_week, avg_dp),
        forecast: round_dp(forecast, forecast_dp),
        goal,
        to_victory,
        reachable,
        reached_in_weeks,
        reached_on_local,
    }
}

/// Project the reach date from the unrounded weeks value at millisecond
/// precision, then truncate to a date. `None` when the span overflows.
fn reach_date(as_of: NaiveDateTime, weeks: Decimal) -> Option<NaiveDate> {
    let ms = (weeks * Decimal::from(7) * Decimal::from(calendar::MS_PER_DAY)).to_i64()?;
    as_of.checked_add_signed(Duration::milliseconds(ms)).map(|d| d.date())
}
