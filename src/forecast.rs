//! Day-granular goal forecasting with trend estimation, plus the simpler
//! year-linear per-metric forecast used by the dashboard.
//!
//! Both engines are pure: `today` / `as_of` are parameters, goal-less inputs
//! degrade to zero-valued outputs, and every division is guarded rather than
//! allowed to fail.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::models::{round_dp, AggregateYear, DailyPoint, GoalMetric, Sport, YearGoals};

/// Default trailing trend window, in calendar days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Three-valued pace signal for the day-granular forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForecastStatus {
    OnTrack,
    Warning,
    Danger,
}

impl std::fmt::Display for ForecastStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastStatus::OnTrack => write!(f, "on-track"),
            ForecastStatus::Warning => write!(f, "warning"),
            ForecastStatus::Danger => write!(f, "danger"),
        }
    }
}

/// Inputs to the day-granular forecast.
///
/// All temporal context is injected. The trend window is anchored to
/// `today`, never to the wall clock.
#[derive(Debug, Clone)]
pub struct ForecastInput<'a> {
    pub goal_value: Decimal,
    pub current_value: Decimal,
    pub today: NaiveDate,
    pub year: i32,
    /// Daily metric values, ascending by date; at least 7 points are needed
    /// before the trailing window is trusted over the YTD average.
    pub daily_series: Option<&'a [DailyPoint]>,
    /// Activities per day, for the per-activity average.
    pub activity_count_by_day: Option<&'a [DailyPoint]>,
    pub lookback_days: u32,
}

impl<'a> ForecastInput<'a> {
    pub fn new(goal_value: Decimal, current_value: Decimal, today: NaiveDate, year: i32) -> Self {
        ForecastInput {
            goal_value,
            current_value,
            today,
            year,
            daily_series: None,
            activity_count_by_day: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// One sample on a forecast chart line; `x` is the fraction of the year
/// elapsed, `y` the metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: Decimal,
    pub y: Decimal,
}

/// Monthly chart lines, one point per month sampled at the 15th.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastLines {
    pub ideal: Vec<Point>,
    pub actual: Vec<Point>,
    pub forecast: Vec<Point>,
}

/// Day-granular forecast for one metric. Reproducible byte-for-byte from
/// its inputs; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Where the linear ideal pace says the athlete should be today.
    pub expected_today: Decimal,

    /// `current - expected_today`.
    pub delta: Decimal,

    /// Deviation expressed in days of ideal pace; negative means behind.
    pub days_ahead: Decimal,

    /// "N days ahead" / "N days behind".
    pub label: String,

    pub status: ForecastStatus,

    pub trend_per_day: Decimal,

    pub trend_per_week: Decimal,

    /// Projected year-end value at the current trend, clamped at zero.
    pub forecast_eoy: Decimal,

    /// Pace needed for the remainder of the year; zero once the goal is met.
    pub required_per_week: Decimal,

    /// Trailing-window average value per activity, when both series exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_activity: Option<Decimal>,

    pub lines: ForecastLines,
}

/// Compute the day-granular forecast for one metric.
pub fn calculate_forecast(input: &ForecastInput) -> ForecastResult {
    let year_len = Decimal::from(calendar::days_in_year(input.year));
    let day_of_year = Decimal::from(input.today.ordinal());

    let per_day_ideal = input.goal_value / year_len;
    let expected_today = per_day_ideal * day_of_year;
    let delta = input.current_value - expected_today;
    let days_ahead = if per_day_ideal.is_zero() {
        Decimal::ZERO
    } else {
        delta / per_day_ideal
    };

    let label = if days_ahead >= Decimal::ZERO {
        format!("{} days ahead", round_dp(days_ahead, 0))
    } else {
        format!("{} days behind", round_dp(days_ahead.abs(), 0))
    };

    let trend_per_day = trend_per_day(input, day_of_year);
    let trend_per_week = trend_per_day * Decimal::from(7);

    let days_left = year_len - day_of_year;
    let forecast_eoy = (input.current_value + trend_per_day * days_left).max(Decimal::ZERO);

    let remaining = (input.goal_value - input.current_value).max(Decimal::ZERO);
    let remaining_days = days_left.max(Decimal::ONE);
    let required_per_week = remaining / remaining_days * Decimal::from(7);

    let mut status = ForecastStatus::OnTrack;
    if days_ahead < Decimal::ZERO {
        status = if expected_today > Decimal::ZERO {
            let deviation_percent = delta / expected_today * Decimal::from(100);
            if deviation_percent < Decimal::from(-30) {
                ForecastStatus::Danger
            } else {
                ForecastStatus::Warning
            }
        } else {
            ForecastStatus::Warning
        };
    }

    let lines = monthly_lines(input, trend_per_day);

    ForecastResult {
        expected_today: round_dp(expected_today, 1),
        delta: round_dp(delta, 1),
        days_ahead: round_dp(days_ahead, 1),
        label,
        status,
        trend_per_day: round_dp(trend_per_day, 2),
        trend_per_week: round_dp(trend_per_week, 2),
        forecast_eoy: round_dp(forecast_eoy, 1),
        required_per_week: round_dp(required_per_week, 2),
        per_activity: per_activity_average(input),
        lines,
    }
}

/// Average daily progress over the trailing window (per calendar day, not
/// per training day), falling back to the YTD daily average when the series
/// is short or stale.
fn trend_per_day(input: &ForecastInput, day_of_year: Decimal) -> Decimal {
    let series = match input.daily_series {
        Some(series) if series.len() >= 7 => series,
        _ => return ytd_daily_average(input.current_value, day_of_year),
    };

    let lookback = input.lookback_days.max(1);
    let cutoff = input.today - Duration::days(i64::from(lookback));

    let mut recent_sum = Decimal::ZERO;
    let mut recent_points = 0usize;
    for point in series.iter().filter(|p| p.date >= cutoff) {
        recent_sum += point.value;
        recent_points += 1;
    }

    if recent_points == 0 {
        return ytd_daily_average(input.current_value, day_of_year);
    }

    recent_sum / Decimal::from(lookback)
}

fn ytd_daily_average(current_value: Decimal, day_of_year: Decimal) -> Decimal {
    if day_of_year.is_zero() {
        Decimal::ZERO
    } else {
        current_value / day_of_year
    }
}

/// Trailing-window value sum over activity-count sum, when both series are
/// supplied and the window saw any activity.
fn per_activity_average(input: &ForecastInput) -> Option<Decimal> {
    let series = input.daily_series.filter(|s| !s.is_empty())?;
    let counts = input.activity_count_by_day.filter(|s| !s.is_empty())?;

    let cutoff = input.today - Duration::days(i64::from(input.lookback_days.max(1)));

    let value_sum: Decimal = series
        .iter()
        .filter(|p| p.date >= cutoff)
        .map(|p| p.value)
        .sum();
    let count_sum: Decimal = counts
        .iter()
        .filter(|p| p.date >= cutoff)
        .map(|p| p.value)
        .sum();

    if count_sum <= Decimal::ZERO {
        return None;
    }
    Some(round_dp(value_sum / count_sum, 2))
}

/// Twelve monthly samples (at the 15th) for the ideal, actual, and forecast
/// lines. Past months show real cumulative progress; future months project
/// at the current trend. All values clamp at zero.
fn monthly_lines(input: &ForecastInput, trend_per_day: Decimal) -> ForecastLines {
    let year_len = Decimal::from(calendar::days_in_year(input.year));
    let doy_today = Decimal::from(input.today.ordinal());
    let series = input.daily_series.filter(|s| !s.is_empty());

    let mut lines = ForecastLines::default();

    for month in 1..=12 {
        let mid = calendar::mid_month(input.year, month);
        let doy_month = Decimal::from(mid.ordinal());
        let progress = doy_month / year_len;
        let x = round_dp(progress, 4);

        lines.ideal.push(Point {
            x,
            y: round_dp(input.goal_value * progress, 2),
        });

        let actual_value = match series {
            Some(series) => {
                let month_end = calendar::month_end(input.year, month);
                series
                    .iter()
                    .filter(|p| p.date <= month_end)
                    .map(|p| p.value)
                    .sum::<Decimal>()
            }
            None => {
                // No series: interpolate linearly up to today, flat after.
                if doy_month <= doy_today {
                    input.current_value * (doy_month / doy_today)
                } else {
                    input.current_value
                }
            }
        };
        let actual_y = actual_value.max(Decimal::ZERO);
        lines.actual.push(Point {
            x,
            y: round_dp(actual_y, 2),
        });

        let forecast_y = if doy_month <= doy_today {
            actual_y
        } else {
            (input.current_value + trend_per_day * (doy_month - doy_today)).max(Decimal::ZERO)
        };
        lines.forecast.push(Point {
            x,
            y: round_dp(forecast_y, 2),
        });
    }

    lines
}

/// One metric of the year-linear dashboard forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetric {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Decimal>,

    pub ytd: Decimal,

    /// Fraction of the goal reached, capped at 1; `None` without a positive
    /// goal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<Decimal>,

    /// Straight-line projection: `ytd / days_elapsed * total_days`.
    pub projected_year_end: Decimal,

    pub required_per_week: Decimal,

    /// True when the projection meets the goal, or when no goal is set.
    pub on_track: bool,
}

/// Year-linear forecast for one (year, sport), all three metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub year: i32,
    pub sport: Sport,
    pub as_of_local: NaiveDateTime,
    pub count: ForecastMetric,
    pub distance_km: ForecastMetric,
    pub elevation_m: ForecastMetric,
}

impl Forecast {
    pub fn metric(&self, metric: GoalMetric) -> &ForecastMetric {
        match metric {
            GoalMetric::DistanceKm => &self.distance_km,
            GoalMetric::Count => &self.count,
            GoalMetric::ElevationM => &self.elevation_m,
        }
    }
}

/// Build the year-linear forecast from an aggregate and an optional goal
/// set.
pub fn build_forecast(
    aggregate: &AggregateYear,
    goals: Option<&YearGoals>,
    as_of: NaiveDateTime,
) -> Forecast {
    let year = aggregate.year;
    let soy = calendar::start_of_year_dt(year);
    let eoy = calendar::end_of_year_dt(year);

    // Whole days, inclusive of today; floors at 1 even before Jan 1.
    let days_elapsed = Decimal::from(calendar::whole_days_between(soy, as_of).max(0) + 1);
    let days_remaining = calendar::whole_days_between(as_of, eoy).max(0);
    let weeks_remaining = Decimal::from((days_remaining + 6).div_euclid(7).max(1));
    let total_days = Decimal::from(calendar::whole_days_between(soy, eoy) + 1);

    let goal_for =
        |metric: GoalMetric| goals.and_then(|g| g.metric_goal(year, aggregate.sport, metric));

    let project = |metric: GoalMetric| -> ForecastMetric {
        project_metric(
            aggregate.totals.metric(metric),
            goal_for(metric),
            days_elapsed,
            total_days,
            weeks_remaining,
        )
    };

    Forecast {
        year,
        sport: aggregate.sport,
        as_of_local: as_of,
        count: project(GoalMetric::Count),
        distance_km: project(GoalMetric::DistanceKm),
        elevation_m: project(GoalMetric::ElevationM),
    }
}

fn project_metric(
    ytd: Decimal,
    goal: Option<Decimal>,
    days_elapsed: Decimal,
    total_days: Decimal,
    weeks_remaining: Decimal,
) -> ForecastMetric {
    let projected = ytd / days_elapsed * total_days;

    let required_per_week = match goal {
        Some(goal) if goal > Decimal::ZERO => ((goal - ytd) / weeks_remaining).max(Decimal::ZERO),
        _ => Decimal::ZERO,
    };

    let percent = match goal {
        Some(goal) if goal > Decimal::ZERO => Some(round_dp((ytd / goal).min(Decimal::ONE), 4)),
        _ => None,
    };

    let on_track = match goal {
        Some(goal) if goal > Decimal::ZERO => projected >= goal,
        _ => true,
    };

    ForecastMetric {
        goal,
        ytd,
        percent,
        projected_year_end: round_dp(projected, 1),
        required_per_week: round_dp(required_per_week, 1),
        on_track,
    }
}
