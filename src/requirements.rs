//! Planning review per sport: recent-form snapshot, baseline year-end
//! projection, required pace per goal, consistency, and risk flags.
//!
//! This is the secondary "remaining over remaining-time" estimate consumed
//! by insight generation; it agrees with the rate-based progress engine
//! within rounding tolerance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::YearContext;
use crate::models::{round_dp, AggregateYear, MetricTotals, Sport, SportGoals};

/// Weekly-average rates derived from a 28-day window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyAverages {
    pub distance_km: Decimal,
    pub count: Decimal,
    pub elevation_m: Decimal,
}

/// Recent-form summary for one sport: YTD totals plus trailing windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportSnapshot {
    pub sport: Sport,

    pub ytd: MetricTotals,

    pub last7: MetricTotals,

    pub last28: MetricTotals,

    /// Last 28 days treated as four weeks.
    pub avg_weekly_28d: WeeklyAverages,

    /// Only meaningful for running, and only with at least one run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_km_per_run: Option<Decimal>,
}

impl SportSnapshot {
    pub fn from_aggregate(aggregate: &AggregateYear) -> SportSnapshot {
        let four = Decimal::from(4);
        let last28 = aggregate.rolling.last28;

        let avg_weekly_28d = WeeklyAverages {
            distance_km: last28.distance_km / four,
            count: Decimal::from(last28.count) / four,
            elevation_m: last28.elevation_m / four,
        };

        let avg_km_per_run = if aggregate.sport == Sport::Run && aggregate.totals.count > 0 {
            Some(round_dp(
                aggregate.totals.distance_km / Decimal::from(aggregate.totals.count),
                2,
            ))
        } else {
            None
        };

        SportSnapshot {
            sport: aggregate.sport,
            ytd: aggregate.totals,
            last7: aggregate.rolling.last7,
            last28,
            avg_weekly_28d,
            avg_km_per_run,
        }
    }
}

/// Year-end projection per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricProjection {
    pub distance_km: Decimal,
    pub count: Decimal,
    pub elevation_m: Decimal,
}

/// Required weekly pace per metric; `None` where no goal is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RequiredPace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<Decimal>,
}

/// Overtraining / consistency signals derived from recent windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFlag {
    /// Last week ran more than 1.5x the 28-day weekly average.
    VolumeSpike,
    /// Consistency score below 40.
    Inconsistent,
    /// Activity on seven or more of the last seven days.
    NoRestDay,
}

impl std::fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskFlag::VolumeSpike => write!(f, "volume spike"),
            RiskFlag::Inconsistent => write!(f, "inconsistent training"),
            RiskFlag::NoRestDay => write!(f, "no rest day"),
        }
    }
}

/// Baseline EOY projection: current YTD plus the 28-day weekly rate over
/// the remaining weeks. Distance keeps one decimal; elevation and count
/// round to whole units.
pub fn project_year_end(ctx: &YearContext, snapshot: &SportSnapshot) -> MetricProjection {
    let weeks_left = Decimal::from(ctx.weeks_left_in_year);

    MetricProjection {
        distance_km: round_dp(
            snapshot.ytd.distance_km + snapshot.avg_weekly_28d.distance_km * weeks_left,
            1,
        ),
        count: round_dp(
            Decimal::from(snapshot.ytd.count) + snapshot.avg_weekly_28d.count * weeks_left,
            0,
        ),
        elevation_m: round_dp(
            snapshot.ytd.elevation_m + snapshot.avg_weekly_28d.elevation_m * weeks_left,
            0,
        ),
    }
}

/// Pace needed per remaining week to close each set goal; already-met goals
/// require zero.
pub fn required_per_week(
    ctx: &YearContext,
    snapshot: &SportSnapshot,
    goals: &SportGoals,
) -> RequiredPace {
    let weeks = Decimal::from(ctx.weeks_left_in_year.max(1));

    let requirement = |goal: Option<Decimal>, ytd: Decimal, dp: u32| {
        goal.map(|goal| round_dp((goal - ytd).max(Decimal::ZERO) / weeks, dp))
    };

    RequiredPace {
        distance_km: requirement(goals.distance_km, snapshot.ytd.distance_km, 1),
        count: requirement(goals.count, Decimal::from(snapshot.ytd.count), 1),
        elevation_m: requirement(goals.elevation_m, snapshot.ytd.elevation_m, 0),
    }
}

/// 0-100 score comparing last week's distance against the 28-day weekly
/// baseline. 50 when there is recent volume but no baseline yet; 0 when
/// idle.
pub fn consistency_score(snapshot: &SportSnapshot) -> Decimal {
    let last7 = snapshot.last7.distance_km;
    let baseline = snapshot.avg_weekly_28d.distance_km;

    if baseline.is_zero() {
        return if last7 > Decimal::ZERO {
            Decimal::from(50)
        } else {
            Decimal::ZERO
        };
    }

    let deviation = (last7 - baseline).abs() / baseline;
    let score = Decimal::from(100) * (Decimal::ONE - deviation);
    round_dp(score.clamp(Decimal::ZERO, Decimal::from(100)), 0)
}

pub fn risk_flags(snapshot: &SportSnapshot) -> Vec<RiskFlag> {
    let mut flags = Vec::new();

    let spike_factor = Decimal::new(15, 1);
    let baseline = snapshot.avg_weekly_28d.distance_km;
    if baseline > Decimal::ZERO && snapshot.last7.distance_km > spike_factor * baseline {
        flags.push(RiskFlag::VolumeSpike);
    }

    if consistency_score(snapshot) < Decimal::from(40) {
        flags.push(RiskFlag::Inconsistent);
    }

    if snapshot.last7.count >= 7 {
        flags.push(RiskFlag::NoRestDay);
    }

    flags
}

/// Full planning review for one sport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportReview {
    pub snapshot: SportSnapshot,
    pub consistency_score: Decimal,
    pub baseline_forecast_eoy: MetricProjection,
    pub required_per_week: RequiredPace,
    pub risk_flags: Vec<RiskFlag>,
}

/// Compose snapshot, projection, required pace, and risk flags for one
/// sport. Absent goals behave as an empty goal set.
pub fn review_sport(
    ctx: &YearContext,
    aggregate: &AggregateYear,
    goals: Option<&SportGoals>,
) -> SportReview {
    let snapshot = SportSnapshot::from_aggregate(aggregate);
    let empty = SportGoals::default();
    let goals = goals.unwrap_or(&empty);

    let consistency = consistency_score(&snapshot);
    let baseline_forecast_eoy = project_year_end(ctx, &snapshot);
    let required = required_per_week(ctx, &snapshot, goals);
    let flags = risk_flags(&snapshot);

    SportReview {
        consistency_score: consistency,
        baseline_forecast_eoy,
        required_per_week: required,
        risk_flags: flags,
        snapshot,
    }
}
