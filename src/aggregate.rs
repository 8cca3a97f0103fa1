//! Aggregation of normalized activities into yearly summaries.
//!
//! All aggregation is relative to an explicit `as_of` instant supplied by
//! the caller. No function here reads a clock.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{
    AggregateYear, DailyPoint, GoalMetric, MetricTotals, MonthBuckets, NormalizedActivity,
    RollingTotals, Sport,
};

/// Summarize one (year, sport): totals, month buckets, and rolling 7/28-day
/// windows ending at `as_of`.
///
/// Window membership is `as_of - N days <= start <= as_of`, inclusive on
/// both ends, with the cutoff computed by exact instant subtraction.
pub fn aggregate_year(
    normalized: &[NormalizedActivity],
    year: i32,
    sport: Sport,
    as_of: NaiveDateTime,
) -> AggregateYear {
    let filtered: Vec<&NormalizedActivity> = normalized
        .iter()
        .filter(|a| a.year == year && a.sport == sport)
        .collect();

    let mut totals = MetricTotals::default();
    let mut by_month = MonthBuckets::default();
    for activity in &filtered {
        totals.add_activity(activity);
        by_month.add_activity(activity);
    }

    let cutoff7 = as_of - Duration::days(7);
    let cutoff28 = as_of - Duration::days(28);

    let mut last7 = MetricTotals::default();
    let mut last28 = MetricTotals::default();
    for activity in &filtered {
        let start = activity.start_date_local;
        if start > as_of {
            continue;
        }
        if start >= cutoff7 {
            last7.add_activity(activity);
        }
        if start >= cutoff28 {
            last28.add_activity(activity);
        }
    }

    // Relies on the normalizer's ascending sort.
    let last_activity_local = filtered.last().map(|a| a.start_date_local);

    debug!(
        "Aggregated {} {} activities for {} (last7: {}, last28: {})",
        filtered.len(),
        sport,
        year,
        last7.count,
        last28.count
    );

    AggregateYear {
        year,
        sport,
        totals,
        by_month,
        rolling: RollingTotals { last7, last28 },
        last_activity_local,
    }
}

/// One point per calendar day with activity, values summed per day,
/// ascending by date. Input to the day-granular forecast's trend window.
pub fn daily_metric_series(
    normalized: &[NormalizedActivity],
    year: i32,
    sport: Sport,
    metric: GoalMetric,
) -> Vec<DailyPoint> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for activity in normalized
        .iter()
        .filter(|a| a.year == year && a.sport == sport)
    {
        *by_day
            .entry(activity.start_date_local.date())
            .or_insert(Decimal::ZERO) += activity.metric_value(metric);
    }

    by_day
        .into_iter()
        .map(|(date, value)| DailyPoint { date, value })
        .collect()
}

/// Activities per calendar day, for per-activity averages.
pub fn daily_count_series(
    normalized: &[NormalizedActivity],
    year: i32,
    sport: Sport,
) -> Vec<DailyPoint> {
    daily_metric_series(normalized, year, sport, GoalMetric::Count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rust_decimal_macros::dec;

    fn make_activity(
        id: &str,
        sport: Sport,
        start: &str,
        km: Decimal,
        elevation: Decimal,
        secs: u32,
    ) -> NormalizedActivity {
        let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S").unwrap();
        NormalizedActivity {
            id: id.to_string(),
            sport,
            start_date_local: start,
            year: start.year(),
            month: start.month(),
            day_of_year: start.ordinal(),
            distance_km: km,
            elevation_m: elevation,
            moving_time_sec: secs,
            is_commute: false,
            is_indoor: false,
        }
    }

    fn mid_year() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-07-02T12:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn test_totals_and_month_buckets() {
        let activities = vec![
            make_activity("1", Sport::Run, "2025-01-10T07:00:00", dec!(10), dec!(100), 3600),
            make_activity("2", Sport::Run, "2025-01-20T07:00:00", dec!(12), dec!(150), 4200),
            make_activity("3", Sport::Run, "2025-07-01T07:00:00", dec!(8), dec!(50), 2400),
        ];

        let agg = aggregate_year(&activities, 2025, Sport::Run, mid_year());

        assert_eq!(agg.totals.count, 3);
        assert_eq!(agg.totals.distance_km, dec!(30));
        assert_eq!(agg.totals.elevation_m, dec!(300));

        assert_eq!(agg.by_month.count[1], 2);
        assert_eq!(agg.by_month.distance_km[1], dec!(22));
        assert_eq!(agg.by_month.count[7], 1);
        assert_eq!(agg.by_month.count[0], 0);
    }

    #[test]
    fn test_filters_year_and_sport() {
        let activities = vec![
            make_activity("1", Sport::Run, "2025-03-01T07:00:00", dec!(10), dec!(0), 3600),
            make_activity("2", Sport::Ride, "2025-03-01T08:00:00", dec!(40), dec!(0), 5400),
            make_activity("3", Sport::Run, "2024-03-01T07:00:00", dec!(10), dec!(0), 3600),
        ];

        let agg = aggregate_year(&activities, 2025, Sport::Run, mid_year());

        assert_eq!(agg.totals.count, 1);
        assert_eq!(agg.totals.distance_km, dec!(10));
    }

    #[test]
    fn test_rolling_window_boundaries_inclusive() {
        let activities = vec![
            // Exactly at the 7-day cutoff instant: included.
            make_activity("1", Sport::Run, "2025-06-25T12:00:00", dec!(5), dec!(0), 1800),
            // One second earlier: out of last7, still in last28.
            make_activity("2", Sport::Run, "2025-06-25T11:59:59", dec!(7), dec!(0), 1800),
            // Exactly at as_of: included.
            make_activity("3", Sport::Run, "2025-07-02T12:00:00", dec!(9), dec!(0), 1800),
            // After as_of: in totals but in no window.
            make_activity("4", Sport::Run, "2025-07-02T12:00:01", dec!(11), dec!(0), 1800),
            // Before the 28-day cutoff: in totals only.
            make_activity("5", Sport::Run, "2025-06-01T12:00:00", dec!(13), dec!(0), 1800),
        ];

        let agg = aggregate_year(&activities, 2025, Sport::Run, mid_year());

        assert_eq!(agg.totals.count, 5);
        assert_eq!(agg.rolling.last7.count, 2);
        assert_eq!(agg.rolling.last7.distance_km, dec!(14));
        assert_eq!(agg.rolling.last28.count, 3);
        assert_eq!(agg.rolling.last28.distance_km, dec!(21));
    }

    #[test]
    fn test_empty_input_yields_zero_struct() {
        let agg = aggregate_year(&[], 2025, Sport::Ride, mid_year());

        assert_eq!(agg.totals, MetricTotals::default());
        assert_eq!(agg.rolling.last7.count, 0);
        assert_eq!(agg.last_activity_local, None);
    }

    #[test]
    fn test_last_activity_follows_sort_order() {
        let activities = vec![
            make_activity("1", Sport::Run, "2025-02-01T07:00:00", dec!(10), dec!(0), 3600),
            make_activity("2", Sport::Run, "2025-06-30T07:00:00", dec!(10), dec!(0), 3600),
        ];

        let agg = aggregate_year(&activities, 2025, Sport::Run, mid_year());

        assert_eq!(
            agg.last_activity_local,
            Some(NaiveDateTime::parse_from_str("2025-06-30T07:00:00", "%Y-%m-%dT%H:%M:%S").unwrap())
        );
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let activities = vec![
            make_activity("1", Sport::Run, "2025-04-05T07:00:00", dec!(21.1), dec!(210), 6300),
            make_activity("2", Sport::Run, "2025-06-28T07:00:00", dec!(10.55), dec!(80), 3000),
        ];

        let first = aggregate_year(&activities, 2025, Sport::Run, mid_year());
        let second = aggregate_year(&activities, 2025, Sport::Run, mid_year());

        assert_eq!(first, second);
    }

    #[test]
    fn test_totals_are_additive_over_partitions() {
        let all = vec![
            make_activity("1", Sport::Run, "2025-01-10T07:00:00", dec!(10.5), dec!(100), 3600),
            make_activity("2", Sport::Run, "2025-03-15T07:00:00", dec!(15.25), dec!(220), 5400),
            make_activity("3", Sport::Run, "2025-06-20T07:00:00", dec!(8.75), dec!(60), 2700),
        ];

        let whole = aggregate_year(&all, 2025, Sport::Run, mid_year());
        let left = aggregate_year(&all[..1], 2025, Sport::Run, mid_year());
        let right = aggregate_year(&all[1..], 2025, Sport::Run, mid_year());

        assert_eq!(left.totals + right.totals, whole.totals);
    }

    #[test]
    fn test_daily_series_sums_per_day() {
        let activities = vec![
            make_activity("1", Sport::Run, "2025-05-01T07:00:00", dec!(5), dec!(10), 1800),
            make_activity("2", Sport::Run, "2025-05-01T18:00:00", dec!(7), dec!(20), 2400),
            make_activity("3", Sport::Run, "2025-05-03T07:00:00", dec!(10), dec!(50), 3600),
            make_activity("4", Sport::Ride, "2025-05-02T07:00:00", dec!(40), dec!(300), 5400),
        ];

        let series = daily_metric_series(&activities, 2025, Sport::Run, GoalMetric::DistanceKm);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(series[0].value, dec!(12));
        assert_eq!(series[1].value, dec!(10));

        let counts = daily_count_series(&activities, 2025, Sport::Run);
        assert_eq!(counts[0].value, dec!(2));
        assert_eq!(counts[1].value, dec!(1));
    }
}
