use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use goalrs::models::{DailyPoint, ForecastMode, NormalizedActivity, Sport, SportGoals, YearGoals};
use goalrs::progress::StatsParams;
use goalrs::{
    aggregate_year, build_athlete_stats, build_dashboard_model, calculate_forecast,
    ForecastInput,
};

/// Benchmarks for the aggregation and forecast engines
///
/// These benchmarks sweep activity counts and series lengths to keep the
/// per-report cost flat as a season fills up.

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Aggregation");

    for &size in &[10, 100, 1000, 5000] {
        let activities = create_activity_dataset(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("aggregate_year", size),
            &activities,
            |b, activities| {
                b.iter(|| {
                    let _ = aggregate_year(
                        black_box(activities),
                        2025,
                        Sport::Run,
                        benchmark_as_of(),
                    );
                });
            },
        );
    }

    group.finish();
}

fn bench_day_granular_forecast(c: &mut Criterion) {
    let mut group = c.benchmark_group("Day Forecast");

    for &days in &[7, 30, 90, 183] {
        let series = create_daily_series(days);
        let counts = create_daily_series(days);

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(
            BenchmarkId::new("calculate_forecast", days),
            &(series, counts),
            |b, (series, counts)| {
                b.iter(|| {
                    let mut input = ForecastInput::new(
                        dec!(1000),
                        dec!(500),
                        benchmark_as_of().date(),
                        2025,
                    );
                    input.daily_series = Some(black_box(series));
                    input.activity_count_by_day = Some(black_box(counts));
                    let _ = calculate_forecast(&input);
                });
            },
        );
    }

    group.finish();
}

fn bench_progress_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("Progress Strategies");

    let activities = create_activity_dataset(1000);
    let aggregate = aggregate_year(&activities, 2025, Sport::Run, benchmark_as_of());
    let goals = SportGoals {
        distance_km: Some(dec!(1000)),
        count: Some(dec!(200)),
        elevation_m: Some(dec!(15000)),
    };

    for mode in [ForecastMode::Ytd, ForecastMode::Rolling28, ForecastMode::Blend] {
        group.bench_with_input(
            BenchmarkId::new("build_athlete_stats", format!("{mode}")),
            &aggregate,
            |b, aggregate| {
                b.iter(|| {
                    let params = StatsParams {
                        aggregate: black_box(aggregate),
                        as_of: benchmark_as_of(),
                        retrieved_at_local: "2025-07-02T12:00:00".to_string(),
                        goals: Some(&goals),
                        mode,
                        blend_weight_rolling: None,
                    };
                    let _ = build_athlete_stats(&params);
                });
            },
        );
    }

    group.finish();
}

fn bench_dashboard_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("Dashboard");

    for &size in &[100, 1000, 5000] {
        let activities = create_activity_dataset(size);
        let goals = create_goals();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("build_dashboard_model", size),
            &activities,
            |b, activities| {
                b.iter(|| {
                    let _ = build_dashboard_model(
                        black_box(activities),
                        2025,
                        Some(&goals),
                        benchmark_as_of(),
                    );
                });
            },
        );
    }

    group.finish();
}

fn benchmark_as_of() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 2)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn create_activity_dataset(size: usize) -> Vec<NormalizedActivity> {
    (0..size)
        .map(|i| {
            let start = (NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                + Duration::days((i % 180) as i64))
            .and_hms_opt(7, 0, 0)
            .unwrap();
            let sport = if i % 3 == 0 { Sport::Ride } else { Sport::Run };

            NormalizedActivity {
                id: i.to_string(),
                sport,
                start_date_local: start,
                year: start.year(),
                month: start.month(),
                day_of_year: start.ordinal(),
                distance_km: Decimal::from(5 + (i % 20) as u32),
                elevation_m: Decimal::from((i % 10) as u32 * 50),
                moving_time_sec: 1800 + (i % 5) as u32 * 600,
                is_commute: false,
                is_indoor: i % 7 == 0,
            }
        })
        .collect()
}

fn create_daily_series(days: usize) -> Vec<DailyPoint> {
    (0..days)
        .map(|i| DailyPoint {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(i as i64),
            value: Decimal::from(3 + (i % 12) as u32),
        })
        .collect()
}

fn create_goals() -> YearGoals {
    let mut goals = YearGoals::new(2025);
    goals.per_sport.insert(
        Sport::Run,
        SportGoals {
            distance_km: Some(dec!(1000)),
            count: Some(dec!(200)),
            elevation_m: None,
        },
    );
    goals.per_sport.insert(
        Sport::Ride,
        SportGoals {
            distance_km: Some(dec!(6000)),
            count: None,
            elevation_m: Some(dec!(50000)),
        },
    );
    goals
}

criterion_group!(
    benches,
    bench_aggregation,
    bench_day_granular_forecast,
    bench_progress_strategies,
    bench_dashboard_composition
);

criterion_main!(benches);
