use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sports tracked by the goal engine.
///
/// Activities of any other sport are dropped during normalization; this is
/// an allow-list policy, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Run,
    Ride,
}

impl Sport {
    /// All sports the engine aggregates, in dashboard order.
    pub const ALL: [Sport; 2] = [Sport::Run, Sport::Ride];

    /// Map a provider sport-type string ("Run", "ride", "RUN", ...) to the
    /// enum, case-insensitively. Unmapped strings return `None`.
    pub fn from_provider_type(raw: &str) -> Option<Sport> {
        match raw.trim().to_lowercase().as_str() {
            "run" => Some(Sport::Run),
            "ride" => Some(Sport::Ride),
            _ => None,
        }
    }

    /// Human-readable name for reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Sport::Run => "Run",
            Sport::Ride => "Ride",
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sport::Run => write!(f, "run"),
            Sport::Ride => write!(f, "ride"),
        }
    }
}

impl std::str::FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sport::from_provider_type(s).ok_or_else(|| format!("Invalid sport: {}", s))
    }
}

/// Metrics a yearly goal can be set against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalMetric {
    DistanceKm,
    Count,
    ElevationM,
}

impl GoalMetric {
    pub const ALL: [GoalMetric; 3] = [
        GoalMetric::DistanceKm,
        GoalMetric::Count,
        GoalMetric::ElevationM,
    ];

    /// Display unit suffix ("km", "", "m").
    pub fn unit(&self) -> &'static str {
        match self {
            GoalMetric::DistanceKm => "km",
            GoalMetric::Count => "",
            GoalMetric::ElevationM => "m",
        }
    }

    /// Human-readable name for reports and insights.
    pub fn label(&self) -> &'static str {
        match self {
            GoalMetric::DistanceKm => "Distance",
            GoalMetric::Count => "Activities",
            GoalMetric::ElevationM => "Elevation",
        }
    }

    /// Counts are whole units; distance and elevation carry decimals.
    pub fn is_count(&self) -> bool {
        matches!(self, GoalMetric::Count)
    }
}

impl std::str::FromStr for GoalMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" | "distancekm" => Ok(GoalMetric::DistanceKm),
            "count" | "activities" => Ok(GoalMetric::Count),
            "elevation" | "elevationm" => Ok(GoalMetric::ElevationM),
            _ => Err(format!(
                "Invalid metric: {} (expected distance, count, or elevation)",
                s
            )),
        }
    }
}

/// Weekly-rate strategy used by the rate-based progress engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// Whole-year-to-date average.
    #[default]
    Ytd,
    /// Last 28 days treated as exactly four weeks.
    Rolling28,
    /// Weighted average of the two, rolling weighted by `blend_weight_rolling`.
    Blend,
}

impl std::fmt::Display for ForecastMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastMode::Ytd => write!(f, "ytd"),
            ForecastMode::Rolling28 => write!(f, "rolling28"),
            ForecastMode::Blend => write!(f, "blend"),
        }
    }
}

impl std::str::FromStr for ForecastMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ytd" => Ok(ForecastMode::Ytd),
            "rolling28" | "rolling" => Ok(ForecastMode::Rolling28),
            "blend" => Ok(ForecastMode::Blend),
            _ => Err(format!(
                "Invalid forecast mode: {} (expected ytd, rolling28, or blend)",
                s
            )),
        }
    }
}

/// Activity identifier as providers ship it: numeric from the live API,
/// sometimes stringly from cache dumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityId {
    Numeric(u64),
    Text(String),
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityId::Numeric(n) => write!(f, "{}", n),
            ActivityId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Provider-native activity record.
///
/// Field names and units follow the provider API: distances and elevation in
/// meters, moving time in seconds, timestamps as local ISO-like strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderActivity {
    pub id: ActivityId,

    /// Provider sport-type string, e.g. "Run" or "Ride".
    #[serde(rename = "type")]
    pub activity_type: String,

    /// Local start timestamp, e.g. "2025-07-02T07:10:00".
    pub start_date_local: String,

    /// Distance in meters.
    #[serde(default)]
    pub distance: Decimal,

    /// Elevation gain in meters.
    #[serde(default)]
    pub total_elevation_gain: Decimal,

    /// Moving time in seconds.
    #[serde(default)]
    pub moving_time: u32,

    /// Commute flag; absent means false.
    #[serde(default)]
    pub commute: bool,

    /// Indoor/trainer flag; absent means false.
    #[serde(default)]
    pub trainer: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Previously-cached domain activity record.
///
/// Distances are already in kilometers and the sport is already mapped.
/// Accepts both snake_case and the cache's camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedActivity {
    pub id: ActivityId,

    pub sport: Sport,

    /// Local start timestamp.
    #[serde(alias = "startDate")]
    pub start_date: String,

    /// Distance in kilometers.
    #[serde(alias = "distanceKm")]
    pub distance_km: Decimal,

    /// Elevation gain in meters.
    #[serde(default, alias = "elevationM")]
    pub elevation_m: Decimal,

    /// Moving time in seconds; the cache did not always carry it.
    #[serde(default, alias = "movingTimeSec")]
    pub moving_time_sec: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The two raw activity shapes accepted at the normalization boundary.
///
/// Callers select the variant explicitly (or let serde resolve it for file
/// input); the engine never sniffs shapes at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityRecord {
    Provider(ProviderActivity),
    Cached(CachedActivity),
}

/// One normalized training session.
///
/// Calendar fields (`year`, `month`, `day_of_year`) are derived once at
/// normalization time and never recomputed, so later bucketing stays stable.
/// Immutable after creation; only aggregates derived from these are cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedActivity {
    pub id: String,

    pub sport: Sport,

    /// Authoritative anchor for all day/week/year bucketing.
    pub start_date_local: NaiveDateTime,

    pub year: i32,

    /// Calendar month, 1-12.
    pub month: u32,

    /// Day of year, 1-366.
    pub day_of_year: u32,

    pub distance_km: Decimal,

    pub elevation_m: Decimal,

    pub moving_time_sec: u32,

    pub is_commute: bool,

    pub is_indoor: bool,
}

impl NormalizedActivity {
    /// Contribution of this activity to a goal metric (count contributes 1).
    pub fn metric_value(&self, metric: GoalMetric) -> Decimal {
        match metric {
            GoalMetric::DistanceKm => self.distance_km,
            GoalMetric::Count => Decimal::ONE,
            GoalMetric::ElevationM => self.elevation_m,
        }
    }
}

/// Additive accumulator over a set of activities.
///
/// Always derivable as the sum of its constituents; zero-valued for empty
/// sets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricTotals {
    pub count: u32,
    pub distance_km: Decimal,
    pub elevation_m: Decimal,
    pub moving_time_hours: Decimal,
}

impl MetricTotals {
    pub fn add_activity(&mut self, activity: &NormalizedActivity) {
        self.count += 1;
        self.distance_km += activity.distance_km;
        self.elevation_m += activity.elevation_m;
        self.moving_time_hours +=
            Decimal::from(activity.moving_time_sec) / Decimal::from(3600);
    }

    /// Value of a single goal metric within these totals.
    pub fn metric(&self, metric: GoalMetric) -> Decimal {
        match metric {
            GoalMetric::DistanceKm => self.distance_km,
            GoalMetric::Count => Decimal::from(self.count),
            GoalMetric::ElevationM => self.elevation_m,
        }
    }
}

impl std::ops::Add for MetricTotals {
    type Output = MetricTotals;

    fn add(self, other: MetricTotals) -> MetricTotals {
        MetricTotals {
            count: self.count + other.count,
            distance_km: self.distance_km + other.distance_km,
            elevation_m: self.elevation_m + other.elevation_m,
            moving_time_hours: self.moving_time_hours + other.moving_time_hours,
        }
    }
}

/// Per-month accumulators for one (year, sport).
///
/// Slot 0 is unused and stays zero so calendar months index 1-12 directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBuckets {
    pub count: [u32; 13],
    pub distance_km: [Decimal; 13],
    pub elevation_m: [Decimal; 13],
    pub moving_time_hours: [Decimal; 13],
}

impl Default for MonthBuckets {
    fn default() -> Self {
        MonthBuckets {
            count: [0; 13],
            distance_km: [Decimal::ZERO; 13],
            elevation_m: [Decimal::ZERO; 13],
            moving_time_hours: [Decimal::ZERO; 13],
        }
    }
}

impl MonthBuckets {
    pub fn add_activity(&mut self, activity: &NormalizedActivity) {
        let m = activity.month as usize;
        self.count[m] += 1;
        self.distance_km[m] += activity.distance_km;
        self.elevation_m[m] += activity.elevation_m;
        self.moving_time_hours[m] +=
            Decimal::from(activity.moving_time_sec) / Decimal::from(3600);
    }
}

/// Trailing-window totals ending at the aggregation's `as_of` instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RollingTotals {
    pub last7: MetricTotals,
    pub last28: MetricTotals,
}

/// Summary of one (year, sport): yearly totals, month buckets, and rolling
/// 7/28-day windows relative to an explicit `as_of` instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateYear {
    pub year: i32,

    pub sport: Sport,

    pub totals: MetricTotals,

    pub by_month: MonthBuckets,

    pub rolling: RollingTotals,

    /// Start of the chronologically-last activity in the filtered set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_local: Option<NaiveDateTime>,
}

/// User-set targets for one sport. `None` means no goal set for that metric,
/// never zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SportGoals {
    #[serde(default, alias = "distanceKm", skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Decimal>,

    #[serde(default, alias = "elevationM", skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<Decimal>,
}

impl SportGoals {
    pub fn metric(&self, metric: GoalMetric) -> Option<Decimal> {
        match metric {
            GoalMetric::DistanceKm => self.distance_km,
            GoalMetric::Count => self.count,
            GoalMetric::ElevationM => self.elevation_m,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.distance_km.is_none() && self.count.is_none() && self.elevation_m.is_none()
    }
}

/// Yearly goal set, keyed by sport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearGoals {
    pub year: i32,

    #[serde(default, alias = "perSport")]
    pub per_sport: HashMap<Sport, SportGoals>,
}

impl YearGoals {
    pub fn new(year: i32) -> Self {
        YearGoals {
            year,
            per_sport: HashMap::new(),
        }
    }

    pub fn for_sport(&self, sport: Sport) -> Option<&SportGoals> {
        self.per_sport.get(&sport)
    }

    /// Goal value for (year, sport, metric); `None` when the goal set is for
    /// a different year or the metric is unset.
    pub fn metric_goal(&self, year: i32, sport: Sport, metric: GoalMetric) -> Option<Decimal> {
        if self.year != year {
            return None;
        }
        self.for_sport(sport).and_then(|g| g.metric(metric))
    }
}

/// One calendar day's summed metric value within a daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Round half-away-from-zero at the given number of decimals, the display
/// rounding used across all engine outputs.
pub(crate) fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sport_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Sport::Run).unwrap(), "\"run\"");
        assert_eq!(serde_json::to_string(&Sport::Ride).unwrap(), "\"ride\"");

        let sport: Sport = serde_json::from_str("\"ride\"").unwrap();
        assert_eq!(sport, Sport::Ride);
    }

    #[test]
    fn test_sport_provider_mapping() {
        assert_eq!(Sport::from_provider_type("Run"), Some(Sport::Run));
        assert_eq!(Sport::from_provider_type("RIDE"), Some(Sport::Ride));
        assert_eq!(Sport::from_provider_type(" run "), Some(Sport::Run));
        assert_eq!(Sport::from_provider_type("Hike"), None);
        assert_eq!(Sport::from_provider_type(""), None);
    }

    #[test]
    fn test_forecast_mode_parsing() {
        assert_eq!("blend".parse::<ForecastMode>().unwrap(), ForecastMode::Blend);
        assert_eq!(
            "ROLLING28".parse::<ForecastMode>().unwrap(),
            ForecastMode::Rolling28
        );
        assert!("median".parse::<ForecastMode>().is_err());
        assert_eq!(
            serde_json::to_string(&ForecastMode::Rolling28).unwrap(),
            "\"rolling28\""
        );
    }

    #[test]
    fn test_goal_metric_serde_camel_case() {
        assert_eq!(
            serde_json::to_string(&GoalMetric::DistanceKm).unwrap(),
            "\"distanceKm\""
        );
        assert_eq!(
            serde_json::to_string(&GoalMetric::ElevationM).unwrap(),
            "\"elevationM\""
        );
    }

    #[test]
    fn test_goal_metric_parsing() {
        assert_eq!(
            "distance".parse::<GoalMetric>().unwrap(),
            GoalMetric::DistanceKm
        );
        assert_eq!("activities".parse::<GoalMetric>().unwrap(), GoalMetric::Count);
        assert_eq!(
            "elevationM".parse::<GoalMetric>().unwrap(),
            GoalMetric::ElevationM
        );
        assert!("pace".parse::<GoalMetric>().is_err());
    }

    #[test]
    fn test_provider_record_deserialization() {
        let json = r#"{
            "id": 987654,
            "type": "Run",
            "start_date_local": "2025-07-02T07:10:00",
            "distance": 12000,
            "total_elevation_gain": 180,
            "moving_time": 4200,
            "commute": false
        }"#;

        let record: ActivityRecord = serde_json::from_str(json).unwrap();
        match record {
            ActivityRecord::Provider(p) => {
                assert_eq!(p.id, ActivityId::Numeric(987654));
                assert_eq!(p.activity_type, "Run");
                assert_eq!(p.distance, dec!(12000));
                assert!(!p.trainer);
            }
            ActivityRecord::Cached(_) => panic!("expected provider shape"),
        }
    }

    #[test]
    fn test_cached_record_deserialization_camel_case() {
        let json = r#"{
            "id": 42,
            "sport": "ride",
            "startDate": "2025-03-14T09:00:00",
            "distanceKm": 42.5,
            "elevationM": 610
        }"#;

        let record: ActivityRecord = serde_json::from_str(json).unwrap();
        match record {
            ActivityRecord::Cached(c) => {
                assert_eq!(c.sport, Sport::Ride);
                assert_eq!(c.distance_km, dec!(42.5));
                assert_eq!(c.moving_time_sec, 0);
            }
            ActivityRecord::Provider(_) => panic!("expected cached shape"),
        }
    }

    #[test]
    fn test_cached_record_deserialization_snake_case() {
        let json = r#"{
            "id": "a-17",
            "sport": "run",
            "start_date": "2025-03-15T06:30:00",
            "distance_km": 10.0,
            "elevation_m": 55,
            "moving_time_sec": 3000
        }"#;

        let record: ActivityRecord = serde_json::from_str(json).unwrap();
        match record {
            ActivityRecord::Cached(c) => {
                assert_eq!(c.id, ActivityId::Text("a-17".to_string()));
                assert_eq!(c.moving_time_sec, 3000);
            }
            ActivityRecord::Provider(_) => panic!("expected cached shape"),
        }
    }

    #[test]
    fn test_metric_totals_additive() {
        let activity = NormalizedActivity {
            id: "1".to_string(),
            sport: Sport::Run,
            start_date_local: NaiveDate::from_ymd_opt(2025, 7, 2)
                .unwrap()
                .and_hms_opt(7, 10, 0)
                .unwrap(),
            year: 2025,
            month: 7,
            day_of_year: 183,
            distance_km: dec!(12.0),
            elevation_m: dec!(180),
            moving_time_sec: 3600,
            is_commute: false,
            is_indoor: false,
        };

        let mut totals = MetricTotals::default();
        totals.add_activity(&activity);
        totals.add_activity(&activity);

        assert_eq!(totals.count, 2);
        assert_eq!(totals.distance_km, dec!(24.0));
        assert_eq!(totals.moving_time_hours, dec!(2));

        let sum = totals + MetricTotals::default();
        assert_eq!(sum, totals);
    }

    #[test]
    fn test_metric_totals_metric_extraction() {
        let totals = MetricTotals {
            count: 7,
            distance_km: dec!(101.5),
            elevation_m: dec!(1200),
            moving_time_hours: dec!(10.25),
        };

        assert_eq!(totals.metric(GoalMetric::Count), dec!(7));
        assert_eq!(totals.metric(GoalMetric::DistanceKm), dec!(101.5));
        assert_eq!(totals.metric(GoalMetric::ElevationM), dec!(1200));
    }

    #[test]
    fn test_month_buckets_default_zeroed() {
        let buckets = MonthBuckets::default();
        assert_eq!(buckets.count, [0; 13]);
        assert!(buckets.distance_km.iter().all(|d| d.is_zero()));
    }

    #[test]
    fn test_year_goals_parsing_with_aliases() {
        let json = r#"{
            "year": 2025,
            "perSport": {
                "run": { "distanceKm": 1000, "count": 120 },
                "ride": { "elevationM": 15000 }
            }
        }"#;

        let goals: YearGoals = serde_json::from_str(json).unwrap();
        assert_eq!(
            goals.metric_goal(2025, Sport::Run, GoalMetric::DistanceKm),
            Some(dec!(1000))
        );
        assert_eq!(
            goals.metric_goal(2025, Sport::Run, GoalMetric::ElevationM),
            None
        );
        assert_eq!(
            goals.metric_goal(2025, Sport::Ride, GoalMetric::ElevationM),
            Some(dec!(15000))
        );
        // A goal set for a different year never applies.
        assert_eq!(
            goals.metric_goal(2024, Sport::Run, GoalMetric::DistanceKm),
            None
        );
    }

    #[test]
    fn test_sport_goals_absent_means_unset() {
        let goals: SportGoals = serde_json::from_str("{}").unwrap();
        assert!(goals.is_empty());
        assert_eq!(goals.metric(GoalMetric::Count), None);
    }

    #[test]
    fn test_round_dp_midpoint_away_from_zero() {
        assert_eq!(round_dp(dec!(1.25), 1), dec!(1.3));
        assert_eq!(round_dp(dec!(-1.25), 1), dec!(-1.3));
        assert_eq!(round_dp(dec!(2.4), 0), dec!(2));
    }
}
