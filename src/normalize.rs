//! Normalization of raw activity records into the canonical shape.
//!
//! Both accepted input shapes (provider-native and previously-cached) funnel
//! through here. Unmapped sports and unparseable timestamps drop the single
//! record, never the batch.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::trace;

use crate::models::{
    ActivityRecord, CachedActivity, NormalizedActivity, ProviderActivity, Sport,
};

/// Options for a normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Keep commute-flagged activities. Default true.
    pub include_commute: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            include_commute: true,
        }
    }
}

/// Convert raw records into normalized activities, sorted ascending by
/// local start time.
///
/// Dropping is silent by policy: other sports are out of scope, and one
/// bad timestamp must not fail a whole batch.
pub fn normalize_activities(
    records: &[ActivityRecord],
    options: &NormalizeOptions,
) -> Vec<NormalizedActivity> {
    let mut normalized: Vec<NormalizedActivity> = records
        .iter()
        .filter_map(|record| match record {
            ActivityRecord::Provider(provider) => normalize_provider(provider, options),
            ActivityRecord::Cached(cached) => normalize_cached(cached),
        })
        .collect();

    normalized.sort_by_key(|a| a.start_date_local);
    normalized
}

fn normalize_provider(
    activity: &ProviderActivity,
    options: &NormalizeOptions,
) -> Option<NormalizedActivity> {
    let sport = match Sport::from_provider_type(&activity.activity_type) {
        Some(sport) => sport,
        None => {
            trace!(
                "Dropping activity {}: unmapped sport type '{}'",
                activity.id,
                activity.activity_type
            );
            return None;
        }
    };

    let start = match parse_local_timestamp(&activity.start_date_local) {
        Some(start) => start,
        None => {
            trace!(
                "Dropping activity {}: unparseable timestamp '{}'",
                activity.id,
                activity.start_date_local
            );
            return None;
        }
    };

    if !options.include_commute && activity.commute {
        return None;
    }

    Some(NormalizedActivity {
        id: activity.id.to_string(),
        sport,
        start_date_local: start,
        year: start.year(),
        month: start.month(),
        day_of_year: start.ordinal(),
        distance_km: activity.distance / Decimal::from(1000),
        elevation_m: activity.total_elevation_gain,
        moving_time_sec: activity.moving_time,
        is_commute: activity.commute,
        is_indoor: activity.trainer,
    })
}

fn normalize_cached(activity: &CachedActivity) -> Option<NormalizedActivity> {
    let start = match parse_local_timestamp(&activity.start_date) {
        Some(start) => start,
        None => {
            trace!(
                "Dropping cached activity {}: unparseable timestamp '{}'",
                activity.id,
                activity.start_date
            );
            return None;
        }
    };

    // The cache never carried commute or indoor flags.
    Some(NormalizedActivity {
        id: activity.id.to_string(),
        sport: activity.sport,
        start_date_local: start,
        year: start.year(),
        month: start.month(),
        day_of_year: start.ordinal(),
        distance_km: activity.distance_km,
        elevation_m: activity.elevation_m,
        moving_time_sec: activity.moving_time_sec,
        is_commute: false,
        is_indoor: false,
    })
}

/// Parse a local timestamp string in the formats providers actually ship:
/// ISO with or without fractional seconds, a space separator, RFC 3339 with
/// an offset (the written clock time is taken as local), or a bare date
/// (midnight).
pub fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
