//! File loading for the two raw activity shapes and for goal sets.
//!
//! JSON activity files may mix both shapes in one array; CSV files carry the
//! provider shape with a header row. Goal files are JSON or TOML, dispatched
//! by extension, and accept either a per-sport map or flat `run`/`ride`
//! tables.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{GoalrsError, ImportError, Result};
use crate::models::{
    ActivityId, ActivityRecord, GoalMetric, ProviderActivity, Sport, SportGoals, YearGoals,
};

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Load activity records from a JSON or CSV file, dispatched by extension.
pub fn load_activities(path: &Path) -> Result<Vec<ActivityRecord>> {
    if !path.exists() {
        return Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let records = match extension_of(path).as_deref() {
        Some("json") => load_activities_json(path)?,
        Some("csv") => load_activities_csv(path)?,
        other => {
            return Err(ImportError::UnsupportedFormat {
                format: other.unwrap_or("(none)").to_string(),
            }
            .into())
        }
    };

    debug!(
        path = %path.display(),
        records = records.len(),
        "Loaded activity file"
    );
    if records.is_empty() {
        warn!(path = %path.display(), "Activity file held no records");
    }

    Ok(records)
}

fn load_activities_json(path: &Path) -> Result<Vec<ActivityRecord>> {
    let content = fs::read_to_string(path)?;

    serde_json::from_str(&content).map_err(|e| {
        ImportError::ParseError {
            format: "json".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// One provider-shape CSV row. Numeric cells may be empty; absent flags mean
/// false, matching the JSON shape's defaults.
#[derive(Debug, Deserialize)]
struct CsvActivityRow {
    id: String,

    #[serde(rename = "type")]
    activity_type: String,

    start_date_local: String,

    distance: Option<Decimal>,

    total_elevation_gain: Option<Decimal>,

    moving_time: Option<u32>,

    commute: Option<bool>,

    trainer: Option<bool>,

    name: Option<String>,
}

impl CsvActivityRow {
    fn into_provider(self) -> ProviderActivity {
        // Same inference the untagged JSON id gets: numeric when it parses.
        let id = match self.id.parse::<u64>() {
            Ok(numeric) => ActivityId::Numeric(numeric),
            Err(_) => ActivityId::Text(self.id),
        };

        ProviderActivity {
            id,
            activity_type: self.activity_type,
            start_date_local: self.start_date_local,
            distance: self.distance.unwrap_or(Decimal::ZERO),
            total_elevation_gain: self.total_elevation_gain.unwrap_or(Decimal::ZERO),
            moving_time: self.moving_time.unwrap_or(0),
            commute: self.commute.unwrap_or(false),
            trainer: self.trainer.unwrap_or(false),
            name: self.name,
        }
    }
}

fn load_activities_csv(path: &Path) -> Result<Vec<ActivityRecord>> {
    let csv_error = |e: csv::Error| ImportError::ParseError {
        format: "csv".to_string(),
        reason: e.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<CsvActivityRow>() {
        let row = row.map_err(csv_error)?;
        records.push(ActivityRecord::Provider(row.into_provider()));
    }

    Ok(records)
}

/// Goal file as written by users: either a per-sport map (`per_sport` /
/// `perSport`) or flat `run` / `ride` sections; flat sections win on overlap.
#[derive(Debug, Deserialize)]
struct GoalsFile {
    year: i32,

    #[serde(default, alias = "perSport")]
    per_sport: HashMap<Sport, SportGoals>,

    #[serde(default)]
    run: Option<SportGoals>,

    #[serde(default)]
    ride: Option<SportGoals>,
}

impl GoalsFile {
    fn into_goals(self) -> YearGoals {
        let mut per_sport = self.per_sport;
        if let Some(run) = self.run {
            per_sport.insert(Sport::Run, run);
        }
        if let Some(ride) = self.ride {
            per_sport.insert(Sport::Ride, ride);
        }

        YearGoals {
            year: self.year,
            per_sport,
        }
    }
}

/// Load a goal set from a JSON or TOML file, dispatched by extension.
pub fn load_goals(path: &Path) -> Result<YearGoals> {
    if !path.exists() {
        return Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let content = fs::read_to_string(path)?;

    let file: GoalsFile = match extension_of(path).as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(|e| ImportError::ParseError {
            format: "json".to_string(),
            reason: e.to_string(),
        })?,
        Some("toml") => toml::from_str(&content).map_err(|e| ImportError::ParseError {
            format: "toml".to_string(),
            reason: e.to_string(),
        })?,
        other => {
            return Err(ImportError::UnsupportedFormat {
                format: other.unwrap_or("(none)").to_string(),
            }
            .into())
        }
    };

    let goals = file.into_goals();
    validate_goals(&goals)?;

    debug!(year = goals.year, sports = goals.per_sport.len(), "Loaded goals");
    Ok(goals)
}

fn validate_goals(goals: &YearGoals) -> Result<()> {
    for (sport, sport_goals) in &goals.per_sport {
        for metric in GoalMetric::ALL {
            if let Some(value) = sport_goals.metric(metric) {
                if value < Decimal::ZERO {
                    return Err(GoalrsError::Validation(format!(
                        "{} {} goal must be non-negative, got {}",
                        sport,
                        metric.label().to_lowercase(),
                        value
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(extension: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_json_accepts_both_shapes_in_one_array() {
        let file = temp_file(
            "json",
            r#"[
                {"id": 201, "type": "Run", "start_date_local": "2025-04-01T06:30:00",
                 "distance": 12000.5, "total_elevation_gain": 140, "moving_time": 4000},
                {"id": "cache-1", "sport": "ride", "startDate": "2025-04-02T17:45:00",
                 "distanceKm": 35.2, "elevationM": 280}
            ]"#,
        );

        let records = load_activities(file.path()).unwrap();
        assert_eq!(records.len(), 2);

        match &records[0] {
            ActivityRecord::Provider(p) => {
                assert_eq!(p.id, ActivityId::Numeric(201));
                assert_eq!(p.activity_type, "Run");
            }
            other => panic!("expected provider shape, got {other:?}"),
        }
        match &records[1] {
            ActivityRecord::Cached(c) => {
                assert_eq!(c.sport, Sport::Ride);
                assert_eq!(c.distance_km, dec!(35.2));
            }
            other => panic!("expected cached shape, got {other:?}"),
        }
    }

    #[test]
    fn test_csv_provider_shape() {
        let file = temp_file(
            "csv",
            "id,type,start_date_local,distance,total_elevation_gain,moving_time,commute,trainer,name\n\
             101,Run,2025-03-10T07:15:00,10250,95,3180,false,false,Morning run\n\
             trail-42,Run,2025-03-12T18:00:00,8000,210,2700,false,false,\n\
             102,Ride,2025-03-15T09:00:00,40000,,5400,true,false,Commute loop\n",
        );

        let records = load_activities(file.path()).unwrap();
        assert_eq!(records.len(), 3);

        let provider = |record: &ActivityRecord| match record {
            ActivityRecord::Provider(p) => p.clone(),
            other => panic!("expected provider shape, got {other:?}"),
        };

        let first = provider(&records[0]);
        assert_eq!(first.id, ActivityId::Numeric(101));
        assert_eq!(first.distance, dec!(10250));
        assert_eq!(first.name.as_deref(), Some("Morning run"));

        let second = provider(&records[1]);
        assert_eq!(second.id, ActivityId::Text("trail-42".to_string()));
        assert_eq!(second.name, None);

        let third = provider(&records[2]);
        assert!(third.commute);
        // Empty elevation cell falls back to zero.
        assert_eq!(third.total_elevation_gain, Decimal::ZERO);
    }

    #[test]
    fn test_missing_file() {
        let err = load_activities(Path::new("/nonexistent/activities.json")).unwrap_err();
        assert!(matches!(
            err,
            GoalrsError::Import(ImportError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = temp_file("yaml", "id: 1");
        let err = load_activities(file.path()).unwrap_err();
        assert!(matches!(
            err,
            GoalrsError::Import(ImportError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let file = temp_file("json", "[{\"id\": 201,");
        let err = load_activities(file.path()).unwrap_err();
        assert!(matches!(
            err,
            GoalrsError::Import(ImportError::ParseError { .. })
        ));
    }

    #[test]
    fn test_goals_flat_json() {
        let file = temp_file(
            "json",
            r#"{"year": 2025,
                "run": {"distance_km": 1000, "count": 120},
                "ride": {"elevation_m": 15000}}"#,
        );

        let goals = load_goals(file.path()).unwrap();
        assert_eq!(goals.year, 2025);
        assert_eq!(
            goals.metric_goal(2025, Sport::Run, GoalMetric::DistanceKm),
            Some(dec!(1000))
        );
        assert_eq!(
            goals.metric_goal(2025, Sport::Ride, GoalMetric::ElevationM),
            Some(dec!(15000))
        );
        assert_eq!(goals.metric_goal(2025, Sport::Ride, GoalMetric::Count), None);
    }

    #[test]
    fn test_goals_per_sport_map_with_camel_alias() {
        let file = temp_file(
            "json",
            r#"{"year": 2025,
                "perSport": {"run": {"distanceKm": 800.5}}}"#,
        );

        let goals = load_goals(file.path()).unwrap();
        assert_eq!(
            goals.metric_goal(2025, Sport::Run, GoalMetric::DistanceKm),
            Some(dec!(800.5))
        );
    }

    #[test]
    fn test_goals_toml() {
        let file = temp_file(
            "toml",
            "year = 2025\n\n[run]\ndistance_km = 1000\n\n[ride]\nelevation_m = 15000\ncount = 60\n",
        );

        let goals = load_goals(file.path()).unwrap();
        assert_eq!(
            goals.metric_goal(2025, Sport::Run, GoalMetric::DistanceKm),
            Some(dec!(1000))
        );
        assert_eq!(
            goals.metric_goal(2025, Sport::Ride, GoalMetric::Count),
            Some(dec!(60))
        );
    }

    #[test]
    fn test_negative_goal_rejected() {
        let file = temp_file("json", r#"{"year": 2025, "run": {"distance_km": -10}}"#);

        let err = load_goals(file.path()).unwrap_err();
        assert!(matches!(err, GoalrsError::Validation(_)));
        assert!(err.to_string().contains("non-negative"));
    }
}
