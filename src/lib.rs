// Library interface for the goalrs engines
// This allows integration tests to access the core functionality

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod import;
pub mod insights;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod requirements;

// Re-export commonly used types for convenience
pub use models::*;
pub use aggregate::{aggregate_year, daily_count_series, daily_metric_series};
pub use calendar::YearContext;
pub use dashboard::{build_dashboard_model, DashboardModel, SportDashboard};
pub use forecast::{build_forecast, calculate_forecast, Forecast, ForecastInput, ForecastResult};
pub use import::{load_activities, load_goals};
pub use insights::{build_insights, classify_goal_status, derive_metric_facts, GoalStatus};
pub use normalize::{normalize_activities, NormalizeOptions};
pub use progress::{build_athlete_stats, AthleteStats, StatsParams};
pub use requirements::{review_sport, RiskFlag, SportReview};
pub use error::{GoalrsError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
