//! Dashboard model: per-sport aggregate, year-linear forecast, insight
//! lines, and the planning review composed into one serializable view.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate_year;
use crate::calendar::YearContext;
use crate::forecast::{build_forecast, Forecast};
use crate::insights::build_insights;
use crate::models::{AggregateYear, NormalizedActivity, Sport, YearGoals};
use crate::requirements::{review_sport, SportReview};

/// One sport's slice of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportDashboard {
    pub aggregate: AggregateYear,
    pub forecast: Forecast,
    pub insights: Vec<String>,
    pub review: SportReview,
}

/// Serializable dashboard for one year; both sports are always present, with
/// zeroed sections when a sport has no activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardModel {
    pub year: i32,
    pub generated_at_local: NaiveDateTime,
    pub run: SportDashboard,
    pub ride: SportDashboard,
}

/// Compose the dashboard for one year. Pure composition over the engines; no
/// math of its own.
pub fn build_dashboard_model(
    normalized: &[NormalizedActivity],
    year: i32,
    goals: Option<&YearGoals>,
    as_of: NaiveDateTime,
) -> DashboardModel {
    let ctx = YearContext::for_date(as_of.date());

    let section = |sport: Sport| {
        let aggregate = aggregate_year(normalized, year, sport, as_of);
        let forecast = build_forecast(&aggregate, goals, as_of);
        let insights = build_insights(&forecast);
        let sport_goals = goals
            .filter(|g| g.year == year)
            .and_then(|g| g.for_sport(sport));
        let review = review_sport(&ctx, &aggregate, sport_goals);

        SportDashboard {
            aggregate,
            forecast,
            insights,
            review,
        }
    };

    DashboardModel {
        year,
        generated_at_local: as_of,
        run: section(Sport::Run),
        ride: section(Sport::Ride),
    }
}
