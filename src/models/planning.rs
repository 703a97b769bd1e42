//! Heimstunde planning models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Where a Heimstunde takes place.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanLocation {
    #[default]
    Indoor,
    Outdoor,
    Flexible,
}

impl PlanLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanLocation::Indoor => "indoor",
            PlanLocation::Outdoor => "outdoor",
            PlanLocation::Flexible => "flexible",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indoor" => Some(PlanLocation::Indoor),
            "outdoor" => Some(PlanLocation::Outdoor),
            "flexible" => Some(PlanLocation::Flexible),
            _ => None,
        }
    }
}

/// A pedagogical goal such as teambuilding or creativity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PedagogicalGoal {
    #[serde(rename = "type")]
    pub goal_type: String,
    pub description: String,
}

/// One block of the Heimstunde schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleItem {
    /// Start time formatted as `HH:MM`.
    pub start_time: String,
    /// Duration in minutes.
    pub duration: u32,
    pub activity_name: String,
    pub activity_type: String,
    pub description: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_age_group() -> String {
    "10-13".to_string()
}

/// Request body for creating a Heimstunde plan.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanningRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub date: NaiveDate,
    /// Total duration in minutes.
    pub duration: u32,
    pub participant_count: u32,
    #[serde(default = "default_age_group")]
    pub age_group: String,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub location: PlanLocation,
    #[serde(default)]
    pub pedagogical_goals: Vec<PedagogicalGoal>,
    #[serde(default)]
    pub special_requirements: Option<String>,
}

/// A stored Heimstunde plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityPlan {
    pub plan_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub duration: u32,
    pub participant_count: u32,
    pub age_group: String,
    pub theme: Option<String>,
    pub location: PlanLocation,
    pub pedagogical_goals: Vec<PedagogicalGoal>,
    pub schedule: Vec<ScheduleItem>,
    pub material_list: Vec<String>,
    pub preparation_notes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An alternative activity offered with a suggestion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlternativeActivity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// How demanding a suggested plan is to run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Challenging,
}

/// Suggested schedule for a Heimstunde.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSuggestion {
    pub suggested_schedule: Vec<ScheduleItem>,
    pub alternative_activities: Vec<AlternativeActivity>,
    /// Minutes of preparation.
    pub estimated_preparation_time: u32,
    pub difficulty_level: Difficulty,
}
