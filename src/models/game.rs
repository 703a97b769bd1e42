//! Game catalog model.

use serde::{Deserialize, Serialize};

/// Where a game can be played.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Indoor,
    Outdoor,
    Both,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Indoor => "indoor",
            Location::Outdoor => "outdoor",
            Location::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indoor" => Some(Location::Indoor),
            "outdoor" => Some(Location::Outdoor),
            "both" => Some(Location::Both),
            _ => None,
        }
    }

    /// German label shown in the game list.
    pub fn label(&self) -> &'static str {
        match self {
            Location::Both => "Drinnen & Draußen",
            Location::Indoor => "Drinnen",
            Location::Outdoor => "Draußen",
        }
    }

    /// Whether a game at `self` can be played at the requested location.
    pub fn accepts(&self, requested: Location) -> bool {
        requested == Location::Both || *self == Location::Both || *self == requested
    }
}

/// How much a game depends on good weather.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeatherDependency {
    Low,
    Medium,
    High,
}

impl WeatherDependency {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherDependency::Low => "low",
            WeatherDependency::Medium => "medium",
            WeatherDependency::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(WeatherDependency::Low),
            "medium" => Some(WeatherDependency::Medium),
            "high" => Some(WeatherDependency::High),
            _ => None,
        }
    }
}

/// A game or activity from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: String,
    pub name: String,
    pub description: String,
    pub materials: Vec<String>,
    pub duration_minutes: u32,
    pub min_participants: u32,
    pub max_participants: u32,
    pub age_group: String,
    pub location: Location,
    pub weather_dependency: WeatherDependency,
    pub tags: Vec<String>,
    pub pedagogical_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

impl Game {
    /// Text used to embed the game for semantic search.
    pub fn search_text(&self) -> String {
        [
            self.name.clone(),
            self.description.clone(),
            self.pedagogical_value.clone(),
            self.tags.join(" "),
            format!("Dauer: {} Minuten", self.duration_minutes),
            format!(
                "Teilnehmer: {}-{}",
                self.min_participants, self.max_participants
            ),
            format!("Ort: {}", self.location.as_str()),
            format!("Materialien: {}", self.materials.join(", ")),
        ]
        .join(" ")
    }
}

/// Filters applied before ranking.
#[derive(Debug, Clone, Default)]
pub struct GameFilters {
    pub duration_max: Option<u32>,
    pub participant_count: Option<u32>,
    pub location: Option<Location>,
    pub age_group: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl GameFilters {
    pub fn matches(&self, game: &Game) -> bool {
        if let Some(max) = self.duration_max {
            if game.duration_minutes > max {
                return false;
            }
        }
        if let Some(count) = self.participant_count {
            if game.min_participants > count || game.max_participants < count {
                return false;
            }
        }
        if let Some(location) = self.location {
            if !game.location.accepts(location) {
                return false;
            }
        }
        if let Some(age_group) = &self.age_group {
            if &game.age_group != age_group {
                return false;
            }
        }
        if let Some(tags) = &self.tags {
            if !tags.is_empty() && !tags.iter().any(|t| game.tags.contains(t)) {
                return false;
            }
        }
        true
    }
}

/// A game together with the score it was ranked by.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredGame {
    #[serde(flatten)]
    pub game: Game,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_score: Option<f32>,
}

/// How a result set was produced.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Semantic,
    KeywordFallback,
    TextMatch,
    FilterOnly,
    List,
}

/// Response body of the game search and listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct GameSearchResponse {
    pub games: Vec<ScoredGame>,
    pub total_found: usize,
    pub query_time_ms: u64,
    pub search_type: SearchType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(location: Location, min: u32, max: u32, duration: u32) -> Game {
        Game {
            game_id: "g".into(),
            name: "Spiel".into(),
            description: "Beschreibung".into(),
            materials: vec![],
            duration_minutes: duration,
            min_participants: min,
            max_participants: max,
            age_group: "10-13".into(),
            location,
            weather_dependency: WeatherDependency::Low,
            tags: vec!["team".into(), "bewegung".into()],
            pedagogical_value: String::new(),
            source_url: None,
            rating: None,
        }
    }

    #[test]
    fn test_location_accepts() {
        assert!(Location::Both.accepts(Location::Indoor));
        assert!(Location::Outdoor.accepts(Location::Both));
        assert!(Location::Outdoor.accepts(Location::Outdoor));
        assert!(!Location::Outdoor.accepts(Location::Indoor));
    }

    #[test]
    fn test_filters() {
        let g = game(Location::Outdoor, 10, 20, 30);

        assert!(GameFilters::default().matches(&g));
        assert!(!GameFilters {
            duration_max: Some(20),
            ..Default::default()
        }
        .matches(&g));
        assert!(!GameFilters {
            participant_count: Some(8),
            ..Default::default()
        }
        .matches(&g));
        assert!(GameFilters {
            participant_count: Some(20),
            ..Default::default()
        }
        .matches(&g));
        assert!(!GameFilters {
            location: Some(Location::Indoor),
            ..Default::default()
        }
        .matches(&g));
        assert!(!GameFilters {
            age_group: Some("6-10".into()),
            ..Default::default()
        }
        .matches(&g));
        assert!(GameFilters {
            tags: Some(vec!["kreis".into(), "team".into()]),
            ..Default::default()
        }
        .matches(&g));
        assert!(!GameFilters {
            tags: Some(vec!["kreis".into()]),
            ..Default::default()
        }
        .matches(&g));
    }

    #[test]
    fn test_scored_game_serializes_flat_camel_case() {
        let scored = ScoredGame {
            game: game(Location::Both, 8, 15, 15),
            search_score: Some(2.5),
        };
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["durationMinutes"], 15);
        assert_eq!(json["location"], "both");
        assert_eq!(json["searchScore"], 2.5);
        assert!(json.get("sourceUrl").is_none());
    }
}
