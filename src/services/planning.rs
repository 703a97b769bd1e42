//! Heimstunde schedule generation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    ActivityPlan, AlternativeActivity, Difficulty, PlanLocation, PlanSuggestion, PlanningRequest,
    ScheduleItem,
};

const START_TIME: &str = "19:00";

/// Share of the remaining time given to the main activity and the reflection.
const MAIN_SHARE: f64 = 0.7;

/// Build a plan for `request`. The caller persists it.
pub fn build_heimstunde_plan(request: &PlanningRequest, now: DateTime<Utc>) -> ActivityPlan {
    let schedule = build_schedule(request.duration, request.theme.as_deref());
    let material_list = collect_materials(&schedule);

    let mut preparation_notes = vec![
        "Raum/Platz entsprechend der geplanten Aktivitäten vorbereiten".to_string(),
        "Alle Materialien im Voraus bereitlegen".to_string(),
        format!(
            "Aktivitäten für {} Teilnehmer anpassen",
            request.participant_count
        ),
    ];
    if request.location == PlanLocation::Outdoor {
        preparation_notes
            .push("Wetterbericht prüfen und Backup-Plan für schlechtes Wetter".to_string());
    }
    if let Some(requirements) = request
        .special_requirements
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
    {
        preparation_notes.push(format!("Besondere Anforderungen beachten: {}", requirements));
    }

    let title = request
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Heimstunde {}", request.date.format("%d.%m.%Y")));

    ActivityPlan {
        plan_id: Uuid::new_v4().to_string(),
        title,
        date: request.date,
        duration: request.duration,
        participant_count: request.participant_count,
        age_group: request.age_group.clone(),
        theme: request.theme.clone(),
        location: request.location,
        pedagogical_goals: request.pedagogical_goals.clone(),
        schedule,
        material_list,
        preparation_notes,
        created_at: now,
        updated_at: now,
    }
}

fn build_schedule(duration: u32, theme: Option<&str>) -> Vec<ScheduleItem> {
    let mut schedule = Vec::new();
    let mut clock = START_TIME.to_string();
    let mut remaining = duration;

    if remaining >= 10 {
        schedule.push(item(
            &clock,
            10,
            "Begrüßung und Eröffnung",
            "opening",
            "Gemeinsame Begrüßung, kurze Runde zum Befinden",
            &["Kluft", "eventuell Fahne"],
            None,
        ));
        remaining -= 10;
        clock = add_minutes(&clock, 10);
    }

    let main = share(remaining);
    if main >= 15 {
        let (name, description) = match theme {
            Some(theme) => (
                format!("Aktivität zum Thema '{}'", theme),
                format!("Kreative Aktivität passend zum Thema {}", theme),
            ),
            None => (
                "Teambuilding-Spiel".to_string(),
                "Spiel zur Stärkung des Gruppengefühls".to_string(),
            ),
        };
        schedule.push(item(
            &clock,
            main,
            &name,
            "main_activity",
            &description,
            &["Je nach gewähltem Spiel"],
            Some("Spiel an Gruppengröße anpassen"),
        ));
        remaining -= main;
        clock = add_minutes(&clock, main);
    }

    if remaining >= 10 {
        let reflection = (remaining - 5).min(share(remaining));
        schedule.push(item(
            &clock,
            reflection,
            "Reflexion und Gespräch",
            "reflection",
            "Gemeinsame Reflexion über die Aktivitäten und Erfahrungen",
            &["Sitzkreis"],
            None,
        ));
        remaining -= reflection;
        clock = add_minutes(&clock, reflection);
    }

    if remaining >= 5 {
        schedule.push(item(
            &clock,
            remaining,
            "Abschluss",
            "closing",
            "Gemeinsamer Abschluss, Termine und Verabschiedung",
            &[],
            None,
        ));
    }

    schedule
}

fn share(minutes: u32) -> u32 {
    (f64::from(minutes) * MAIN_SHARE).floor() as u32
}

/// Union of all item materials, first appearance wins.
fn collect_materials(schedule: &[ScheduleItem]) -> Vec<String> {
    let mut materials: Vec<String> = Vec::new();
    for material in schedule.iter().flat_map(|i| &i.materials) {
        if !materials.contains(material) {
            materials.push(material.clone());
        }
    }
    materials
}

/// Add minutes to an `HH:MM` clock, wrapping at midnight.
pub fn add_minutes(clock: &str, minutes: u32) -> String {
    let (hours, mins) = clock
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .unwrap_or((0, 0));
    let total = (hours * 60 + mins + minutes) % (24 * 60);
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn item(
    start_time: &str,
    duration: u32,
    name: &str,
    kind: &str,
    description: &str,
    materials: &[&str],
    notes: Option<&str>,
) -> ScheduleItem {
    ScheduleItem {
        start_time: start_time.to_string(),
        duration,
        activity_name: name.to_string(),
        activity_type: kind.to_string(),
        description: description.to_string(),
        materials: materials.iter().map(|m| m.to_string()).collect(),
        notes: notes.map(str::to_string),
    }
}

/// Fixed suggestion for a trust-themed Heimstunde.
pub fn suggestions() -> PlanSuggestion {
    PlanSuggestion {
        suggested_schedule: vec![
            item(
                "19:00",
                10,
                "Energizer: Namen-Ball",
                "game",
                "Schnelles Kennenlernspiel mit Ball",
                &["Softball"],
                None,
            ),
            item(
                "19:10",
                25,
                "Hauptaktivität: Vertrauensparcours",
                "team_activity",
                "Parcours mit verbundenen Augen zur Stärkung des Vertrauens",
                &["Augenbinden", "Hindernisse", "Seile"],
                None,
            ),
            item(
                "19:35",
                15,
                "Reflexionsrunde",
                "discussion",
                "Gespräch über Vertrauen und Zusammenhalt",
                &["Sitzkreis"],
                None,
            ),
        ],
        alternative_activities: vec![
            alternative("Kooperationsspiele", "alternative_main"),
            alternative("Kreative Gestaltung", "alternative_main"),
            alternative("Outdoor-Aktivität", "weather_alternative"),
        ],
        estimated_preparation_time: 20,
        difficulty_level: Difficulty::Medium,
    }
}

fn alternative(name: &str, kind: &str) -> AlternativeActivity {
    AlternativeActivity {
        name: name.to_string(),
        kind: kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(duration: u32, theme: Option<&str>, location: PlanLocation) -> PlanningRequest {
        PlanningRequest {
            title: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
            duration,
            participant_count: 14,
            age_group: "10-13".to_string(),
            theme: theme.map(str::to_string),
            location,
            pedagogical_goals: vec![],
            special_requirements: None,
        }
    }

    fn summary(plan: &ActivityPlan) -> Vec<(&str, u32, &str)> {
        plan.schedule
            .iter()
            .map(|i| (i.start_time.as_str(), i.duration, i.activity_type.as_str()))
            .collect()
    }

    #[test]
    fn test_ninety_minute_schedule() {
        let plan = build_heimstunde_plan(&request(90, None, PlanLocation::Indoor), Utc::now());

        // 80 left after opening: main 56, then 24 left: reflection min(19, 16) = 16, closing 8.
        assert_eq!(
            summary(&plan),
            vec![
                ("19:00", 10, "opening"),
                ("19:10", 56, "main_activity"),
                ("20:06", 16, "reflection"),
                ("20:22", 8, "closing"),
            ]
        );
        assert_eq!(plan.schedule[1].activity_name, "Teambuilding-Spiel");
        assert_eq!(
            plan.schedule.iter().map(|i| i.duration).sum::<u32>(),
            90
        );
        assert_eq!(plan.title, "Heimstunde 12.03.2026");
        assert_eq!(plan.preparation_notes.len(), 3);
        assert_eq!(
            plan.preparation_notes[2],
            "Aktivitäten für 14 Teilnehmer anpassen"
        );
    }

    #[test]
    fn test_theme_and_outdoor_note() {
        let plan = build_heimstunde_plan(
            &request(60, Some("Mut"), PlanLocation::Outdoor),
            Utc::now(),
        );
        assert_eq!(plan.schedule[1].activity_name, "Aktivität zum Thema 'Mut'");
        assert_eq!(plan.preparation_notes.len(), 4);
        assert!(plan.preparation_notes[3].starts_with("Wetterbericht"));
    }

    #[test]
    fn test_special_requirements_become_a_note() {
        let mut req = request(60, None, PlanLocation::Indoor);
        req.special_requirements = Some(" Rollstuhlgerecht ".to_string());
        let plan = build_heimstunde_plan(&req, Utc::now());
        assert_eq!(plan.preparation_notes.len(), 4);
        assert_eq!(
            plan.preparation_notes[3],
            "Besondere Anforderungen beachten: Rollstuhlgerecht"
        );

        req.special_requirements = Some("   ".to_string());
        let plan = build_heimstunde_plan(&req, Utc::now());
        assert_eq!(plan.preparation_notes.len(), 3);
    }

    #[test]
    fn test_short_meeting_skips_main_activity() {
        // 20 left after opening gives a main block of 14, below the minimum.
        let plan = build_heimstunde_plan(&request(30, None, PlanLocation::Indoor), Utc::now());
        assert_eq!(
            summary(&plan),
            vec![
                ("19:00", 10, "opening"),
                ("19:10", 14, "reflection"),
                ("19:24", 6, "closing"),
            ]
        );
    }

    #[test]
    fn test_materials_deduplicated_in_order() {
        let plan = build_heimstunde_plan(&request(90, None, PlanLocation::Indoor), Utc::now());
        assert_eq!(
            plan.material_list,
            vec![
                "Kluft".to_string(),
                "eventuell Fahne".to_string(),
                "Je nach gewähltem Spiel".to_string(),
                "Sitzkreis".to_string(),
            ]
        );
    }

    #[test]
    fn test_add_minutes_wraps_at_midnight() {
        assert_eq!(add_minutes("19:00", 10), "19:10");
        assert_eq!(add_minutes("23:50", 25), "00:15");
    }

    #[test]
    fn test_suggestions_are_fixed() {
        let s = suggestions();
        assert_eq!(s.suggested_schedule.len(), 3);
        assert_eq!(s.suggested_schedule[2].start_time, "19:35");
        assert_eq!(s.estimated_preparation_time, 20);
        assert_eq!(s.difficulty_level, Difficulty::Medium);
    }
}
