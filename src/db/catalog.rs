//! Built-in game catalog used to seed a fresh database.

use crate::models::{Game, Location, WeatherDependency};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn seed_games() -> Vec<Game> {
    vec![
        Game {
            game_id: "game_001".into(),
            name: "Vertrauenskreis".into(),
            description: "Die Teilnehmer stehen im Kreis und lassen sich rückwärts fallen, vertrauen darauf, dass sie aufgefangen werden. Dieses Spiel fördert Vertrauen und Gruppenzusammenhalt.".into(),
            materials: strings(&["Keine besonderen Materialien"]),
            duration_minutes: 15,
            min_participants: 8,
            max_participants: 15,
            age_group: "10-13".into(),
            location: Location::Both,
            weather_dependency: WeatherDependency::Low,
            tags: strings(&["vertrauen", "teambuilding", "kreis", "sozial"]),
            pedagogical_value: "Fördert Vertrauen und Gruppenzusammenhalt".into(),
            source_url: None,
            rating: Some(4.2),
        },
        Game {
            game_id: "game_002".into(),
            name: "Capture the Flag".into(),
            description: "Zwei Teams versuchen die Fahne des anderen Teams zu erobern und in ihr eigenes Territorium zu bringen. Strategisches Teamspiel für größere Gruppen.".into(),
            materials: strings(&["2 Fahnen", "Markierungen für Spielfeld", "Bänder oder Tücher"]),
            duration_minutes: 30,
            min_participants: 10,
            max_participants: 20,
            age_group: "10-13".into(),
            location: Location::Outdoor,
            weather_dependency: WeatherDependency::Medium,
            tags: strings(&["strategie", "team", "bewegung", "wettkampf", "outdoor"]),
            pedagogical_value: "Fördert strategisches Denken und Teamwork".into(),
            source_url: None,
            rating: Some(4.7),
        },
        Game {
            game_id: "game_003".into(),
            name: "Blindes Vertrauen Parcours".into(),
            description: "Ein Teilnehmer wird durch einen Parcours geführt, während er die Augen verbunden hat. Der Partner gibt nur verbale Anweisungen.".into(),
            materials: strings(&["Augenbinden", "Hindernisse", "Seile", "Gegenstände für Parcours"]),
            duration_minutes: 20,
            min_participants: 6,
            max_participants: 16,
            age_group: "10-13".into(),
            location: Location::Both,
            weather_dependency: WeatherDependency::Low,
            tags: strings(&["vertrauen", "kommunikation", "parcours", "teambuilding"]),
            pedagogical_value: "Stärkt Vertrauen und Kommunikationsfähigkeiten".into(),
            source_url: None,
            rating: Some(4.0),
        },
        Game {
            game_id: "game_004".into(),
            name: "Geschichten erfinden".into(),
            description: "Die Gruppe erfindet gemeinsam eine Geschichte, wobei jeder Teilnehmer einen Satz beiträgt. Fördert Kreativität und Zuhören.".into(),
            materials: strings(&["Eventuell Papier und Stifte"]),
            duration_minutes: 25,
            min_participants: 5,
            max_participants: 12,
            age_group: "10-13".into(),
            location: Location::Indoor,
            weather_dependency: WeatherDependency::Low,
            tags: strings(&["kreativität", "sprache", "zuhören", "ruhig", "indoor"]),
            pedagogical_value: "Entwickelt Kreativität und Sprachfähigkeiten".into(),
            source_url: None,
            rating: Some(3.8),
        },
        Game {
            game_id: "game_005".into(),
            name: "Menschliche Knoten".into(),
            description: "Die Teilnehmer stellen sich in einen Kreis, greifen sich an den Händen und bilden einen 'Knoten', den sie gemeinsam lösen müssen.".into(),
            materials: strings(&["Keine Materialien erforderlich"]),
            duration_minutes: 15,
            min_participants: 6,
            max_participants: 12,
            age_group: "10-13".into(),
            location: Location::Both,
            weather_dependency: WeatherDependency::Low,
            tags: strings(&["problemlösung", "teamwork", "kooperation", "körperkontakt"]),
            pedagogical_value: "Fördert Problemlösungskompetenzen und Zusammenarbeit".into(),
            source_url: None,
            rating: Some(4.1),
        },
    ]
}
