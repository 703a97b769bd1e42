//! Small built-in knowledge base about scouting.

use serde::Serialize;

const ENTRIES: &[(&str, &str)] = &[
    (
        "pfadfindergesetze",
        "Die Pfadfindergesetze sind die Grundregeln unseres Zusammenlebens. Sie beschreiben, wie wir miteinander, mit der Natur und mit uns selbst umgehen wollen.",
    ),
    (
        "allzeit bereit",
        "'Allzeit bereit' ist unser Wahlspruch und bedeutet, jederzeit bereit zu sein, zu helfen und Verantwortung zu übernehmen.",
    ),
    (
        "pfadfindergruß",
        "Der Pfadfindergruß wird mit drei Fingern gemacht. Die drei Finger erinnern an das Versprechen: Pflichten gegenüber Gott, den anderen und sich selbst.",
    ),
];

const UNKNOWN: &str = "Das ist eine interessante Frage zum Pfadfinderwissen. Für detaillierte Antworten benötige ich Zugang zur Wissensdatenbank.";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KnowledgeAnswer {
    pub answer: String,
    pub sources: Vec<String>,
    pub age_appropriate: bool,
}

/// Answer `question` from the first entry whose keyword it mentions.
pub fn answer(question: &str, age_appropriate: bool) -> KnowledgeAnswer {
    let question = question.to_lowercase();
    let answer = ENTRIES
        .iter()
        .find(|(keyword, _)| question.contains(keyword))
        .map_or(UNKNOWN, |(_, answer)| answer);

    KnowledgeAnswer {
        answer: answer.to_string(),
        sources: vec!["Pfadfinder Grundlagen".to_string()],
        age_appropriate,
    }
}
