//! Game search view.

use super::{AssistantApi, GameSummary};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub query: String,
    results: Vec<GameSummary>,
    loading: bool,
}

impl SearchView {
    pub fn results(&self) -> &[GameSummary] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Run the current query. A failed search keeps the previous results.
    pub async fn submit(&mut self, api: &impl AssistantApi) {
        if self.query.trim().is_empty() {
            return;
        }

        self.loading = true;
        match api.search_games(&self.query).await {
            Ok(games) => self.results = games,
            Err(e) => tracing::error!(error = %e, query = %self.query, "Game search failed"),
        }
        self.loading = false;
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_loading() {
            "Suche..."
        } else {
            "Suchen"
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("🎯 Spiele suchen\n\n");
        out.push_str(&format!("> {} [{}]\n", self.query, self.button_label()));

        for game in self.results() {
            out.push_str(&format!("\n{}\n{}\n", game.name, game.description));
            out.push_str(&format!(
                "⏱️ {} Min  👥 {}-{} Personen  📍 {}\n",
                game.duration_minutes,
                game.min_participants,
                game.max_participants,
                game.location_label()
            ));
            if let Some(tags) = &game.tags {
                out.push_str(&format!("#{}\n", tags.join(" #")));
            }
        }
        out
    }
}
