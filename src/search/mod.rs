//! Full-text index over the game catalog.
//!
//! The index is derived data: it is rebuilt from SQLite on every start and
//! only maps free text to game ids. Games themselves are loaded from the
//! repository.
//!
//! Text fields are split into lowercased n-grams, so a query word matches any
//! game whose text contains it, including inside compounds ("team" hits
//! "Teambuilding").

use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, NgramTokenizer, TextAnalyzer};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::Game;

/// Per-field weights; a name hit counts most, a material hit least.
const FIELD_BOOSTS: [(&str, f32); 5] = [
    ("name", 3.0),
    ("description", 2.0),
    ("tags", 1.5),
    ("pedagogical_value", 1.0),
    ("materials", 0.5),
];

const SUBSTRING_TOKENIZER: &str = "substring";
const MIN_GRAM: usize = 2;
const MAX_GRAM: usize = 10;

const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub game_id: String,
    pub score: f32,
}

struct GameFields {
    game_id: Field,
    name: Field,
    description: Field,
    tags: Field,
    pedagogical_value: Field,
    materials: Field,
}

impl GameFields {
    fn schema() -> Schema {
        let substring = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(SUBSTRING_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqs),
        );

        let mut builder = Schema::builder();
        builder.add_text_field("game_id", STRING | STORED);
        for (field, _) in FIELD_BOOSTS {
            builder.add_text_field(field, substring.clone());
        }
        builder.build()
    }

    fn resolve(schema: &Schema) -> Result<Self, AppError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| AppError::Search(format!("Index schema mismatch: {}", e)))
        };
        Ok(Self {
            game_id: field("game_id")?,
            name: field("name")?,
            description: field("description")?,
            tags: field("tags")?,
            pedagogical_value: field("pedagogical_value")?,
            materials: field("materials")?,
        })
    }

    fn boosted(&self) -> [(Field, f32); 5] {
        [
            (self.name, FIELD_BOOSTS[0].1),
            (self.description, FIELD_BOOSTS[1].1),
            (self.tags, FIELD_BOOSTS[2].1),
            (self.pedagogical_value, FIELD_BOOSTS[3].1),
            (self.materials, FIELD_BOOSTS[4].1),
        ]
    }
}

/// Tantivy index of the game catalog.
pub struct GameIndex {
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: GameFields,
}

impl GameIndex {
    /// Open the index at `index_path`, creating it if the directory holds none.
    ///
    /// A directory written with a different schema is wiped and recreated.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        let dir_error = |e: std::io::Error| {
            AppError::Search(format!("Cannot prepare index directory {:?}: {}", index_path, e))
        };
        std::fs::create_dir_all(index_path).map_err(dir_error)?;

        let expected = GameFields::schema();
        let index = match Index::open_in_dir(index_path) {
            Ok(index) if same_schema(&index.schema(), &expected) => index,
            Ok(stale) => {
                drop(stale);
                tracing::info!(path = ?index_path, "Index schema changed, recreating");
                std::fs::remove_dir_all(index_path).map_err(dir_error)?;
                std::fs::create_dir_all(index_path).map_err(dir_error)?;
                Index::create_in_dir(index_path, expected)?
            }
            Err(_) => Index::create_in_dir(index_path, expected)?,
        };

        let analyzer = TextAnalyzer::builder(NgramTokenizer::new(MIN_GRAM, MAX_GRAM, false)?)
            .filter(LowerCaser)
            .build();
        index.tokenizers().register(SUBSTRING_TOKENIZER, analyzer);

        let fields = GameFields::resolve(&index.schema())?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        let writer = index.writer(WRITER_HEAP_BYTES)?;

        Ok(Self {
            reader,
            writer: Mutex::new(writer),
            fields,
        })
    }

    /// Rebuild the entire index from the catalog.
    pub async fn rebuild(&self, games: &[Game]) -> Result<(), AppError> {
        let mut writer = self.writer.lock().await;

        writer.delete_all_documents()?;
        for game in games {
            writer.add_document(self.create_document(game))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} games", games.len());
        Ok(())
    }

    /// Search for games whose text contains the query words, case-insensitively.
    /// Hits are ordered by descending score.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        let words = query_words(query_str);
        if words.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in self.fields.boosted() {
            for word in &words {
                subqueries.push((
                    Occur::Should,
                    Box::new(BoostQuery::new(substring_query(field, word), boost)),
                ));
            }
        }
        let combined_query = BooleanQuery::new(subqueries);

        let searcher = self.reader.searcher();
        let hits = searcher
            .search(&combined_query, &TopDocs::with_limit(limit))?
            .into_iter()
            .filter(|(score, _)| *score > 0.0)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let game_id = doc.get_first(self.fields.game_id)?.as_str()?.to_string();
                Some(SearchHit { game_id, score })
            })
            .collect();

        Ok(hits)
    }

    /// Number of indexed games.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn create_document(&self, game: &Game) -> TantivyDocument {
        doc!(
            self.fields.game_id => game.game_id.clone(),
            self.fields.name => game.name.clone(),
            self.fields.description => game.description.clone(),
            self.fields.tags => game.tags.join(" "),
            self.fields.pedagogical_value => game.pedagogical_value.clone(),
            self.fields.materials => game.materials.join(" ")
        )
    }
}

fn same_schema(found: &Schema, expected: &Schema) -> bool {
    serde_json::to_value(found).ok() == serde_json::to_value(expected).ok()
}

/// Lowercased, de-duplicated words of at least `MIN_GRAM` characters.
/// Quotes, colons and other punctuation only separate words.
fn query_words(query: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= MIN_GRAM)
    {
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Matches documents whose `field` contains `word` as a substring.
///
/// Words up to `MAX_GRAM` characters are a single indexed gram. Longer words
/// require every `MAX_GRAM`-wide window to be present.
fn substring_query(field: Field, word: &str) -> Box<dyn Query> {
    let chars: Vec<char> = word.chars().collect();
    let term = |gram: &str| -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(field, gram),
            IndexRecordOption::WithFreqs,
        ))
    };

    if chars.len() <= MAX_GRAM {
        return term(word);
    }

    let windows = chars
        .windows(MAX_GRAM)
        .map(|w| (Occur::Must, term(&w.iter().collect::<String>())))
        .collect();
    Box::new(BooleanQuery::new(windows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed_games;
    use tempfile::TempDir;

    async fn seeded(temp_dir: &TempDir) -> GameIndex {
        let index = GameIndex::open(temp_dir.path()).unwrap();
        index.rebuild(&seed_games()).await.unwrap();
        index
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        let mut ids: Vec<&str> = hits.iter().map(|h| h.game_id.as_str()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_name_hit_ranks_first() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir).await;

        assert_eq!(index.num_docs(), 5);
        let hits = index.search("Parcours", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].game_id, "game_003");
    }

    #[tokio::test]
    async fn test_tag_only_match_is_found() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir).await;

        let hits = index.search("wettkampf", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].game_id, "game_002");
    }

    #[tokio::test]
    async fn test_partial_words_match_inside_compounds() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir).await;

        assert_eq!(ids(&index.search("kreativ", 10).unwrap()), vec!["game_004"]);
        assert_eq!(
            ids(&index.search("vertrau", 10).unwrap()),
            vec!["game_001", "game_003"]
        );
        assert_eq!(
            ids(&index.search("team", 10).unwrap()),
            vec!["game_001", "game_002", "game_003", "game_005"]
        );
        assert_eq!(ids(&index.search("TEAMBUILDING", 10).unwrap()), vec!["game_001", "game_003"]);
    }

    #[tokio::test]
    async fn test_reopen_keeps_documents() {
        let temp_dir = TempDir::new().unwrap();
        {
            seeded(&temp_dir).await;
        }

        let reopened = GameIndex::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.num_docs(), 5);
        assert_eq!(reopened.search("Knoten", 3).unwrap()[0].game_id, "game_005");
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = GameIndex::open(temp_dir.path()).unwrap();

        assert!(index.search("   ", 10).unwrap().is_empty());
        assert!(index.search("a", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_punctuation_only_separates_words() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir).await;

        let hits = index.search("\"wettkampf:", 10).unwrap();
        assert_eq!(ids(&hits), vec!["game_002"]);
    }

    #[test]
    fn test_query_words() {
        assert_eq!(query_words("Team, team  Fahne"), vec!["team", "fahne"]);
        assert!(query_words("? ! x").is_empty());
    }
}
