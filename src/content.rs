use std::fs;

use rand::Rng;
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "assets/phrases/"]
struct PhraseAssets;

#[derive(Embed)]
#[folder = "assets/texts/"]
struct TextAssets;

/// Phrases a drill can pick its target from. May be empty when the content
/// for a language is missing or malformed; callers treat that as "no phrase".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhrasePool {
    phrases: Vec<String>,
}

impl PhrasePool {
    pub fn new(phrases: Vec<String>) -> Self {
        let phrases = phrases
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        Self { phrases }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Uniform pick. `None` for an empty pool.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<&str> {
        if self.phrases.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.phrases.len());
        Some(self.phrases[idx].as_str())
    }
}

impl From<Vec<&str>> for PhrasePool {
    fn from(phrases: Vec<&str>) -> Self {
        Self::new(phrases.into_iter().map(str::to_string).collect())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Content {
    pub language: String,
    pub zen_quotes: PhrasePool,
    pub drills: PhrasePool,
    pub fallback_drill: Option<String>,
}

impl Content {
    /// User phrase files override the bundled ones. Unknown languages load
    /// as empty pools.
    pub fn load(language: &str) -> Self {
        let filename = format!("{language}.toml");

        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir
                .join("focus-dojo")
                .join("phrases")
                .join(&filename);
            if let Ok(raw) = fs::read_to_string(&user_path) {
                log::debug!("loading phrases from {}", user_path.display());
                return Self::parse(language, &raw);
            }
        }

        match PhraseAssets::get(&filename) {
            Some(file) => match std::str::from_utf8(file.data.as_ref()) {
                Ok(raw) => Self::parse(language, raw),
                Err(e) => {
                    log::warn!("bundled phrases for {language} are not utf-8: {e}");
                    Self::empty(language)
                }
            },
            None => {
                log::warn!("no phrases bundled for language {language}");
                Self::empty(language)
            }
        }
    }

    /// Each pool is read independently: a pool that is missing or is not an
    /// array of strings becomes empty without affecting the others.
    pub fn parse(language: &str, raw: &str) -> Self {
        let table = match raw.parse::<toml::Table>() {
            Ok(table) => table,
            Err(e) => {
                log::warn!("phrase file for {language} failed to parse: {e}");
                return Self::empty(language);
            }
        };

        let pool = |key: &str| -> PhrasePool {
            let phrases = table
                .get(key)
                .and_then(toml::Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(toml::Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            PhrasePool::new(phrases)
        };

        Self {
            language: language.to_string(),
            zen_quotes: pool("zen_quotes"),
            drills: pool("drills"),
            fallback_drill: table
                .get("fallback_drill")
                .and_then(toml::Value::as_str)
                .map(str::to_string),
        }
    }

    fn empty(language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..Self::default()
        }
    }
}

pub fn available_languages() -> Vec<String> {
    PhraseAssets::iter()
        .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
        .collect()
}

/// Bundled reading articles, in the order they are offered.
const LIBRARY: &[&str] = &[
    "mental-fatigue",
    "dopamine-loop",
    "attention-residue",
    "deep-work",
    "cognitive-load",
];

pub fn library_ids() -> &'static [&'static str] {
    LIBRARY
}

/// Article text for a library id. The id doubles as the session's source id.
pub fn library_text(id: &str) -> Option<String> {
    if !LIBRARY.iter().any(|known| *known == id) {
        return None;
    }
    embedded_text(&format!("{id}.txt"))
}

/// Text offered when the reader starts without a source of its own.
pub fn default_text() -> String {
    embedded_text("default.txt").unwrap_or_default()
}

fn embedded_text(filename: &str) -> Option<String> {
    TextAssets::get(filename).and_then(|file| String::from_utf8(file.data.into_owned()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_bundled_languages_load() {
        let langs = available_languages();
        assert!(langs.contains(&"en".to_string()));
        assert!(langs.contains(&"id".to_string()));

        let en = Content::load("en");
        assert!(!en.zen_quotes.is_empty());
        assert!(!en.drills.is_empty());
        assert!(en.fallback_drill.is_some());
    }

    #[test]
    fn test_unknown_language_is_empty() {
        let content = Content::parse("xx", "");
        assert!(content.zen_quotes.is_empty());
        assert!(content.drills.is_empty());
    }

    #[test]
    fn test_non_array_pool_is_empty() {
        let raw = r#"
zen_quotes = "not a list"
drills = ["one phrase"]
"#;
        let content = Content::parse("en", raw);
        assert!(content.zen_quotes.is_empty());
        assert_eq!(content.drills.len(), 1);
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let content = Content::parse("en", "zen_quotes = [");
        assert!(content.zen_quotes.is_empty());
        assert!(content.fallback_drill.is_none());
    }

    #[test]
    fn test_pick_from_empty_pool() {
        let pool = PhrasePool::default();
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(pool.pick(&mut rng), None);
    }

    #[test]
    fn test_pick_stays_in_pool() {
        let pool = PhrasePool::from(vec!["a b", "c d", "e f"]);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let picked = pool.pick(&mut rng).unwrap();
            assert!(pool.phrases().iter().any(|p| p == picked));
        }
    }

    #[test]
    fn test_blank_phrases_are_dropped() {
        let pool = PhrasePool::from(vec!["  ", "real", ""]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_every_library_article_is_bundled() {
        assert_eq!(library_ids().len(), 5);
        assert_eq!(library_ids()[0], "mental-fatigue");
        for id in library_ids() {
            let text = library_text(id).unwrap_or_else(|| panic!("missing article {id}"));
            assert!(crate::engine::segment::segment(&text).len() > 3, "{id} too short");
        }
    }

    #[test]
    fn test_library_rejects_unknown_ids() {
        assert_eq!(library_text("default"), None);
        assert_eq!(library_text("no-such-article"), None);
        assert_eq!(library_text("../default"), None);
    }

    #[test]
    fn test_default_text_has_sentences() {
        let text = default_text();
        assert!(text.contains('.'));
    }
}
