//! Mock catalog generation for local runs.
//!
//! Produces an article snapshot and a matching suggestions mapping in the
//! formats the service and the suggestions mock read at startup.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::articles::model::{Article, ArticleId};

pub const ARTICLES_FILE: &str = "articles.json";
pub const SUGGESTIONS_FILE: &str = "suggestions.json";

const FIRST_NAMES: &[&str] = &["Ada", "Brian", "Chen", "Dana", "Emeka", "Farah", "Goran", "Hana"];
const LAST_NAMES: &[&str] = &["Lovelace", "Kernighan", "Wu", "Scully", "Obi", "Haddad", "Ivanic", "Sato"];
const WORDS: &[&str] = &[
    "latency", "trace", "span", "context", "service", "request", "cache", "queue", "signal",
    "budget", "header", "payload", "gateway", "snapshot", "article", "suggestion",
];

#[derive(Debug, Error)]
pub enum MockDataError {
    #[error("number of suggestions per article ({suggestions}) must be less than the number of articles ({articles})")]
    TooManySuggestions { articles: usize, suggestions: usize },

    #[error("cannot write mock data: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode mock data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Generated catalog and suggestions.
#[derive(Debug, Clone)]
pub struct MockData {
    pub articles: BTreeMap<ArticleId, Article>,
    pub suggestions: BTreeMap<ArticleId, Vec<ArticleId>>,
}

/// Generate `articles` articles, each with `suggestions` distinct suggested ids
/// that never include the article itself.
pub fn generate(articles: usize, suggestions: usize, seed: Option<u64>) -> Result<MockData, MockDataError> {
    if suggestions >= articles {
        return Err(MockDataError::TooManySuggestions {
            articles,
            suggestions,
        });
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut catalog = BTreeMap::new();
    for _ in 0..articles {
        let id = ArticleId::new(uuid::Builder::from_random_bytes(rng.gen()).into_uuid().simple().to_string());
        let article = Article {
            id: id.clone(),
            author: format!(
                "{} {}",
                pick(&mut rng, FIRST_NAMES),
                pick(&mut rng, LAST_NAMES)
            ),
            title: sentence(&mut rng, 4),
            text: (0..3).map(|_| sentence(&mut rng, 8)).collect::<Vec<_>>().join(" "),
            suggested_articles: Vec::new(),
        };
        catalog.insert(id, article);
    }

    let ids: Vec<ArticleId> = catalog.keys().cloned().collect();
    let mut mapping = BTreeMap::new();
    for id in &ids {
        let others: Vec<&ArticleId> = ids.iter().filter(|other| *other != id).collect();
        let chosen = others
            .choose_multiple(&mut rng, suggestions)
            .map(|other| (*other).clone())
            .collect();
        mapping.insert(id.clone(), chosen);
    }

    Ok(MockData {
        articles: catalog,
        suggestions: mapping,
    })
}

impl MockData {
    /// Write `articles.json` and `suggestions.json` into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf), MockDataError> {
        fs::create_dir_all(dir)?;
        let articles_path = dir.join(ARTICLES_FILE);
        let suggestions_path = dir.join(SUGGESTIONS_FILE);

        fs::write(&articles_path, serde_json::to_vec_pretty(&self.articles)?)?;
        fs::write(&suggestions_path, serde_json::to_vec_pretty(&self.suggestions)?)?;
        Ok((articles_path, suggestions_path))
    }
}

/// Read a suggestions mapping as written by `MockData::write_to`.
pub fn load_suggestions(path: &Path) -> Result<HashMap<ArticleId, Vec<ArticleId>>, MockDataError> {
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn sentence(rng: &mut StdRng, words: usize) -> String {
    let mut s = (0..words).map(|_| pick(rng, WORDS)).collect::<Vec<_>>().join(" ");
    if let Some(first) = s.get(0..1) {
        s.replace_range(0..1, &first.to_uppercase());
    }
    s.push('.');
    s
}
