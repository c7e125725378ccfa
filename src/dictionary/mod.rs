//! Dictionary similarity lookup seam.
//!
//! The real NG/ALLOW phrase index (embedding-based similarity search) is an
//! external collaborator; the pipeline only consumes candidates through the
//! [`DictionaryLookup`] trait. Lookups are best-effort context for the
//! prompt: an empty or failing lookup never blocks or fails a check.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a phrase is prohibited or an approved rewording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhraseCategory {
    Ng,
    Allow,
}

/// One candidate phrase relevant to the submitted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseCandidate {
    pub phrase: String,
    pub category: PhraseCategory,
    /// Relevance in [0, 1]; higher is more relevant.
    pub similarity: f32,
    pub dictionary_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Dictionary lookup failed: {0}")]
    Lookup(String),
}

/// Returns candidate phrases relevant to a text, most relevant first.
#[async_trait]
pub trait DictionaryLookup: Send + Sync + 'static {
    async fn search(
        &self,
        text: &str,
        organization_id: &str,
    ) -> Result<Vec<PhraseCandidate>, DictionaryError>;
}

struct StaticEntry {
    id: &'static str,
    phrase: &'static str,
    category: PhraseCategory,
}

/// Built-in phrase list scored by substring presence.
///
/// Stands in for the external similarity index in dev and test setups.
/// Matched phrases score 1.0, the rest by rough lexical overlap; only the
/// top candidates are returned so the prompt stays small.
pub struct StaticDictionary {
    entries: Vec<StaticEntry>,
    limit: usize,
}

impl Default for StaticDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticDictionary {
    pub fn new() -> Self {
        // Common 薬機法 problem phrases and approved alternatives.
        let entries = vec![
            StaticEntry {
                id: "dict-001",
                phrase: "驚異的な効果",
                category: PhraseCategory::Ng,
            },
            StaticEntry {
                id: "dict-002",
                phrase: "効果を実感",
                category: PhraseCategory::Ng,
            },
            StaticEntry {
                id: "dict-003",
                phrase: "必ず痩せる",
                category: PhraseCategory::Ng,
            },
            StaticEntry {
                id: "dict-004",
                phrase: "完治",
                category: PhraseCategory::Ng,
            },
            StaticEntry {
                id: "dict-005",
                phrase: "治る",
                category: PhraseCategory::Ng,
            },
            StaticEntry {
                id: "dict-006",
                phrase: "アンチエイジング",
                category: PhraseCategory::Ng,
            },
            StaticEntry {
                id: "dict-007",
                phrase: "副作用なし",
                category: PhraseCategory::Ng,
            },
            StaticEntry {
                id: "dict-101",
                phrase: "健康維持をサポート",
                category: PhraseCategory::Allow,
            },
            StaticEntry {
                id: "dict-102",
                phrase: "年齢に応じたケア",
                category: PhraseCategory::Allow,
            },
            StaticEntry {
                id: "dict-103",
                phrase: "すこやかな毎日のために",
                category: PhraseCategory::Allow,
            },
        ];
        Self { entries, limit: 10 }
    }
}

#[async_trait]
impl DictionaryLookup for StaticDictionary {
    async fn search(
        &self,
        text: &str,
        _organization_id: &str,
    ) -> Result<Vec<PhraseCandidate>, DictionaryError> {
        let mut candidates: Vec<PhraseCandidate> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let similarity = if text.contains(entry.phrase) {
                    1.0
                } else if entry
                    .phrase
                    .chars()
                    .any(|c| !c.is_ascii() && text.contains(c))
                {
                    0.3
                } else {
                    return None;
                };
                Some(PhraseCandidate {
                    phrase: entry.phrase.to_string(),
                    category: entry.category,
                    similarity,
                    dictionary_id: Some(entry.id.to_string()),
                })
            })
            .collect();

        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        candidates.truncate(self.limit);
        Ok(candidates)
    }
}
