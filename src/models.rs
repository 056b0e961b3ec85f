use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers of the businesses selected for review sampling.
pub type BusinessIdSet = HashSet<String>;

/// One line of the business feed. Fields other than these three are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessRecord {
    pub business_id: String,
    #[serde(deserialize_with = "categories_from_json")]
    pub categories: Vec<String>,
    pub state: String,
}

impl BusinessRecord {
    /// A business qualifies when it lists `category` among at least two
    /// categories and is located in `region`. Single-category listings are
    /// excluded even when that one category is the target.
    pub fn matches(&self, category: &str, region: &str) -> bool {
        self.categories.iter().any(|c| c == category)
            && self.categories.len() > 1
            && self.state == region
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCategories {
    List(Vec<String>),
    Joined(String),
}

// Older dumps carry a JSON array, newer ones a single "A, B, C" string.
fn categories_from_json<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawCategories>::deserialize(deserializer)?;
    Ok(match raw {
        None => Vec::new(),
        Some(RawCategories::List(list)) => list,
        Some(RawCategories::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// One line of the review feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRecord {
    pub business_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub stars: Option<serde_json::Number>,
}

impl ReviewRecord {
    /// Integer rating of the review. A missing rating counts as 0; a
    /// non-integral one has no integer rating at all.
    pub fn rating(&self) -> Option<i64> {
        match &self.stars {
            None => Some(0),
            Some(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
        }
    }

    /// Review text, if present and non-empty.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// A retained review: (business_id, text, stars).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub business_id: String,
    pub text: String,
    pub stars: i64,
}

/// Root of the visualization tree. Depth is fixed: root, topics, words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTree {
    pub name: String,
    pub children: Vec<TopicNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    pub name: String,
    pub children: Vec<WordLeaf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordLeaf {
    pub name: String,
    pub size: f64,
}
