//! Prefix taxonomy: ordered (prefix, label) list used to bucket changed keys.
//!
//! Matching is a linear scan in declared order and the first hit wins, even
//! when a later, longer prefix would also match (`"h"` shadows `"hx"` if it
//! comes first). Output reproducibility depends on that order, so the table
//! stays a `Vec`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::consts::UNCLASSIFIED_BUCKET;
use crate::error::VizError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub prefix: String,
    pub label: String,
    #[serde(skip)]
    pub ordinal: usize,
}

/// Which bucket a key falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryId {
    /// Index into the taxonomy (its ordinal).
    Configured(usize),
    /// Catch-all for keys matching no prefix.
    Unclassified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub category: CategoryId,
    /// Leading key bytes consumed by the prefix (0 for Unclassified).
    pub matched_len: usize,
}

#[derive(Clone, Debug)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

// Порядок важен: первый совпавший префикс побеждает.
const CHAIN_DB_PREFIXES: &[(&str, &str)] = &[
    ("LastHeader", "Last Header"),
    ("LastBlock", "Last Block"),
    ("LastFast", "Last Fast"),
    ("TrieSync", "Trie Sync"),
    ("h", "Headers"),
    ("r", "Receipts"),
    ("b", "Block Bodies"),
    ("H", "Header Numbers"),
    ("ethereum-config-", "Config"),
    ("secure-key-", "Preimages"),
    ("l", "Transaction Index"),
    ("B", "Bloom Bits"),
    ("t", "Total Difficulty"),
    ("n", "Header Hash"),
    ("DatabaseVersion", "Database Version"),
];

impl Default for Taxonomy {
    fn default() -> Self {
        Self::chain_db()
    }
}

impl Taxonomy {
    /// Build from (prefix, label) pairs; ordinals follow the given order.
    pub fn new<P, L>(pairs: impl IntoIterator<Item = (P, L)>) -> Result<Self>
    where
        P: Into<String>,
        L: Into<String>,
    {
        let categories: Vec<Category> = pairs
            .into_iter()
            .enumerate()
            .map(|(ordinal, (p, l))| Category {
                prefix: p.into(),
                label: l.into(),
                ordinal,
            })
            .collect();
        Self::from_categories(categories)
    }

    /// Key layout of a blockchain node database (headers, bodies, receipts, ...).
    pub fn chain_db() -> Self {
        let categories = CHAIN_DB_PREFIXES
            .iter()
            .enumerate()
            .map(|(ordinal, (p, l))| Category {
                prefix: (*p).to_string(),
                label: (*l).to_string(),
                ordinal,
            })
            .collect();
        Self { categories }
    }

    /// Load `[{"prefix": "...", "label": "..."}, ...]` from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read taxonomy {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse taxonomy {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut categories: Vec<Category> = serde_json::from_str(text)?;
        for (i, c) in categories.iter_mut().enumerate() {
            c.ordinal = i;
        }
        Self::from_categories(categories)
    }

    fn from_categories(categories: Vec<Category>) -> Result<Self> {
        for (i, c) in categories.iter().enumerate() {
            if c.prefix.is_empty() {
                return Err(VizError::Taxonomy(format!("entry {} ({}) has an empty prefix", i, c.label)).into());
            }
            if categories[..i].iter().any(|p| p.prefix == c.prefix) {
                return Err(VizError::Taxonomy(format!("duplicate prefix '{}'", c.prefix)).into());
            }
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        match id {
            CategoryId::Configured(i) => self.categories.get(i),
            CategoryId::Unclassified => None,
        }
    }

    /// First declared prefix of `key`, or Unclassified with matched length 0.
    pub fn classify(&self, key: &[u8]) -> Classification {
        for c in &self.categories {
            if key.starts_with(c.prefix.as_bytes()) {
                return Classification {
                    category: CategoryId::Configured(c.ordinal),
                    matched_len: c.prefix.len(),
                };
            }
        }
        Classification {
            category: CategoryId::Unclassified,
            matched_len: 0,
        }
    }

    /// Cluster label.
    pub fn label(&self, id: CategoryId) -> &str {
        self.get(id).map(|c| c.label.as_str()).unwrap_or(UNCLASSIFIED_BUCKET)
    }

    /// Bucket name used in per-bucket file names (the raw prefix).
    pub fn bucket_name(&self, id: CategoryId) -> &str {
        self.get(id).map(|c| c.prefix.as_str()).unwrap_or(UNCLASSIFIED_BUCKET)
    }

    /// Cluster ordinal; the catch-all sorts after every configured category.
    pub fn ordinal(&self, id: CategoryId) -> usize {
        match id {
            CategoryId::Configured(i) => i,
            CategoryId::Unclassified => self.categories.len(),
        }
    }
}
