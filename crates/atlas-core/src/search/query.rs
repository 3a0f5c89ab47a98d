//! Query tokenization and search options

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of results when the caller gives no limit
pub const DEFAULT_LIMIT: usize = 20;

/// Upper bound applied to any requested limit
pub const MAX_LIMIT: usize = 1000;

/// Split free text into search terms.
///
/// Splits on every non-alphanumeric character and drops empty tokens.
/// Case, order and duplicates are preserved.
pub fn mk_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// The requested limit, capped at `max_limit`
    pub fn effective_limit(&self, max_limit: usize) -> usize {
        self.limit.min(max_limit)
    }
}

/// Full-text strategy used by the search services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDialect {
    /// Alias LIKE matches unioned with FTS5 boolean matches
    #[default]
    AliasUnion,
    /// FTS5 matches ordered by weighted bm25
    Ranked,
    /// Postgres `ts_rank_cd` over weighted tsvectors
    Postgres,
}

impl SearchDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AliasUnion => "alias_union",
            Self::Ranked => "ranked",
            Self::Postgres => "postgres",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "alias_union" => Some(Self::AliasUnion),
            "ranked" => Some(Self::Ranked),
            "postgres" => Some(Self::Postgres),
            _ => None,
        }
    }

    pub fn all() -> &'static [SearchDialect] {
        &[Self::AliasUnion, Self::Ranked, Self::Postgres]
    }
}

impl fmt::Display for SearchDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
