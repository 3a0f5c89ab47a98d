//! Entity types that take part in full-text search

use serde::Serialize;
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;

use crate::domain::entity::EntityKind;
use crate::error::Result;

/// Relative importance of a text column when ranking matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    A,
    B,
    C,
    D,
}

impl Weight {
    /// Column weight passed to SQLite's `bm25()`
    pub fn bm25(&self) -> f64 {
        match self {
            Self::A => 10.0,
            Self::B => 4.0,
            Self::C => 2.0,
            Self::D => 1.0,
        }
    }

    /// Label used by Postgres `setweight()`
    pub fn pg_label(&self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

/// A text column and its ranking weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedColumn {
    pub column: &'static str,
    pub weight: Weight,
}

impl WeightedColumn {
    pub const fn new(column: &'static str, weight: Weight) -> Self {
        Self { column, weight }
    }
}

/// A catalogue entity that can be found through full-text search.
///
/// `TEXT_COLUMNS` must list the columns of `FTS_TABLE` in declaration order.
/// Table and column names are spliced into SQL; they are never user input.
pub trait Searchable: Clone + Send + Sync + Serialize + 'static {
    /// Raw row shape as selected by `COLUMNS`
    type Row: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static;

    const KIND: EntityKind;
    const TABLE: &'static str;
    const FTS_TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const TEXT_COLUMNS: &'static [WeightedColumn];

    fn from_row(row: Self::Row) -> Result<Self>;

    fn id(&self) -> i64;

    fn name(&self) -> &str;

    /// Identity of this result within a merged result set
    fn identity(&self) -> (EntityKind, i64) {
        (Self::KIND, self.id())
    }
}

/// `COLUMNS` qualified with a table alias, comma separated
pub(crate) fn qualified_columns<T: Searchable>(alias: &str) -> String {
    T::COLUMNS
        .iter()
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}
