//! Entity kinds and typed references shared across the catalogue

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain categories a catalogue record can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Application,
    Actor,
    Measurable,
    LogicalDataFlow,
    FlowDiagram,
}

impl EntityKind {
    /// Convert to the stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "APPLICATION",
            Self::Actor => "ACTOR",
            Self::Measurable => "MEASURABLE",
            Self::LogicalDataFlow => "LOGICAL_DATA_FLOW",
            Self::FlowDiagram => "FLOW_DIAGRAM",
        }
    }

    /// Parse from the stored string representation (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "APPLICATION" => Some(Self::Application),
            "ACTOR" => Some(Self::Actor),
            "MEASURABLE" => Some(Self::Measurable),
            "LOGICAL_DATA_FLOW" => Some(Self::LogicalDataFlow),
            "FLOW_DIAGRAM" => Some(Self::FlowDiagram),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed pointer to any catalogue entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    pub kind: EntityKind,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityReference {
    /// Create an unnamed reference
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id, name: None }
    }

    /// Attach a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a reference from stored kind/id columns
    pub fn from_columns(kind: &str, id: i64, name: Option<String>) -> crate::Result<Self> {
        let kind = EntityKind::parse(kind)
            .ok_or_else(|| crate::Error::Parse(format!("Unknown entity kind: {}", kind)))?;
        Ok(Self { kind, id, name })
    }

    /// Identity of the referenced entity, ignoring its display name
    pub fn identity(&self) -> (EntityKind, i64) {
        (self.kind, self.id)
    }
}

/// SQL expression resolving the display name of the entity identified by
/// `kind_col`/`id_col`. Only applications and actors carry a name source;
/// other kinds resolve to NULL.
pub(crate) fn entity_name_sql(kind_col: &str, id_col: &str) -> String {
    format!(
        "CASE {kind} \
         WHEN 'APPLICATION' THEN (SELECT name FROM application WHERE id = {id}) \
         WHEN 'ACTOR' THEN (SELECT name FROM actor WHERE id = {id}) \
         END",
        kind = kind_col,
        id = id_col
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_conversion() {
        assert_eq!(EntityKind::LogicalDataFlow.as_str(), "LOGICAL_DATA_FLOW");
        assert_eq!(EntityKind::parse("application"), Some(EntityKind::Application));
        assert_eq!(EntityKind::parse("nonsense"), None);
    }

    #[test]
    fn test_entity_kind_serde() {
        let json = serde_json::to_string(&EntityKind::FlowDiagram).unwrap();
        assert_eq!(json, "\"FLOW_DIAGRAM\"");
        let kind: EntityKind = serde_json::from_str("\"MEASURABLE\"").unwrap();
        assert_eq!(kind, EntityKind::Measurable);
    }

    #[test]
    fn test_reference_identity_ignores_name() {
        let a = EntityReference::new(EntityKind::Application, 7).with_name("Orion");
        let b = EntityReference::new(EntityKind::Application, 7);
        assert_ne!(a, b);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_from_columns_rejects_unknown_kind() {
        assert!(EntityReference::from_columns("WIDGET", 1, None).is_err());
    }
}
