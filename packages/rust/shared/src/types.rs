//! Core domain types: coordinates, curations, and definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CompdefError;

/// Tool tag under which computed definitions are stored.
pub const DEFINITION_TOOL: &str = "definition";

/// Version of the stored definition format.
pub const DEFINITION_TOOL_VERSION: &str = "1";

/// Placeholder used in the text form when a component has no namespace.
const EMPTY_NAMESPACE: &str = "-";

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Identifies one revision of a component, e.g. `git/github/serde-rs/serde/v1.0.0`.
///
/// Every collaborator is keyed by this value. The text form is
/// `type/provider/namespace/name/revision`, with `-` standing in for a
/// missing namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    /// Package type (`npm`, `crate`, `git`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Hosting platform identifier (`npmjs`, `cratesio`, `github`, ...).
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    pub revision: String,
}

impl Coordinates {
    pub fn new(
        kind: impl Into<String>,
        provider: impl Into<String>,
        namespace: Option<&str>,
        name: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            provider: provider.into(),
            namespace: namespace.map(str::to_string),
            name: name.into(),
            revision: revision.into(),
        }
    }

    /// Canonical entity identity, used to key batch results.
    pub fn entity_key(&self) -> String {
        self.to_string()
    }

    /// Namespace as rendered in the text form.
    pub fn namespace_or_placeholder(&self) -> &str {
        self.namespace.as_deref().unwrap_or(EMPTY_NAMESPACE)
    }

    /// Cache key for the stored definition of this component.
    pub fn to_store_coordinates(
        &self,
        tool: impl Into<String>,
        tool_version: impl Into<String>,
    ) -> StoreCoordinates {
        StoreCoordinates {
            coordinates: self.clone(),
            tool: tool.into(),
            tool_version: tool_version.into(),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.kind,
            self.provider,
            self.namespace_or_placeholder(),
            self.name,
            self.revision
        )
    }
}

impl FromStr for Coordinates {
    type Err = CompdefError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().trim_matches('/').split('/').collect();
        let [kind, provider, namespace, name, revision] = parts.as_slice() else {
            return Err(CompdefError::validation(format!(
                "coordinates '{s}' must have the form type/provider/namespace/name/revision"
            )));
        };

        if [kind, provider, namespace, name, revision]
            .iter()
            .any(|p| p.is_empty())
        {
            return Err(CompdefError::validation(format!(
                "coordinates '{s}' contain an empty segment"
            )));
        }

        let namespace = (*namespace != EMPTY_NAMESPACE).then_some(*namespace);
        Ok(Self::new(*kind, *provider, namespace, *name, *revision))
    }
}

// ---------------------------------------------------------------------------
// StoreCoordinates
// ---------------------------------------------------------------------------

/// [`Coordinates`] extended with a tool tag and version; the definition cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreCoordinates {
    #[serde(flatten)]
    pub coordinates: Coordinates,
    pub tool: String,
    #[serde(rename = "toolVersion")]
    pub tool_version: String,
}

impl StoreCoordinates {
    /// Stable string key for key/value backends.
    pub fn store_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StoreCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.coordinates, self.tool, self.tool_version)
    }
}

// ---------------------------------------------------------------------------
// Curation
// ---------------------------------------------------------------------------

/// A resolved curation. The body is opaque to the coordinator; only the
/// `_origin` marker is read for provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curation {
    /// Where the curation came from, e.g. `pull/42`.
    #[serde(rename = "_origin", default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Curation {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            body: Map::new(),
        }
    }
}

/// Reference to a curation that should override the cached definition.
#[derive(Debug, Clone, PartialEq)]
pub enum CurationRef {
    /// A pending pull request, by number or name.
    PullRequest(String),
    /// A curation the caller already holds.
    Resolved(Curation),
}

impl From<u64> for CurationRef {
    fn from(pr: u64) -> Self {
        Self::PullRequest(pr.to_string())
    }
}

impl From<&str> for CurationRef {
    fn from(pr: &str) -> Self {
        Self::PullRequest(pr.to_string())
    }
}

impl From<String> for CurationRef {
    fn from(pr: String) -> Self {
        Self::PullRequest(pr)
    }
}

impl From<Curation> for CurationRef {
    fn from(curation: Curation) -> Self {
        Self::Resolved(curation)
    }
}

// ---------------------------------------------------------------------------
// Collaborator payloads
// ---------------------------------------------------------------------------

/// Raw harvest output keyed by tool name.
pub type HarvestData = BTreeMap<String, Value>;

/// Normalized per-tool summaries keyed by tool name.
pub type SummarizedData = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Where a component's source lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: String,
    pub url: String,
    pub revision: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Provenance metadata attached to a definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Described {
    /// Tools that contributed to the definition, in the order they were added.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(
        rename = "sourceLocation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_location: Option<SourceLocation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The rendered definition document for one component revision.
///
/// Everything outside `described` is produced by the aggregation and
/// curation services and is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub described: Option<Described>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Definition {
    /// The `described` section, created empty on first access.
    pub fn described_mut(&mut self) -> &mut Described {
        self.described.get_or_insert_with(Described::default)
    }

    /// Existing source location, if any stage produced one.
    pub fn source_location(&self) -> Option<&SourceLocation> {
        self.described.as_ref()?.source_location.as_ref()
    }

    /// Contributing tools (empty when `described` is absent).
    pub fn tools(&self) -> &[String] {
        self.described
            .as_ref()
            .map(|d| d.tools.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coordinates_text_roundtrip() {
        let coords: Coordinates = "git/github/serde-rs/serde/abc123".parse().expect("parse");
        assert_eq!(coords.kind, "git");
        assert_eq!(coords.namespace.as_deref(), Some("serde-rs"));
        assert_eq!(coords.to_string(), "git/github/serde-rs/serde/abc123");
    }

    #[test]
    fn coordinates_without_namespace() {
        let coords: Coordinates = "npm/npmjs/-/lodash/4.17.21".parse().expect("parse");
        assert_eq!(coords.namespace, None);
        assert_eq!(coords.entity_key(), "npm/npmjs/-/lodash/4.17.21");
    }

    #[test]
    fn coordinates_reject_malformed() {
        assert!("npm/npmjs/lodash".parse::<Coordinates>().is_err());
        assert!("npm//-/lodash/1.0.0".parse::<Coordinates>().is_err());
        assert!("a/b/c/d/e/f".parse::<Coordinates>().is_err());
    }

    #[test]
    fn store_coordinates_key() {
        let coords = Coordinates::new("crate", "cratesio", None, "tokio", "1.40.0");
        let store = coords.to_store_coordinates(DEFINITION_TOOL, DEFINITION_TOOL_VERSION);
        assert_eq!(store.store_key(), "crate/cratesio/-/tokio/1.40.0/definition/1");
    }

    #[test]
    fn definition_keeps_unknown_fields() {
        let raw = json!({
            "licensed": { "declared": "MIT" },
            "described": {
                "releaseDate": "2024-01-01",
                "sourceLocation": {
                    "type": "git",
                    "provider": "github",
                    "url": "https://github.com/foo/bar",
                    "revision": "abc123"
                }
            }
        });

        let def: Definition = serde_json::from_value(raw.clone()).expect("deserialize");
        assert_eq!(
            def.source_location().map(|l| l.url.as_str()),
            Some("https://github.com/foo/bar")
        );
        assert!(def.body.contains_key("licensed"));

        let back = serde_json::to_value(&def).expect("serialize");
        assert_eq!(back, raw);
    }

    #[test]
    fn described_created_lazily() {
        let mut def = Definition::default();
        assert!(def.tools().is_empty());
        def.described_mut().tools.push("scancode/30.3.0".into());
        assert_eq!(def.tools(), ["scancode/30.3.0"]);
    }

    #[test]
    fn curation_origin_field() {
        let curation: Curation =
            serde_json::from_value(json!({ "_origin": "pull/42", "licensed": {} }))
                .expect("deserialize");
        assert_eq!(curation.origin.as_deref(), Some("pull/42"));
        assert!(curation.body.contains_key("licensed"));
    }

    #[test]
    fn curation_ref_conversions() {
        assert_eq!(CurationRef::from(42u64), CurationRef::PullRequest("42".into()));
        assert_eq!(
            CurationRef::from(Curation::with_origin("pull/7")),
            CurationRef::Resolved(Curation::with_origin("pull/7"))
        );
    }
}
