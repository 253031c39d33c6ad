//! Source-location inference keyed by provider.
//!
//! When no stage produced a `described.sourceLocation`, the coordinator asks
//! the registry for an inference matching the component's provider. Unknown
//! providers are left alone.

use std::collections::HashMap;

use serde_json::Map;
use tracing::debug;

use compdef_shared::{Coordinates, Definition, SourceLocation};

/// Builds a source location from coordinates for one provider.
pub trait SourceLocationInference: Send + Sync {
    /// Provider identifier this inference handles (matched exactly).
    fn provider(&self) -> &str;

    /// Inferred location, or `None` if the coordinates are insufficient.
    fn infer(&self, coordinates: &Coordinates) -> Option<SourceLocation>;
}

/// `github` coordinates map directly onto a repository URL.
pub struct GitHubInference;

impl SourceLocationInference for GitHubInference {
    fn provider(&self) -> &str {
        "github"
    }

    fn infer(&self, coordinates: &Coordinates) -> Option<SourceLocation> {
        // The owner lives in the namespace; without it there is no URL.
        let owner = coordinates.namespace.as_deref()?;
        Some(SourceLocation {
            kind: "git".into(),
            provider: "github".into(),
            url: format!("https://github.com/{owner}/{}", coordinates.name),
            revision: coordinates.revision.clone(),
            extra: Map::new(),
        })
    }
}

/// Provider → inference table. Defaults to the built-in GitHub inference.
pub struct InferenceRegistry {
    inferences: HashMap<String, Box<dyn SourceLocationInference>>,
}

impl InferenceRegistry {
    /// Registry with every built-in inference.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(GitHubInference));
        registry
    }

    /// Registry that never infers anything.
    pub fn empty() -> Self {
        Self {
            inferences: HashMap::new(),
        }
    }

    /// Add or replace the inference for its provider.
    pub fn register(&mut self, inference: Box<dyn SourceLocationInference>) {
        self.inferences
            .insert(inference.provider().to_string(), inference);
    }

    /// Fill `described.sourceLocation` if it is missing and the provider is
    /// known. Returns `true` if a location was added.
    pub fn ensure_source_location(
        &self,
        definition: &mut Definition,
        coordinates: &Coordinates,
    ) -> bool {
        if definition.source_location().is_some() {
            return false;
        }

        let Some(inference) = self.inferences.get(&coordinates.provider) else {
            return false;
        };

        match inference.infer(coordinates) {
            Some(location) => {
                debug!(provider = %coordinates.provider, url = %location.url, "inferred source location");
                definition.described_mut().source_location = Some(location);
                true
            }
            None => false,
        }
    }
}

impl Default for InferenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github(namespace: Option<&str>) -> Coordinates {
        Coordinates::new("git", "github", namespace, "bar", "abc123")
    }

    #[test]
    fn github_location_synthesized() {
        let registry = InferenceRegistry::new();
        let mut def = Definition::default();

        assert!(registry.ensure_source_location(&mut def, &github(Some("foo"))));

        let location = def.source_location().expect("location");
        assert_eq!(location.kind, "git");
        assert_eq!(location.provider, "github");
        assert_eq!(location.url, "https://github.com/foo/bar");
        assert_eq!(location.revision, "abc123");
    }

    #[test]
    fn existing_location_wins() {
        let registry = InferenceRegistry::new();
        let mut def = Definition::default();
        def.described_mut().source_location = Some(SourceLocation {
            kind: "git".into(),
            provider: "github".into(),
            url: "https://github.com/upstream/bar".into(),
            revision: "def456".into(),
            extra: Map::new(),
        });
        let before = def.clone();

        assert!(!registry.ensure_source_location(&mut def, &github(Some("foo"))));
        assert_eq!(def, before);
    }

    #[test]
    fn unknown_provider_untouched() {
        let registry = InferenceRegistry::new();
        let mut def = Definition::default();
        let coords = Coordinates::new("npm", "npmjs", None, "lodash", "4.17.21");

        assert!(!registry.ensure_source_location(&mut def, &coords));
        assert!(def.described.is_none());
    }

    #[test]
    fn github_without_namespace_skipped() {
        let registry = InferenceRegistry::new();
        let mut def = Definition::default();
        assert!(!registry.ensure_source_location(&mut def, &github(None)));
        assert!(def.source_location().is_none());
    }

    #[test]
    fn custom_inference_registered() {
        struct GitLab;
        impl SourceLocationInference for GitLab {
            fn provider(&self) -> &str {
                "gitlab"
            }
            fn infer(&self, c: &Coordinates) -> Option<SourceLocation> {
                Some(SourceLocation {
                    kind: "git".into(),
                    provider: "gitlab".into(),
                    url: format!("https://gitlab.com/{}/{}", c.namespace.as_deref()?, c.name),
                    revision: c.revision.clone(),
                    extra: Map::new(),
                })
            }
        }

        let mut registry = InferenceRegistry::empty();
        registry.register(Box::new(GitLab));

        let mut def = Definition::default();
        let coords = Coordinates::new("git", "gitlab", Some("group"), "proj", "v1");
        assert!(registry.ensure_source_location(&mut def, &coords));
        assert_eq!(def.source_location().unwrap().url, "https://gitlab.com/group/proj");

        let mut def = Definition::default();
        assert!(!registry.ensure_source_location(&mut def, &github(Some("foo"))));
    }
}
