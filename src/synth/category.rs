//! Component category classification.
//!
//! Categories are inferred from component names only. This is a heuristic:
//! `highlight-on-hover` lands in `light` just like `light-point` does. Treat
//! the result as a documentation hint, never as an authoritative type.

use serde::Deserialize;

/// Strategy that assigns a category to a component name.
pub trait CategoryClassifier: Send + Sync {
    fn classify(&self, component_name: &str) -> String;
}

/// `keyword` found anywhere in the lower-cased name maps to `category`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: String,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        KeywordRule {
            keyword: keyword.into().to_ascii_lowercase(),
            category: category.into(),
        }
    }
}

/// First matching rule wins; names matching nothing get the fallback.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
    fallback: String,
}

pub const FALLBACK_CATEGORY: &str = "misc";

const BUILTIN_RULES: &[(&str, &str)] = &[
    ("light", "light"),
    ("camera", "camera"),
    ("sound", "audio"),
    ("audio", "audio"),
    ("physics", "physics"),
    ("collider", "physics"),
    ("body", "physics"),
    ("anim", "animation"),
    ("material", "material"),
    ("shader", "material"),
    ("texture", "material"),
    ("geometry", "geometry"),
    ("shape", "geometry"),
    ("mesh", "geometry"),
    ("controls", "interaction"),
    ("cursor", "interaction"),
    ("raycaster", "interaction"),
    ("grab", "interaction"),
    ("hand", "interaction"),
    ("particle", "effects"),
    ("fog", "effects"),
    ("text", "text"),
];

impl KeywordClassifier {
    pub fn new(rules: Vec<KeywordRule>, fallback: impl Into<String>) -> Self {
        KeywordClassifier {
            rules,
            fallback: fallback.into(),
        }
    }

    /// Built-in keyword table.
    pub fn builtin() -> Self {
        Self::with_rules(Vec::new())
    }

    /// `extra` rules are consulted before the built-in ones.
    pub fn with_rules(extra: Vec<KeywordRule>) -> Self {
        let rules = extra
            .into_iter()
            .map(|r| KeywordRule::new(r.keyword, r.category))
            .chain(BUILTIN_RULES.iter().map(|(k, c)| KeywordRule::new(*k, *c)))
            .collect();
        Self::new(rules, FALLBACK_CATEGORY)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryClassifier for KeywordClassifier {
    fn classify(&self, component_name: &str) -> String {
        let name = component_name.to_ascii_lowercase();
        self.rules
            .iter()
            .find(|r| name.contains(&r.keyword))
            .map(|r| r.category.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}
