//! Category resolution against a controlled vocabulary.
//!
//! Each canonical label owns a list of synonym substrings. A raw category
//! resolves to an entry when it equals the label or contains one of the
//! entry's terms. Filtering is looser: a raw value contained in a term also
//! matches. All comparisons are done on the trimmed, lower-cased form; output
//! keeps the configured label's casing.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const FALLBACK_CATEGORY: &str = "General";
pub const ALL_CATEGORIES: &str = "all";

/// Static vocabulary row.
#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    pub canonical: &'static str,
    pub synonyms: &'static [&'static str],
}

pub const DEFAULT_VOCABULARY: &[CategorySpec] = &[
    CategorySpec {
        canonical: "Solidaire",
        synonyms: &[
            "solidaire",
            "solidarité",
            "solidarite",
            "entraide",
            "humanitaire",
            "social",
            "bénévolat",
            "benevolat",
            "caritatif",
        ],
    },
    CategorySpec {
        canonical: "Écologique",
        synonyms: &[
            "écologique",
            "ecologique",
            "écologie",
            "ecologie",
            "écolo",
            "ecolo",
            "environnement",
            "environnemental",
            "nature",
            "climat",
            "recyclage",
        ],
    },
    CategorySpec {
        canonical: "Créatif",
        synonyms: &[
            "créatif",
            "creatif",
            "créative",
            "creative",
            "créativité",
            "creativite",
            "artistique",
            "création",
            "creation",
            "dessin",
            "musique",
        ],
    },
    CategorySpec {
        canonical: "Sportif",
        synonyms: &["sportif", "sportive", "sport", "fitness", "activité physique", "course à pied"],
    },
    CategorySpec {
        canonical: "Éducatif",
        synonyms: &[
            "éducatif",
            "educatif",
            "éducation",
            "education",
            "apprentissage",
            "formation",
            "pédagogique",
            "pedagogique",
        ],
    },
    CategorySpec {
        canonical: "Bien-être",
        synonyms: &[
            "bien-être",
            "bien-etre",
            "bien être",
            "bien etre",
            "bienêtre",
            "santé",
            "sante",
            "wellness",
            "méditation",
            "meditation",
            "relaxation",
        ],
    },
];

/// One configurable vocabulary row, as read from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct VocabularyEntry {
    pub canonical: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    categories: Vec<VocabularyEntry>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct ResolvedEntry {
    canonical: String,
    key: String,
    terms: Vec<String>,
}

impl ResolvedEntry {
    fn contains_term(&self, needle: &str) -> bool {
        self.terms.iter().any(|term| needle.contains(term.as_str()))
    }

    fn is_alias_of(&self, needle: &str) -> bool {
        self.terms.iter().any(|term| needle.contains(term.as_str()) || term.contains(needle))
    }
}

fn normalize(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Validated controlled vocabulary.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Vocabulary {
    entries: Vec<ResolvedEntry>,
}

impl Vocabulary {
    /// Build a vocabulary from configurable rows.
    ///
    /// # Errors
    /// Returns [`CoreError::Vocabulary`] when a label is blank, duplicated
    /// (case-insensitively), collides with the `all` sentinel, or owns a blank
    /// synonym.
    pub fn from_entries(entries: Vec<VocabularyEntry>) -> Result<Self, CoreError> {
        let mut seen = BTreeSet::new();
        let mut resolved = Vec::with_capacity(entries.len());

        for entry in entries {
            let canonical = entry.canonical.trim().to_string();
            if canonical.is_empty() {
                return Err(CoreError::Vocabulary("canonical label MUST be non-empty".to_string()));
            }

            let key = canonical.to_lowercase();
            if key == ALL_CATEGORIES {
                return Err(CoreError::Vocabulary(format!(
                    "canonical label `{canonical}` collides with the `{ALL_CATEGORIES}` sentinel"
                )));
            }
            if !seen.insert(key.clone()) {
                return Err(CoreError::Vocabulary(format!(
                    "canonical label `{canonical}` is declared more than once"
                )));
            }

            let mut terms = vec![key.clone()];
            for synonym in entry.synonyms {
                let term = synonym.trim().to_lowercase();
                if term.is_empty() {
                    return Err(CoreError::Vocabulary(format!(
                        "category `{canonical}` has a blank synonym"
                    )));
                }
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }

            resolved.push(ResolvedEntry { canonical, key, terms });
        }

        Ok(Self { entries: resolved })
    }

    /// Parse a YAML document of the form `categories: [{canonical, synonyms}]`.
    ///
    /// # Errors
    /// Returns [`CoreError::Vocabulary`] for malformed YAML or invalid rows.
    pub fn from_yaml(document: &str) -> Result<Self, CoreError> {
        let file: VocabularyFile = serde_yaml::from_str(document)
            .map_err(|err| CoreError::Vocabulary(format!("invalid vocabulary YAML: {err}")))?;
        Self::from_entries(file.categories)
    }

    /// The built-in vocabulary.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<Vocabulary> = OnceLock::new();
        BUILTIN.get_or_init(|| Self {
            entries: DEFAULT_VOCABULARY
                .iter()
                .map(|spec| {
                    let key = spec.canonical.to_lowercase();
                    let mut terms = vec![key.clone()];
                    for synonym in spec.synonyms {
                        let term = synonym.to_lowercase();
                        if !terms.contains(&term) {
                            terms.push(term);
                        }
                    }
                    ResolvedEntry { canonical: spec.canonical.to_string(), key, terms }
                })
                .collect(),
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.canonical.as_str())
    }

    fn entry_for_filter(&self, filter_key: &str) -> Option<&ResolvedEntry> {
        self.entries
            .iter()
            .find(|entry| entry.key == filter_key)
            .or_else(|| self.entries.iter().find(|entry| entry.terms.iter().any(|t| t == filter_key)))
    }

    /// Resolve a raw category to its display label. Blank input falls back to
    /// [`FALLBACK_CATEGORY`]; input that contains none of an entry's terms is
    /// returned trimmed.
    #[must_use]
    pub fn canonicalize(&self, raw: Option<&str>) -> String {
        let Some(needle) = normalize(raw) else {
            return FALLBACK_CATEGORY.to_string();
        };

        if needle == FALLBACK_CATEGORY.to_lowercase() {
            return FALLBACK_CATEGORY.to_string();
        }

        self.entries
            .iter()
            .find(|entry| entry.key == needle)
            .or_else(|| self.entries.iter().find(|entry| entry.contains_term(&needle)))
            .map_or_else(|| raw.unwrap_or_default().trim().to_string(), |entry| entry.canonical.clone())
    }

    /// Alias-aware, case-insensitive category equality. The `all` sentinel (or
    /// a blank filter) admits everything; a missing raw category admits nothing else.
    #[must_use]
    pub fn matches(&self, raw: Option<&str>, filter: &str) -> bool {
        let filter_key = filter.trim().to_lowercase();
        if filter_key.is_empty() || filter_key == ALL_CATEGORIES {
            return true;
        }

        let Some(needle) = normalize(raw) else {
            return false;
        };

        if needle == filter_key {
            return true;
        }

        self.entry_for_filter(&filter_key).is_some_and(|entry| entry.is_alias_of(&needle))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// [`Vocabulary::canonicalize`] against the built-in vocabulary.
#[must_use]
pub fn canonicalize(raw: Option<&str>) -> String {
    Vocabulary::builtin().canonicalize(raw)
}

/// [`Vocabulary::matches`] against the built-in vocabulary.
#[must_use]
pub fn matches(raw: Option<&str>, filter: &str) -> bool {
    Vocabulary::builtin().matches(raw, filter)
}
