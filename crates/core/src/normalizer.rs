//! Question normalization: rewrites domain synonyms into the canonical
//! vocabulary used by the registry tables before a question reaches the
//! completion service.
//!
//! The synonym table is an immutable value handed to [`Normalizer::new`];
//! deployments can ship their own table as JSON without code changes.

use std::collections::HashMap;

use regex::Regex;

use crate::error::CoreError;

/// Ordered synonym -> canonical mapping.
///
/// Synonyms are stored lowercased; canonical forms are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    entries: Vec<(String, String)>,
}

/// Built-in Catalan/Spanish vocabulary for the patrimoni registry.
const BUILTIN_SYNONYMS: &[(&str, &str)] = &[
    ("puertas cortafuegos", "PortaTallafoc"),
    ("puerta cortafuegos", "PortaTallafoc"),
    ("portes tallafoc", "PortaTallafoc"),
    ("porta tallafoc", "PortaTallafoc"),
    ("duchas", "Dutxa"),
    ("ducha", "Dutxa"),
    ("dutxes", "Dutxa"),
    ("extintores", "Extintor"),
    ("extintors", "Extintor"),
    ("puertas", "IFCDOOR"),
    ("puerta", "IFCDOOR"),
    ("portes", "IFCDOOR"),
    ("lavabos", "Lavabo"),
    ("aseos", "Lavabo"),
    ("baños", "Lavabo"),
    ("ascensores", "Ascensor"),
    ("ascensors", "Ascensor"),
    ("habitaciones", "espai"),
    ("habitación", "espai"),
    ("salas", "espai"),
    ("sales", "espai"),
    ("espacios", "espai"),
    ("espais", "espai"),
    ("edificios", "edifici"),
    ("edificio", "edifici"),
    ("edificis", "edifici"),
    ("departamento", "departament"),
    ("superficie", "area"),
    ("metros cuadrados", "area"),
];

impl SynonymTable {
    /// Build a table from `(synonym, canonical)` pairs.
    ///
    /// Blank synonyms are rejected. When the same synonym appears twice the
    /// first mapping wins.
    pub fn new<I, S, C>(pairs: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (synonym, canonical) in pairs {
            let synonym = synonym.into().trim().to_lowercase();
            let canonical = canonical.into();
            if synonym.is_empty() {
                return Err(CoreError::Validation(
                    "Synonym table contains a blank synonym".to_string(),
                ));
            }
            if entries.iter().any(|(s, _)| *s == synonym) {
                continue;
            }
            entries.push((synonym, canonical));
        }
        Ok(Self { entries })
    }

    /// Parse a table from a JSON object of `"synonym": "canonical"` pairs.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid synonym table: {e}")))?;

        let mut pairs = Vec::with_capacity(map.len());
        for (synonym, canonical) in map {
            let canonical = canonical.as_str().ok_or_else(|| {
                CoreError::Validation(format!(
                    "Synonym '{synonym}' must map to a string"
                ))
            })?;
            pairs.push((synonym, canonical.to_string()));
        }
        Self::new(pairs)
    }

    /// The vocabulary compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_SYNONYMS
                .iter()
                .map(|(s, c)| (s.to_string(), c.to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Whole-word, case-insensitive synonym substitution.
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: SynonymTable,
    lookup: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl Normalizer {
    /// Compile a normalizer for `table`.
    ///
    /// Fails when normalizing twice could give a different text than
    /// normalizing once: a canonical form that another synonym rewrites, or
    /// one that can join neighbouring words into a longer synonym.
    pub fn new(table: SynonymTable) -> Result<Self, CoreError> {
        if let Some((canonical, synonym)) = joining_canonical(&table) {
            return Err(CoreError::Validation(format!(
                "Canonical term '{canonical}' can combine with nearby words into synonym '{synonym}'"
            )));
        }

        let lookup: HashMap<String, String> = table.entries.iter().cloned().collect();
        let pattern = build_pattern(&table)?;

        let normalizer = Self {
            table,
            lookup,
            pattern,
        };

        for (_, canonical) in normalizer.table.entries() {
            let rewritten = normalizer.normalize(canonical);
            if rewritten != *canonical {
                return Err(CoreError::Validation(format!(
                    "Canonical term '{canonical}' is rewritten to '{rewritten}' by another synonym"
                )));
            }
        }

        Ok(normalizer)
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    /// Replace every whole-word synonym occurrence in `text`.
    pub fn normalize(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let matched = &caps[0];
                self.lookup
                    .get(&matched.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

/// First canonical form whose words line up with part of a synonym without
/// covering all of it, e.g. `porta` against `porta tallafoc`.
///
/// A synonym lying wholly inside a canonical form is left to the rewrite
/// check in [`Normalizer::new`].
fn joining_canonical(table: &SynonymTable) -> Option<(&str, &str)> {
    for (_, canonical) in table.entries() {
        let c = words(canonical);
        if c.is_empty() {
            continue;
        }
        for (synonym, _) in table.entries() {
            let s = words(synonym);
            let (m, n) = (c.len() as isize, s.len() as isize);
            for offset in (1 - m)..n {
                let covers_synonym = offset <= 0 && offset + m >= n;
                if covers_synonym {
                    continue;
                }
                let aligned = (0..m)
                    .filter_map(|j| usize::try_from(j + offset).ok().map(|k| (j as usize, k)))
                    .filter(|&(_, k)| k < s.len())
                    .all(|(j, k)| c[j] == s[k]);
                if aligned {
                    return Some((canonical.as_str(), synonym.as_str()));
                }
            }
        }
    }
    None
}

/// Lowercased word tokens, split the way `\b` splits them.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

/// One alternation over every synonym, longest first so multi-word entries
/// beat their single-word prefixes.
fn build_pattern(table: &SynonymTable) -> Result<Option<Regex>, CoreError> {
    if table.is_empty() {
        return Ok(None);
    }

    let mut synonyms: Vec<&str> = table.entries.iter().map(|(s, _)| s.as_str()).collect();
    synonyms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

    let alternation = synonyms
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
        .map(Some)
        .map_err(|e| CoreError::Internal(format!("Failed to compile synonym pattern: {e}")))
}
