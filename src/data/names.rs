use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::debug;

/// Country names as spelled in the expenditure table, paired with the
/// spelling the boundary dataset uses.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("United States", "United States of America"),
    ("Russian Federation", "Russia"),
    ("Venezuela (Bolivarian Republic of)", "Venezuela"),
    ("Congo, Dem. Rep.", "Democratic Republic of the Congo"),
    ("Congo, Rep.", "Republic of the Congo"),
    ("Cote d'Ivoire", "Ivory Coast"),
];

static BUILTIN: LazyLock<NameAliasTable> = LazyLock::new(NameAliasTable::builtin);

/// Fixed alias → canonical name mapping. Each alias maps to exactly one
/// canonical name; the table is read-only once built.
#[derive(Debug, Clone)]
pub struct NameAliasTable {
    aliases: HashMap<String, String>,
}

impl NameAliasTable {
    /// The built-in aliases only
    pub fn builtin() -> Self {
        Self {
            aliases: BUILTIN_ALIASES
                .iter()
                .map(|&(alias, canonical)| (alias.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Add extra aliases. An override for an existing alias replaces it.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (alias, canonical) in overrides {
            let alias = alias.into();
            let canonical = canonical.into();
            if let Some(previous) = self.aliases.insert(alias.clone(), canonical.clone()) {
                debug!(%alias, %previous, %canonical, "alias override replaces built-in mapping");
            }
        }
        self
    }

    /// Canonical spelling for `raw`, or `raw` itself when it is not an alias.
    pub fn normalize<'a>(&'a self, raw: &'a str) -> &'a str {
        self.aliases.get(raw).map(String::as_str).unwrap_or(raw)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for NameAliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Normalize with the built-in alias table
pub fn normalize(raw: &str) -> &str {
    BUILTIN.normalize(raw)
}
