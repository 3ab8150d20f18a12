//! In-memory municipality lookup keyed by folded city name and state.

use std::collections::HashMap;

use crate::erp_ports::MunicipalityResolver;

/// City/state → municipality code table.
///
/// Keys are matched ignoring case, surrounding whitespace, repeated inner
/// spaces, and Portuguese diacritics, so "São Paulo" and "SAO  PAULO" hit the
/// same entry.
#[derive(Debug, Clone, Default)]
pub struct MunicipalityTable {
    entries: HashMap<(String, String), String>,
}

impl MunicipalityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, city: &str, state: &str, code: impl Into<String>) -> Self {
        self.insert(city, state, code);
        self
    }

    pub fn insert(&mut self, city: &str, state: &str, code: impl Into<String>) {
        self.entries.insert((fold(city), fold(state)), code.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C, S, K> FromIterator<(C, S, K)> for MunicipalityTable
where
    C: AsRef<str>,
    S: AsRef<str>,
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, S, K)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (city, state, code) in iter {
            table.insert(city.as_ref(), state.as_ref(), code);
        }
        table
    }
}

impl MunicipalityResolver for MunicipalityTable {
    fn resolve(&self, city: &str, state: &str) -> Option<String> {
        self.entries.get(&(fold(city), fold(state))).cloned()
    }
}

fn fold(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .map(strip_accent)
        .flat_map(char::to_lowercase)
        .collect()
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        other => other,
    }
}
