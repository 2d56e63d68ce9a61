//! `__name__` substitution templates.
//!
//! A template is literal text with `__name__` markers. `__if_name__ ... __endif__`
//! keeps its text only when `name` maps to a non-empty value; these regions do
//! not nest. Unknown names expand to nothing.

mod defaults;
mod loader;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub use defaults::{default_item_template, default_page_template};
pub use loader::Templates;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.*?)__").expect("valid marker regex"));

/// Named values for one template expansion. A key that is absent is
/// different from a key mapped to the empty string only for lookups; both
/// suppress `__if_key__` regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// True when `key` is present with a non-empty value.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bits = Substitutions::new();
        for (k, v) in iter {
            bits.insert(k, v);
        }
        bits
    }
}

/// Expand `template` against `bits`.
pub fn fill_template(template: &str, bits: &Substitutions) -> String {
    let mut out = String::with_capacity(template.len());
    let mut writing = true;
    let mut last = 0;

    for caps in MARKER.captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if writing {
            out.push_str(&template[last..whole.start()]);
        }
        last = whole.end();

        let key = key.as_str();
        if let Some(name) = key.strip_prefix("if_") {
            writing = bits.is_set(name);
        } else if key == "endif" {
            writing = true;
        } else if let Some(value) = bits.get(key) {
            out.push_str(value);
        }
    }

    if writing {
        out.push_str(&template[last..]);
    }
    out
}
