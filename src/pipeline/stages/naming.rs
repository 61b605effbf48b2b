//! Column name normalization and collision-free naming helpers.

use crate::error::Result;
use crate::frame;
use crate::pipeline::options::NameCase;
use polars::prelude::DataFrame;
use std::collections::HashSet;

/// Normalize a single column name, ignoring collisions.
///
/// Trims, turns each whitespace run into one `_`, drops everything that is
/// not ASCII alphanumeric or `_`, then applies `case`. A name with nothing
/// left becomes `column` in the requested case.
pub fn normalize_name(name: &str, case: NameCase) -> String {
    let mut clean = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                clean.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' {
            clean.push(c);
        }
    }

    if clean.is_empty() {
        clean.push_str("column");
    }
    apply_case(&clean, case)
}

fn apply_case(name: &str, case: NameCase) -> String {
    match case {
        NameCase::Title => name
            .split('_')
            .map(title_word)
            .collect::<Vec<_>>()
            .join("_"),
        NameCase::Lower => name.to_ascii_lowercase(),
        NameCase::Upper => name.to_ascii_uppercase(),
        NameCase::Preserve => name.to_owned(),
    }
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = first.to_ascii_uppercase().to_string();
            out.push_str(&chars.as_str().to_ascii_lowercase());
            out
        }
        None => String::new(),
    }
}

/// Normalize every name, suffixing later collisions with `_2`, `_3`, ...
///
/// A suffix is never handed out if any column would normalize to it on its
/// own, so re-running the normalizer on its output changes nothing.
pub fn normalized_names(names: &[String], case: NameCase) -> Vec<String> {
    let natural: Vec<String> = names.iter().map(|n| normalize_name(n, case)).collect();
    let reserved: HashSet<&str> = natural.iter().map(String::as_str).collect();
    let mut assigned: HashSet<String> = HashSet::with_capacity(natural.len());
    let mut result = Vec::with_capacity(natural.len());

    for base in &natural {
        let name = if assigned.contains(base) {
            disambiguate(base, |candidate| {
                reserved.contains(candidate) || assigned.contains(candidate)
            })
        } else {
            base.clone()
        };
        assigned.insert(name.clone());
        result.push(name);
    }
    result
}

/// First of `base_2`, `base_3`, ... for which `taken` is false.
pub fn disambiguate(base: &str, taken: impl Fn(&str) -> bool) -> String {
    (2_usize..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_owned())
}

/// Keep names as given, suffixing repeats. Used for decoded header rows.
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let originals: HashSet<String> = names.iter().cloned().collect();
    let mut assigned: HashSet<String> = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .map(|name| {
            let name = if assigned.contains(&name) {
                disambiguate(&name, |c| originals.contains(c) || assigned.contains(c))
            } else {
                name
            };
            assigned.insert(name.clone());
            name
        })
        .collect()
}

pub fn apply(df: &DataFrame, case: NameCase) -> Result<DataFrame> {
    let names = normalized_names(&frame::column_names(df), case);
    tracing::debug!(columns = names.len(), "normalized column names");
    frame::with_names(df, &names)
}
