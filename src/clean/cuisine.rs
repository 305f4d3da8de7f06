use deunicode::deunicode;
use log::debug;

use super::CleanError;
use crate::document::{Cuisine, Document};

const SUFFIXES: &[&str] = &["_shop", "_house"];

fn trim_list_value(value: &str) -> String {
    value.trim_matches(|c: char| c == '_' || c == ' ').to_string()
}

/// Normalize a single raw cuisine value.
pub fn normalize(raw: &str) -> Cuisine {
    let mut value = raw.to_lowercase();
    if !raw.is_ascii() {
        value = deunicode(&value).to_ascii_lowercase();
    }

    while let Some(stripped) = SUFFIXES.iter().find_map(|suffix| value.strip_suffix(suffix)) {
        value = stripped.to_string();
    }

    if value == "india" {
        value = "indian".to_string();
    }
    if value.contains("nut") {
        value = "donuts".to_string();
    }
    if value == "pretzel" {
        value = "pretzels".to_string();
    }
    if value.contains("burger") && !value.contains("burgers") {
        value = value.replace("burger", "burgers");
    }

    if value.contains(';') {
        Cuisine::Many(value.split(';').map(str::to_string).collect())
    } else if value.contains(',') {
        Cuisine::Many(value.split(',').map(trim_list_value).collect())
    } else {
        Cuisine::One(value)
    }
}

/// Normalize the cuisine of a document. Values that are already lists were cleaned before
/// and are skipped.
pub fn cuisine(doc: &mut Document) -> Result<bool, CleanError> {
    let Some(Cuisine::One(current)) = doc.cuisine.as_ref() else {
        return Ok(false);
    };

    let cleaned = normalize(current);
    if cleaned == Cuisine::One(current.clone()) {
        return Ok(false);
    }

    debug!("{}: {current} becomes {cleaned}", doc.id);
    doc.cuisine = Some(cleaned);
    Ok(true)
}
