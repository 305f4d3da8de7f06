//! Fast food chain names and religion labels.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::CleanError;
use crate::document::Document;

/// Known spellings of fast food chains and their canonical name. Every entry is tried in
/// this order against the current name, so a later match overrides an earlier one.
const FAST_FOOD_PATTERNS: &[(&str, &str)] = &[
    ("^Arby", "Arby's"),
    ("^Bombay", "Bombay Coast Indian Tandoor & Curry Express"),
    (".Green", "Carl's Jr. / The Green Burrito"),
    (r"^Carl.*(r|\.)$", "Carl's Jr."),
    ("^Chipo", "Chipotle Mexican Grill"),
    ("^Daphn", "Daphne's California Greek Restaurant"),
    ("(Wiene)", "Wienerschnitzel"),
    ("^Papa", "Papa John's Pizza"),
    ("^Rubio", "Rubio's Coastal Grill"),
    ("^Little", "Little Caesars"),
    ("^Pick", "Pick Up Stix"),
    ("^Jack", "Jack in the Box"),
    ("^In", "In-N-Out Burger"),
    ("^Five", "Five Guys Burger and Fries"),
    ("^Evolution", "Evolution Fast Food"),
    ("^Jersey", "Jersey Mike's Subs"),
    ("^Roberto", "Roberto's Taco Shop"),
    ("^Santan", "Fresh MXN Food"),
    ("^Subway", "Subway"),
    ("^Wahoo", "Wahoo's Fish Taco"),
    ("^Z", "Zpizza"),
];

static FAST_FOOD_NAMES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    FAST_FOOD_PATTERNS
        .iter()
        .map(|(pattern, canonical)| (Regex::new(pattern).unwrap(), *canonical))
        .collect()
});

/// Canonical chain name for `name`, if any pattern matches.
pub fn canonical_fast_food_name(name: &str) -> Option<&'static str> {
    let mut current = name;
    let mut canonical = None;
    for (pattern, replacement) in FAST_FOOD_NAMES.iter() {
        if pattern.is_match(current) {
            current = *replacement;
            canonical = Some(*replacement);
        }
    }
    canonical
}

pub fn fast_food_name(doc: &mut Document) -> Result<bool, CleanError> {
    if doc.tag("amenity") != Some("fast_food") {
        return Ok(false);
    }
    let Some(current) = doc.tag("name") else {
        return Ok(false);
    };
    let Some(canonical) = canonical_fast_food_name(current) else {
        return Ok(false);
    };
    if current == canonical {
        return Ok(false);
    }

    debug!("{}: {current} becomes {canonical}", doc.id);
    doc.tags.insert("name".to_string(), canonical.to_string());
    Ok(true)
}

/// Lump the unitarian variants of places of worship together.
pub fn religion(doc: &mut Document) -> Result<bool, CleanError> {
    if doc.tag("amenity") != Some("place_of_worship") {
        return Ok(false);
    }
    match doc.tag("religion") {
        Some(current) if current.contains("unitarian_") => {
            debug!("{}: {current} becomes unitarian", doc.id);
            doc.tags.insert("religion".to_string(), "unitarian".to_string());
            Ok(true)
        }
        _ => Ok(false),
    }
}
