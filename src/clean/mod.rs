use std::{collections::BTreeMap, num::ParseIntError};

use log::{debug, info};
use thiserror::Error;

use crate::document::Document;

pub mod address;
pub mod cuisine;
pub mod names;
pub mod phone;

/// A present field whose value a rule cannot interpret. The document keeps its old value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CleanError {
    #[error("{field} {value:?} is not a range of exactly two numbers")]
    NotARange { field: &'static str, value: String },
    #[error("{field} {value:?} has a non-integer range endpoint")]
    BadEndpoint {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("{field} {value:?} spans more than {} numbers", address::MAX_RANGE_LEN)]
    RangeTooWide { field: &'static str, value: String },
}

/// A cleaning rule applied to a single document. `Ok(true)` if the document changed.
pub type Rule = fn(&mut Document) -> Result<bool, CleanError>;

/// The cleaning pipeline, in the order it runs.
pub const RULES: [(&str, Rule); 7] = [
    ("postcode", address::postcode),
    ("housenumber", address::housenumber),
    ("street", address::street),
    ("phone", phone::phone_number),
    ("cuisine", cuisine::cuisine),
    ("fast food name", names::fast_food_name),
    ("religion", names::religion),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flagged {
    pub id: String,
    pub rule: &'static str,
    pub error: CleanError,
}

#[derive(Debug, Default)]
pub struct CleanReport {
    /// Documents changed, per rule.
    pub changed: BTreeMap<&'static str, usize>,
    /// Documents a rule refused to touch.
    pub flagged: Vec<Flagged>,
}

/// Run one rule over one document, recording the outcome.
fn apply(name: &'static str, rule: Rule, doc: &mut Document, report: &mut CleanReport) {
    match rule(doc) {
        Ok(true) => *report.changed.entry(name).or_default() += 1,
        Ok(false) => {}
        Err(error) => {
            debug!("{}: skipping {name}: {error}", doc.id);
            report.flagged.push(Flagged {
                id: doc.id.clone(),
                rule: name,
                error,
            });
        }
    }
}

/// Run the pipeline over the whole collection, one rule at a time.
pub fn clean_all(docs: &mut [Document]) -> CleanReport {
    let mut report = CleanReport::default();

    for (i, (name, rule)) in RULES.into_iter().enumerate() {
        info!("{}/{} Cleaning {name} data", i + 1, RULES.len());
        for doc in docs.iter_mut() {
            apply(name, rule, doc, &mut report);
        }
    }

    info!(
        "All clean: {} changes, {} flagged",
        report.changed.values().sum::<usize>(),
        report.flagged.len()
    );

    report
}
