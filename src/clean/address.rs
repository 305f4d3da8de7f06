//! Postcode, house number and street name rules.

use log::debug;

use super::CleanError;
use crate::document::{Address, AddressNumber, Document};

/// Widest range a postcode or house number may expand to.
pub const MAX_RANGE_LEN: u32 = 1000;

/// Trailing street name abbreviations and their expansion.
const STREET_SUFFIXES: &[(&str, &str)] = &[
    ("Ave", "Avenue"),
    ("St", "Street"),
    ("Ln", "Lane"),
    ("Av", "Avenue"),
    ("Pl", "Place"),
    ("Dr", "Drive"),
    ("Dr.", "Drive"),
    ("Rd", "Road"),
    ("Ct", "Court"),
    ("Rd.", "Road"),
];

/// Parse `value` as two integers separated by `separator`.
fn endpoints(field: &'static str, value: &str, separator: char) -> Result<(u32, u32), CleanError> {
    let mut parts = value.split(separator);
    let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CleanError::NotARange {
            field,
            value: value.to_string(),
        });
    };

    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|source| CleanError::BadEndpoint {
                field,
                value: value.to_string(),
                source,
            })
    };

    Ok((parse(start)?, parse(end)?))
}

/// The numbers from `start` up to, not including, `end`.
fn expand(
    field: &'static str,
    value: &str,
    start: u32,
    end: u32,
) -> Result<AddressNumber, CleanError> {
    if end.saturating_sub(start) > MAX_RANGE_LEN {
        return Err(CleanError::RangeTooWide {
            field,
            value: value.to_string(),
        });
    }
    Ok(AddressNumber::Range((start..end).collect()))
}

fn postcode_slot(address: &mut Address) -> &mut Option<AddressNumber> {
    &mut address.postcode
}

fn housenumber_slot(address: &mut Address) -> &mut Option<AddressNumber> {
    &mut address.housenumber
}

fn replace_number(
    doc: &mut Document,
    field: &str,
    slot: fn(&mut Address) -> &mut Option<AddressNumber>,
    cleaned: AddressNumber,
) -> bool {
    let id = doc.id.clone();
    let slot = slot(doc.address_mut());

    let Some(old) = slot.as_ref() else {
        return false;
    };
    if *old == cleaned {
        return false;
    }

    debug!("{id}: {field} {old} becomes {cleaned}");
    *slot = Some(cleaned);
    true
}

/// Cut ZIP+4 codes down to five characters and expand `start:end` into the codes in between,
/// excluding `end`.
pub fn postcode(doc: &mut Document) -> Result<bool, CleanError> {
    let Some(AddressNumber::Text(current)) = doc.address.as_ref().and_then(|a| a.postcode.as_ref())
    else {
        return Ok(false);
    };

    let mut text = current.clone();
    if text.chars().count() > 5 && text.contains('-') {
        text = text.chars().take(5).collect();
    }

    let cleaned = if text.contains(':') {
        let (start, end) = endpoints("postcode", &text, ':')?;
        expand("postcode", &text, start, end)?
    } else {
        AddressNumber::Text(text)
    };

    Ok(replace_number(doc, "postcode", postcode_slot, cleaned))
}

/// Turn `.5` into `1/2` and expand `a;b` into the house numbers between the smaller and the
/// larger endpoint, excluding the larger one.
///
/// The replacement is textual: `123.5` becomes `1231/2`, not `123 1/2`.
pub fn housenumber(doc: &mut Document) -> Result<bool, CleanError> {
    let Some(AddressNumber::Text(current)) =
        doc.address.as_ref().and_then(|a| a.housenumber.as_ref())
    else {
        return Ok(false);
    };

    let text = current.replace(".5", "1/2");

    let cleaned = if text.contains(';') {
        let (a, b) = endpoints("housenumber", &text, ';')?;
        let (low, high) = if a > b { (b, a) } else { (a, b) };
        expand("housenumber", &text, low, high)?
    } else {
        AddressNumber::Text(text)
    };

    Ok(replace_number(doc, "housenumber", housenumber_slot, cleaned))
}

/// Expand an abbreviated street type in the last word of the street name.
pub fn street(doc: &mut Document) -> Result<bool, CleanError> {
    let Some(current) = doc.address.as_ref().and_then(|a| a.street.as_ref()) else {
        return Ok(false);
    };

    let mut words: Vec<&str> = current.split_whitespace().collect();
    let Some(last) = words.last_mut() else {
        return Ok(false);
    };
    let Some((_, expanded)) = STREET_SUFFIXES.iter().find(|(abbr, _)| *abbr == *last) else {
        return Ok(false);
    };
    *last = *expanded;

    let cleaned = words.join(" ");
    debug!("{}: {current} becomes {cleaned}", doc.id);
    doc.address_mut().street = Some(cleaned);

    Ok(true)
}
