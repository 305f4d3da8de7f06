use log::debug;

use super::CleanError;
use crate::document::Document;

/// Reformat phone numbers as `xxx-xxx-xxxx`, dropping the `1` country code of eleven digit
/// numbers. Numbers with fewer than ten digits are removed.
pub fn phone_number(doc: &mut Document) -> Result<bool, CleanError> {
    let Some(current) = doc.phone_number.as_ref() else {
        return Ok(false);
    };

    let digits: String = current.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        debug!("{}: removing phone number {current}", doc.id);
        doc.phone_number = None;
        return Ok(true);
    }

    let digits = match digits.strip_prefix('1') {
        Some(national) if national.len() == 10 => national,
        _ => digits.as_str(),
    };
    let formatted = format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]);

    if *current == formatted {
        return Ok(false);
    }

    debug!("{}: {current} becomes {formatted}", doc.id);
    doc.phone_number = Some(formatted);
    Ok(true)
}
