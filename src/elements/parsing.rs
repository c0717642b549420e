use crate::elements::error::FetchError;
use crate::elements::types::{ObjectId, OrbitalElementSet};

/// Locate the three-line record for `object` in a newline-delimited catalog payload.
///
/// A record starts at the first name line mentioning the object that is
/// followed by two more lines. Element lines themselves are never taken as
/// the start of a record, even though they carry the catalog number.
pub fn parse_catalog(payload: &str, object: &ObjectId) -> Result<OrbitalElementSet, FetchError> {
    let lines: Vec<&str> = payload
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let start = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !is_element_line(line))
        .find(|(i, line)| object.matches(line) && i + 2 < lines.len())
        .map(|(i, _)| i)
        .ok_or_else(|| FetchError::DataNotFound(object.label()))?;

    let (name, line1, line2) = (lines[start], lines[start + 1], lines[start + 2]);

    if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
        return Err(FetchError::Malformed {
            object: object.label(),
            message: format!("record starting at '{}' is not followed by two element lines", name),
        });
    }

    Ok(OrbitalElementSet {
        name: name.to_string(),
        line1: line1.to_string(),
        line2: line2.to_string(),
    })
}

fn is_element_line(line: &str) -> bool {
    line.starts_with("1 ") || line.starts_with("2 ")
}
