//! Construction and parsing of world-state keys.

use crate::error::{KeyError, KeyResult};

/// Reserved delimiter joining composite-key parts. U+0000 cannot appear in
/// any namespace or segment value.
pub const DELIMITER: char = '\u{0000}';

/// Upper sentinel appended to a composite prefix to form the exclusive end
/// bound of a prefix range. Compares greater than any valid key character.
const RANGE_CEILING: char = '\u{10FFFF}';

/// Build a simple (primary-entity) key from an identifier.
///
/// The identifier is used as the key verbatim. It must be non-empty and must
/// not contain the delimiter, which would make it collide with the composite
/// keyspace.
pub fn simple_key(id: &str) -> KeyResult<String> {
    if id.is_empty() {
        return Err(KeyError::EmptyKey);
    }
    if id.contains(DELIMITER) {
        return Err(KeyError::InvalidSegment {
            segment: id.to_string(),
        });
    }
    Ok(id.to_string())
}

/// Build a composite key from a namespace and ordered segments.
///
/// Layout: `\0<namespace>\0<seg1>\0<seg2>\0...` — every part is terminated by
/// the delimiter, so a completed segment list is a strict prefix of every key
/// that extends it. The leading delimiter keeps composite keys out of the
/// simple keyspace.
pub fn composite_key(namespace: &str, segments: &[&str]) -> KeyResult<String> {
    validate_part_set(namespace, segments)?;

    let mut key = String::with_capacity(
        2 + namespace.len() + segments.iter().map(|s| s.len() + 1).sum::<usize>(),
    );
    key.push(DELIMITER);
    key.push_str(namespace);
    key.push(DELIMITER);
    for segment in segments {
        key.push_str(segment);
        key.push(DELIMITER);
    }
    Ok(key)
}

/// Compute the `[start, end)` bounds of a lexicographic scan returning
/// exactly the composite keys that share `namespace` + `leading_segments`.
///
/// `leading_segments` may be empty to scan a whole namespace.
pub fn composite_range(namespace: &str, leading_segments: &[&str]) -> KeyResult<(String, String)> {
    let start = composite_key(namespace, leading_segments)?;
    let mut end = start.clone();
    end.push(RANGE_CEILING);
    Ok((start, end))
}

/// Returns `true` if `key` lives in the composite keyspace.
pub fn is_composite(key: &str) -> bool {
    key.starts_with(DELIMITER)
}

/// Split a composite key back into its namespace and segments.
pub fn split_composite_key(key: &str) -> KeyResult<(String, Vec<String>)> {
    if !is_composite(key) {
        return Err(KeyError::NotComposite {
            key: key.to_string(),
        });
    }
    let malformed = || KeyError::Malformed {
        key: key.to_string(),
    };

    // Drop the leading delimiter, then split on the remaining ones. A
    // well-formed key ends with a delimiter, so the final piece is empty.
    let mut parts: Vec<&str> = key[DELIMITER.len_utf8()..].split(DELIMITER).collect();
    if parts.pop() != Some("") {
        return Err(malformed());
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(malformed());
    }
    let mut parts = parts.into_iter();
    let namespace = parts.next().ok_or_else(malformed)?.to_string();
    Ok((namespace, parts.map(str::to_string).collect()))
}

fn validate_part_set(namespace: &str, segments: &[&str]) -> KeyResult<()> {
    if namespace.is_empty() {
        return Err(KeyError::EmptyNamespace);
    }
    if namespace.contains(DELIMITER) {
        return Err(KeyError::InvalidSegment {
            segment: namespace.to_string(),
        });
    }
    for segment in segments {
        if segment.is_empty() {
            return Err(KeyError::EmptySegment {
                namespace: namespace.to_string(),
            });
        }
        if segment.contains(DELIMITER) {
            return Err(KeyError::InvalidSegment {
                segment: segment.to_string(),
            });
        }
    }
    Ok(())
}
