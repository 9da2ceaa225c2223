//! Fixed-format parsing of stitching plate names.
//!
//! A plate name looks like `S01000123...`: a three character plate code
//! (`S` analysis / `T` titration prefix plus a two digit variant slot)
//! followed by a six digit zero-padded workflow id.

use crate::error::ParseError;

/// Leading letter of titration plate codes.
pub const TITRATION_PREFIX: char = 'T';
/// Leading letter of analysis plate codes.
pub const ANALYSIS_PREFIX: char = 'S';

const CODE_LEN: usize = 3;
const WORKFLOW_ID_RANGE: std::ops::Range<usize> = 3..9;

/// Parse the workflow id embedded at characters 4-9 of a plate name.
pub fn derive_workflow_id(source_name: &str) -> Result<i64, ParseError> {
    if source_name.len() < WORKFLOW_ID_RANGE.end {
        return Err(ParseError::TooShort {
            name: source_name.to_string(),
            min: WORKFLOW_ID_RANGE.end,
        });
    }
    let field = source_name.get(WORKFLOW_ID_RANGE).unwrap_or_default();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::NonNumeric {
            name: source_name.to_string(),
            field: field.to_string(),
        });
    }
    field.parse().map_err(|_| ParseError::NonNumeric {
        name: source_name.to_string(),
        field: field.to_string(),
    })
}

/// The plate code used to look up a plate's variant.
///
/// Titration plates share the strain table with analysis plates, so a
/// leading `T` is rewritten to `S`.
pub fn variant_code(source_name: &str) -> Result<String, ParseError> {
    let code = source_name
        .get(..CODE_LEN)
        .ok_or_else(|| ParseError::TooShort {
            name: source_name.to_string(),
            min: CODE_LEN,
        })?;
    match code.strip_prefix(TITRATION_PREFIX) {
        Some(rest) => Ok(format!("{ANALYSIS_PREFIX}{rest}")),
        None => Ok(code.to_string()),
    }
}
