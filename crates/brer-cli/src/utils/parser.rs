use brer::core::params::FieldValue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid assignment '{0}'. Expected KEY=VALUE (e.g., 'alpha=0.5').")]
    InvalidAssignment(String),

    #[error("Parameter name cannot be empty in assignment '{0}'.")]
    EmptyKey(String),

    #[error("Invalid atom index '{item}' in '{input}'. Sites must be non-negative integers.")]
    InvalidSite { input: String, item: String },
}

/// Splits `KEY=VALUE` and interprets the value with [`parse_value`].
pub fn parse_assignment(input: &str) -> Result<(String, FieldValue), ParseError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidAssignment(input.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(input.to_string()));
    }
    Ok((key.to_string(), parse_value(value)?))
}

/// Interprets a command-line value.
///
/// `[10, 25]` and `10,25` are site lists, whole numbers are integers, other numerals are
/// floats, and anything else is kept as text.
pub fn parse_value(input: &str) -> Result<FieldValue, ParseError> {
    let trimmed = input.trim();

    if let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return parse_sites(input, inner);
    }
    if trimmed.contains(',') {
        return parse_sites(input, trimmed);
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Ok(FieldValue::Integer(integer));
    }
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(float) = trimmed.parse::<f64>() {
            return Ok(FieldValue::Float(float));
        }
    }
    Ok(FieldValue::Text(trimmed.to_string()))
}

fn parse_sites(input: &str, list: &str) -> Result<FieldValue, ParseError> {
    if list.trim().is_empty() {
        return Ok(FieldValue::Sequence(Vec::new()));
    }
    list.split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<usize>().map_err(|_| ParseError::InvalidSite {
                input: input.to_string(),
                item: item.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(FieldValue::Sequence)
}
