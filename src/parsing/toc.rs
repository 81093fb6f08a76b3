use std::io::Read;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::core::record::RawRecord;
use crate::utils::validation::check_record_limit;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOC format: {0}")]
    InvalidFormat(String),

    #[error("{0}")]
    TooManyRecords(String),
}

/// Read a TOC from a file, or from stdin when the path is `-`
///
/// # Errors
///
/// Returns `ParseError::Io` if the input cannot be read, or other parse errors if the
/// content is not a TOC.
pub fn parse_toc_file(path: &Path) -> Result<Vec<RawRecord>, ParseError> {
    parse_toc_value(read_json_file(path)?)
}

/// Read any JSON document from a file, or from stdin when the path is `-`
///
/// # Errors
///
/// Returns `ParseError::Io` if the input cannot be read or `ParseError::Json` if it is
/// not JSON.
pub fn read_json_file(path: &Path) -> Result<Value, ParseError> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&content)?)
}

/// Parse TOC JSON text
///
/// # Errors
///
/// Returns `ParseError::Json` for invalid JSON, `ParseError::InvalidFormat` if no entry
/// array is found, or `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_toc_text(text: &str) -> Result<Vec<RawRecord>, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    parse_toc_value(value)
}

/// Interpret an already-parsed JSON value as a TOC
///
/// # Errors
///
/// See [`parse_toc_text`].
pub fn parse_toc_value(value: Value) -> Result<Vec<RawRecord>, ParseError> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match ["toc", "items"].iter().find_map(|k| map.remove(*k)) {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ParseError::InvalidFormat(
                    "`toc`/`items` must be an array".to_string(),
                ))
            }
            None => {
                return Err(ParseError::InvalidFormat(
                    "expected an array of entries or an object with a `toc` or `items` array"
                        .to_string(),
                ))
            }
        },
        other => {
            return Err(ParseError::InvalidFormat(format!(
                "expected an array of entries, found {}",
                json_type_name(&other)
            )))
        }
    };

    if let Some(message) = check_record_limit(entries.len()) {
        return Err(ParseError::TooManyRecords(message));
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            if !entry.is_object() {
                return Err(ParseError::InvalidFormat(format!(
                    "entry {i} is {}, not an object",
                    json_type_name(&entry)
                )));
            }
            Ok(serde_json::from_value::<RawRecord>(entry)?)
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::MAX_RECORDS;
    use std::io::Write;

    #[test]
    fn test_parse_array() {
        let text = r#"[
            {"concept_id": "1", "label": "JavaScript Environment"},
            {"concept_id": "1.1", "label": "Browser", "source_url": "https://example.com/browser"}
        ]"#;
        let toc = parse_toc_text(text).unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[1].concept_id.as_deref(), Some("1.1"));
        assert_eq!(
            toc[1].source_url.as_deref(),
            Some("https://example.com/browser")
        );
    }

    #[test]
    fn test_parse_wrapped_object() {
        let toc = parse_toc_text(r#"{"toc": [{"concept_id": "2"}]}"#).unwrap();
        assert_eq!(toc, vec![RawRecord::with_id("2")]);

        let toc = parse_toc_text(r#"{"items": []}"#).unwrap();
        assert!(toc.is_empty());
    }

    #[test]
    fn test_missing_identity_is_not_a_parse_error() {
        let toc = parse_toc_text(r#"[{"label": "no id"}]"#).unwrap();
        assert_eq!(toc[0].concept_id, None);
    }

    #[test]
    fn test_rejects_non_toc_json() {
        assert!(matches!(
            parse_toc_text("42"),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_toc_text(r#"{"chapters": []}"#),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_toc_text(r#"["1"]"#),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(parse_toc_text("[{"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_wrong_field_type_is_json_error() {
        assert!(matches!(
            parse_toc_text(r#"[{"concept_id": 3}]"#),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_record_limit() {
        let entries = vec![serde_json::json!({"concept_id": "1"}); MAX_RECORDS + 1];
        assert!(matches!(
            parse_toc_value(Value::Array(entries)),
            Err(ParseError::TooManyRecords(_))
        ));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"concept_id": "A"}}]"#).unwrap();
        let toc = parse_toc_file(file.path()).unwrap();
        assert_eq!(toc, vec![RawRecord::with_id("A")]);
    }
}
