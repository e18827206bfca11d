// JSON document parser (default in-process worker logic)
use serde_json::{json, Value};

use ptimer_core::domain::ParsedFile;
use ptimer_core::port::{FileParser, ParseError};

/// Parses a file as a JSON document and reports its size alongside it
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDocumentParser;

impl FileParser for JsonDocumentParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedFile, ParseError> {
        if bytes.is_empty() {
            return Err(ParseError::new("empty file"));
        }
        let document: Value =
            serde_json::from_slice(bytes).map_err(|e| ParseError::new(e.to_string()))?;
        Ok(json!({
            "bytes": bytes.len(),
            "document": document,
        }))
    }
}
