//! Recover a JSON object from free-form model output.
//!
//! Models wrap their JSON in prose, markdown fences, or both.  The extractor
//! makes three ordered attempts and the first that yields an object wins:
//!
//! 1. the interior of a ```` ```json … ``` ```` (or untagged) fenced block;
//! 2. the span from the first `{` to the last `}`;
//! 3. the whole text.
//!
//! A candidate that fails to parse, or parses to something other than an
//! object, moves on to the next attempt.  When all three fail the caller gets
//! a [`ParseError`], never an empty object.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// A fenced block whose body is a brace-delimited span with no backticks.
static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*(\{[^`]+\})\s*```").expect("fenced JSON pattern is valid")
});

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// No attempt produced a JSON object.
#[derive(Debug, Clone, Error)]
#[error("no JSON object in model output ({len} bytes): {reason}")]
pub struct ParseError {
    /// Length of the text that was searched.
    pub len: usize,
    /// Why the last attempt failed.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// TextExtractor
// ---------------------------------------------------------------------------

/// Stateless JSON-object extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Extract the first JSON object found by the ordered attempts.
    ///
    /// ```
    /// use character_forge::llm::TextExtractor;
    ///
    /// let text = "Here you go:\n```json\n{\"name\": \"Brom\"}\n```\nEnjoy!";
    /// let object = TextExtractor::extract(text).unwrap();
    /// assert_eq!(object["name"], "Brom");
    ///
    /// assert!(TextExtractor::extract("no json here").is_err());
    /// ```
    pub fn extract(text: &str) -> Result<Map<String, Value>, ParseError> {
        let mut reason = String::from("no candidate");

        for (attempt, candidate) in Self::candidates(text).into_iter().enumerate() {
            let Some(candidate) = candidate else {
                continue;
            };
            match serde_json::from_str::<Value>(candidate) {
                Ok(Value::Object(object)) => {
                    log::debug!("extract: attempt {} produced an object", attempt + 1);
                    return Ok(object);
                }
                Ok(other) => {
                    reason = format!("attempt {} parsed to a non-object ({})", attempt + 1, kind(&other));
                }
                Err(e) => {
                    reason = format!("attempt {}: {e}", attempt + 1);
                }
            }
            log::trace!("extract: {reason}");
        }

        Err(ParseError {
            len: text.len(),
            reason,
        })
    }

    /// The three candidate spans in attempt order; `None` when an attempt
    /// does not apply to this text.
    fn candidates(text: &str) -> [Option<&str>; 3] {
        let fenced = FENCED_JSON
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());

        let braced = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
            _ => None,
        };

        [fenced, braced, Some(text.trim())]
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
