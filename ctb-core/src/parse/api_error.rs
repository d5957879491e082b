use serde_json::Value;

use super::{ArrayParser, Fields, JsonParser, ParsingResult};
use crate::errors::{ApiError, DEFAULT_STATUS, ERROR_DOMAIN};

/// Decodes one JSON:API error object.
///
/// `status` may arrive as a number or a numeric string, `source` as a string
/// or as a `{ "pointer": .. }` / `{ "parameter": .. }` object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiErrorParser;

impl JsonParser for ApiErrorParser {
    type Output = ApiError;

    fn type_name(&self) -> &'static str {
        "ApiError"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<ApiError> {
        let mut fields = Fields::new(value);
        let error = ApiError {
            status: status_of(value.get("status")),
            code: fields.string("code"),
            title: fields.string("title"),
            source: source_of(value.get("source")),
            detail: fields.string("detail"),
            domain: ERROR_DOMAIN.to_string(),
        };
        fields.finish(error)
    }

    fn fallback(&self) -> ApiError {
        ApiError::new(DEFAULT_STATUS, "")
    }
}

/// Decodes the `errors` array of a JSON:API error document.
pub fn decode_api_errors(body: &str) -> ParsingResult<Vec<ApiError>> {
    ArrayParser::new(ApiErrorParser).parse_str(body, Some("errors"), true)
}

fn status_of(value: Option<&Value>) -> i32 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(DEFAULT_STATUS),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_STATUS),
        _ => DEFAULT_STATUS,
    }
}

fn source_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => map
            .get("pointer")
            .or_else(|| map.get("parameter"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        _ => String::new(),
    }
}
