use std::collections::BTreeMap;

use serde_json::Value;

use super::{JsonParser, ParsingError, ParsingErrors, ParsingResult};

#[derive(Debug, Clone, Default)]
pub struct StringParser {
    fallback: String,
}

impl StringParser {
    pub fn with_fallback(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }
}

impl JsonParser for StringParser {
    type Output = String;

    fn type_name(&self) -> &'static str {
        "String"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_string()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<String> {
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn fallback(&self) -> String {
        self.fallback.clone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntParser {
    fallback: i64,
}

impl IntParser {
    pub fn with_fallback(fallback: i64) -> Self {
        Self { fallback }
    }
}

impl JsonParser for IntParser {
    type Output = i64;

    fn type_name(&self) -> &'static str {
        "Int"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.as_i64().is_some()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<i64> {
        Ok(value.as_i64().unwrap_or(self.fallback))
    }

    fn fallback(&self) -> i64 {
        self.fallback
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatParser {
    fallback: f64,
}

impl FloatParser {
    pub fn with_fallback(fallback: f64) -> Self {
        Self { fallback }
    }
}

impl JsonParser for FloatParser {
    type Output = f64;

    fn type_name(&self) -> &'static str {
        "Float"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_number()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<f64> {
        Ok(value.as_f64().unwrap_or(self.fallback))
    }

    fn fallback(&self) -> f64 {
        self.fallback
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolParser {
    fallback: bool,
}

impl BoolParser {
    pub fn with_fallback(fallback: bool) -> Self {
        Self { fallback }
    }
}

impl JsonParser for BoolParser {
    type Output = bool;

    fn type_name(&self) -> &'static str {
        "Bool"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_boolean()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<bool> {
        Ok(value.as_bool().unwrap_or(self.fallback))
    }

    fn fallback(&self) -> bool {
        self.fallback
    }
}

/// Flat string-to-string object. Numbers and booleans are kept in their
/// textual form, nested containers are errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryParser;

impl JsonParser for DictionaryParser {
    type Output = BTreeMap<String, String>;

    fn type_name(&self) -> &'static str {
        "Dictionary"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<Self::Output> {
        let mut entries = BTreeMap::new();
        let mut errors = Vec::new();

        if let Some(object) = value.as_object() {
            for (key, item) in object {
                match item {
                    Value::String(s) => {
                        entries.insert(key.clone(), s.clone());
                    }
                    Value::Number(_) | Value::Bool(_) => {
                        entries.insert(key.clone(), item.to_string());
                    }
                    Value::Null => {}
                    other => errors.push(ParsingError::unexpected_kind(other, Some(key), "String")),
                }
            }
        }

        match ParsingErrors::from_vec(errors) {
            None => Ok(entries),
            Some(errors) => Err(errors),
        }
    }

    fn fallback(&self) -> Self::Output {
        BTreeMap::new()
    }
}

/// Array of elements decoded by `P`; element failures are collected, not
/// short-circuited.
#[derive(Debug, Clone, Default)]
pub struct ArrayParser<P> {
    element: P,
}

impl<P: JsonParser> ArrayParser<P> {
    pub fn new(element: P) -> Self {
        Self { element }
    }
}

impl<P: JsonParser> JsonParser for ArrayParser<P> {
    type Output = Vec<P::Output>;

    fn type_name(&self) -> &'static str {
        "Array"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_array()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<Self::Output> {
        let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
        let mut parsed = Vec::with_capacity(items.len());
        let mut errors = Vec::new();

        for item in items {
            match self.element.parse_node(item, None, true) {
                Ok(value) => parsed.push(value),
                Err(item_errors) => errors.extend(item_errors),
            }
        }

        match ParsingErrors::from_vec(errors) {
            None => Ok(parsed),
            Some(errors) => Err(errors),
        }
    }

    fn fallback(&self) -> Self::Output {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_missing_field_uses_fallback() {
        let json = json!({ "other": 1 });
        let parsed = StringParser::with_fallback("none")
            .parse_node(&json, Some("name"), false)
            .unwrap();
        assert_eq!(parsed, "none");
    }

    #[test]
    fn required_null_field_is_an_error() {
        let json = json!({ "name": null });
        let errors = StringParser::default()
            .parse_node(&json, Some("name"), true)
            .unwrap_err();
        assert_eq!(
            errors.as_slice()[0].message,
            "Found null for required data 'name' when parsing 'String'"
        );
    }

    #[test]
    fn wrong_kind_is_an_error_even_when_optional() {
        let json = json!({ "count": "three" });
        let errors = IntParser::default()
            .parse_node(&json, Some("count"), false)
            .unwrap_err();
        assert_eq!(
            errors.as_slice()[0].message,
            "Expected value '\"three\"' for key 'count' to be a 'Int'"
        );
    }

    #[test]
    fn array_collects_every_bad_element() {
        let json = json!({ "ids": ["a", 1, "b", false, null] });
        let errors = ArrayParser::new(StringParser::default())
            .parse_node(&json, Some("ids"), true)
            .unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn dictionary_stringifies_scalars_and_rejects_containers() {
        let json = json!({ "key": "k", "expires": 60, "secure": true, "nested": {} });
        let errors = DictionaryParser.parse_node(&json, None, true).unwrap_err();
        assert_eq!(errors.len(), 1);

        let json = json!({ "key": "k", "expires": 60, "secure": true });
        let parsed = DictionaryParser.parse_node(&json, None, true).unwrap();
        assert_eq!(parsed["expires"], "60");
        assert_eq!(parsed["secure"], "true");
    }

    #[test]
    fn invalid_json_text_is_a_single_error() {
        let errors = StringParser::default()
            .parse_str("", Some("data"), true)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.as_slice()[0].message.starts_with("Response body is not valid JSON"));
    }
}
