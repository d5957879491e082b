use serde_json::Value;

use super::{
    BoolParser, DictionaryParser, IntParser, JsonParser, ParsingError, ParsingErrors,
    ParsingResult, StringParser, NULL,
};

/// Reads the fields of one JSON object, recording failures instead of
/// returning early. A failed field yields its parser's fallback so the caller
/// can keep assembling the value; `finish` then reports everything at once.
///
/// ```
/// use ctb_core::parse::Fields;
/// use serde_json::json;
///
/// let json = json!({ "id": "c1", "attributes": { "name": 7 } });
/// let mut root = Fields::new(&json);
/// let mut attributes = root.child("attributes");
///
/// let id = root.required_string("id");
/// let name = attributes.string("name");
/// root.absorb(attributes);
///
/// let errors = root.finish((id, name)).unwrap_err();
/// assert_eq!(errors.len(), 1);
/// ```
#[derive(Debug)]
pub struct Fields<'a> {
    node: &'a Value,
    errors: Vec<ParsingError>,
}

impl<'a> Fields<'a> {
    pub fn new(node: &'a Value) -> Self {
        Self {
            node,
            errors: Vec::new(),
        }
    }

    pub fn node(&self) -> &'a Value {
        self.node
    }

    /// Scope over `node[key]`; a missing key gives a scope where every field
    /// is absent.
    pub fn child(&self, key: &str) -> Fields<'a> {
        Fields::new(self.node.get(key).unwrap_or(&NULL))
    }

    /// Takes over the failures recorded by a child scope.
    pub fn absorb(&mut self, child: Fields<'_>) {
        self.errors.extend(child.errors);
    }

    pub fn read<P: JsonParser>(&mut self, parser: &P, key: &str, required: bool) -> P::Output {
        match parser.parse_node(self.node, Some(key), required) {
            Ok(value) => value,
            Err(errors) => {
                self.errors.extend(errors);
                parser.fallback()
            }
        }
    }

    /// Like `read`, but an absent or `null` field is `None` rather than the
    /// fallback.
    pub fn read_optional<P: JsonParser>(&mut self, parser: &P, key: &str) -> Option<P::Output> {
        if self.node.get(key).map_or(true, Value::is_null) {
            return None;
        }
        Some(self.read(parser, key, true))
    }

    pub fn string(&mut self, key: &str) -> String {
        self.read(&StringParser::default(), key, false)
    }

    pub fn required_string(&mut self, key: &str) -> String {
        self.read(&StringParser::default(), key, true)
    }

    pub fn optional_string(&mut self, key: &str) -> Option<String> {
        self.read_optional(&StringParser::default(), key)
    }

    pub fn int(&mut self, key: &str) -> i64 {
        self.read(&IntParser::default(), key, false)
    }

    pub fn boolean(&mut self, key: &str) -> bool {
        self.read(&BoolParser::default(), key, false)
    }

    pub fn dictionary(
        &mut self,
        key: &str,
        required: bool,
    ) -> std::collections::BTreeMap<String, String> {
        self.read(&DictionaryParser, key, required)
    }

    pub fn errors(&self) -> &[ParsingError] {
        &self.errors
    }

    pub fn finish<T>(self, value: T) -> ParsingResult<T> {
        match ParsingErrors::from_vec(self.errors) {
            None => Ok(value),
            Some(errors) => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ArrayParser;
    use serde_json::json;

    #[test]
    fn every_bad_field_is_reported() {
        let json = json!({
            "id": 42,
            "attributes": { "name": false, "views_count": "many", "approved": true }
        });

        let mut root = Fields::new(&json);
        let mut attributes = root.child("attributes");
        let id = root.required_string("id");
        let name = attributes.string("name");
        let views = attributes.int("views_count");
        let approved = attributes.boolean("approved");
        root.absorb(attributes);

        assert_eq!(id, "");
        assert_eq!(name, "");
        assert_eq!(views, 0);
        assert!(approved);
        assert_eq!(root.finish(()).unwrap_err().len(), 3);
    }

    #[test]
    fn missing_child_scope_reads_as_absent() {
        let json = json!({ "id": "c1" });
        let root = Fields::new(&json);
        let mut attributes = root.child("attributes");

        assert_eq!(attributes.string("name"), "");
        assert_eq!(attributes.optional_string("name"), None);
        assert!(attributes.errors().is_empty());

        let _ = attributes.required_string("name");
        assert_eq!(attributes.errors().len(), 1);
    }

    #[test]
    fn nested_array_errors_are_flattened_into_parent() {
        let json = json!({ "creator_ids": ["u1", 2, 3] });
        let mut fields = Fields::new(&json);
        let ids = fields.read(&ArrayParser::new(StringParser::default()), "creator_ids", true);

        assert!(ids.is_empty());
        assert_eq!(fields.finish(ids).unwrap_err().len(), 2);
    }
}
