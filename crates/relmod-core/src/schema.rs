//! Typed, fail-fast accessors over the parsed document tree.
//!
//! Every accessor pushes its key or index onto the parse trace, checks the
//! node against exactly one expected type, and pops on success. On a missing
//! key or type mismatch it returns a schema error carrying the full rendered
//! path, in the same wording the diagnostics have always used.
//!
//! Floats are strict: an integer literal where a float is required is an
//! error. This is a breaking config-format rule, chosen over the lenient
//! int-to-float coercion some parsers apply.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::trace::ParseTrace;

pub type Object = Map<String, Value>;

/// Schema validator: typed field access threaded through a parse trace.
#[derive(Debug, Default)]
pub struct Validator {
    trace: ParseTrace,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            trace: ParseTrace::new(),
        }
    }

    pub fn push_key(&mut self, key: &str) {
        self.trace.push_key(key);
    }

    pub fn push_index(&mut self, index: usize) {
        self.trace.push_index(index);
    }

    pub fn pop(&mut self) {
        self.trace.pop();
    }

    /// Build a schema error at the current path.
    pub fn error(&self, reason: &str) -> crate::error::Error {
        self.trace.error(reason)
    }

    /// Rendered current path, for errors that aren't plain type mismatches.
    pub fn path(&self) -> String {
        self.trace.render()
    }

    /// The document root must be an object.
    pub fn root_object<'a>(&self, root: &'a Value) -> Result<&'a Object> {
        root.as_object()
            .ok_or_else(|| self.trace.error("root value is not an object"))
    }

    pub fn object_field<'a>(&mut self, parent: &'a Object, key: &str) -> Result<&'a Object> {
        self.trace.push_key(key);
        let obj = parent
            .get(key)
            .and_then(Value::as_object)
            .ok_or_else(|| self.trace.error("is missing or isn't an object"))?;
        self.trace.pop();
        Ok(obj)
    }

    pub fn bool_field(&mut self, parent: &Object, key: &str) -> Result<bool> {
        self.trace.push_key(key);
        let value = parent
            .get(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| self.trace.error("is missing or isn't a bool"))?;
        self.trace.pop();
        Ok(value)
    }

    /// Optional bool: absent is `None`, present-but-mistyped is an error.
    pub fn optional_bool_field(&mut self, parent: &Object, key: &str) -> Result<Option<bool>> {
        let Some(value) = parent.get(key) else {
            return Ok(None);
        };
        self.trace.push_key(key);
        let value = value
            .as_bool()
            .ok_or_else(|| self.trace.error("isn't a bool"))?;
        self.trace.pop();
        Ok(Some(value))
    }

    pub fn int_field(&mut self, parent: &Object, key: &str) -> Result<i64> {
        self.trace.push_key(key);
        let value = parent
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.trace.error("is missing or isn't an int"))?;
        self.trace.pop();
        Ok(value)
    }

    /// Strict float: an int literal is rejected even though it could coerce.
    pub fn float_field(&mut self, parent: &Object, key: &str) -> Result<f64> {
        self.trace.push_key(key);
        let value = match parent.get(key) {
            Some(Value::Number(n)) if n.is_f64() => n.as_f64().unwrap(),
            _ => return Err(self.trace.error("is missing or isn't a float")),
        };
        self.trace.pop();
        Ok(value)
    }

    pub fn str_field<'a>(&mut self, parent: &'a Object, key: &str) -> Result<&'a str> {
        self.trace.push_key(key);
        let value = parent
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| self.trace.error("is missing or isn't a string"))?;
        self.trace.pop();
        Ok(value)
    }

    pub fn array_field<'a>(&mut self, parent: &'a Object, key: &str) -> Result<&'a Vec<Value>> {
        self.trace.push_key(key);
        let value = parent
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| self.trace.error("is missing or isn't an array"))?;
        self.trace.pop();
        Ok(value)
    }

    /// Array element that must be an object. The index stays pushed while the
    /// caller walks into the element; callers pop when done with it.
    pub fn object_at<'a>(&mut self, element: &'a Value, index: usize) -> Result<&'a Object> {
        self.trace.push_index(index);
        element
            .as_object()
            .ok_or_else(|| self.trace.error("isn't an object"))
    }

    /// Array element that must itself be an array; index handling as
    /// [`Validator::object_at`].
    pub fn array_at<'a>(&mut self, element: &'a Value, index: usize) -> Result<&'a Vec<Value>> {
        self.trace.push_index(index);
        element
            .as_array()
            .ok_or_else(|| self.trace.error("isn't an array"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_bool_field() {
        let mut v = Validator::new();
        let parent = obj(json!({"flag": true}));
        assert!(v.bool_field(&parent, "flag").unwrap());

        let err = v.bool_field(&parent, "missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing config: config[\"missing\"] is missing or isn't a bool"
        );
    }

    #[test]
    fn test_int_field_rejects_float() {
        let mut v = Validator::new();
        let parent = obj(json!({"n": 1.5}));
        let err = v.int_field(&parent, "n").unwrap_err();
        assert!(err.to_string().contains("isn't an int"));
    }

    #[test]
    fn test_float_field_rejects_int_literal() {
        let mut v = Validator::new();
        let parent = obj(json!({"time_limit": 60}));
        let err = v.float_field(&parent, "time_limit").unwrap_err();
        assert!(err.to_string().contains("isn't a float"));

        let parent = obj(json!({"time_limit": 60.0}));
        assert_eq!(v.float_field(&parent, "time_limit").unwrap(), 60.0);
    }

    #[test]
    fn test_optional_bool_field() {
        let mut v = Validator::new();
        let parent = obj(json!({"b": false}));
        assert_eq!(v.optional_bool_field(&parent, "b").unwrap(), Some(false));
        assert_eq!(v.optional_bool_field(&parent, "missing").unwrap(), None);

        let parent = obj(json!({"b": 3}));
        assert!(v.optional_bool_field(&parent, "b").is_err());
    }

    #[test]
    fn test_nested_path_in_error() {
        let mut v = Validator::new();
        let root = json!({"worlds": [[{"stage_id": "oops"}]]});
        let root_obj = v.root_object(&root).unwrap().clone();

        let worlds = v.array_field(&root_obj, "worlds").unwrap().clone();
        v.push_key("worlds");
        let world = v.array_at(&worlds[0], 0).unwrap().clone();
        let stage = v.object_at(&world[0], 0).unwrap().clone();
        let err = v.int_field(&stage, "stage_id").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing config: config[\"worlds\"][0][0][\"stage_id\"] is missing or isn't an int"
        );
    }

    #[test]
    fn test_root_must_be_object() {
        let v = Validator::new();
        let err = v.root_object(&json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("root value is not an object"));
    }
}
