//! Tagged setting values.
//!
//! Settings arrive from TOML, YAML, JSON, command flags and environment
//! variables. They are all normalized into [`Value`] so the store can compare,
//! display and type-check them uniformly.

use std::collections::BTreeMap;
use std::fmt;

/// A nested settings map. Keys are always lower-cased.
pub type ValueMap = BTreeMap<String, Value>;

/// A dynamically typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    /// Human-readable name of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "a boolean",
            Value::Int(_) => "an integer",
            Value::Float(_) => "a float",
            Value::String(_) => "a string",
            Value::List(_) => "a list",
            Value::Map(_) => "a map",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list as strings, provided every element is a scalar.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Bool(_) | Value::Int(_) | Value::Float(_) => Some(item.to_string()),
                    Value::List(_) | Value::Map(_) => None,
                })
                .collect(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert parsed file content into a setting value.
    ///
    /// Map keys are lower-cased at every depth so lookups are case-insensitive.
    /// `null` means "not specified" and yields `None`; null entries inside maps
    /// and lists are dropped.
    pub fn from_json(value: serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => Some(Value::String(s)),
            serde_json::Value::Array(items) => Some(Value::List(
                items.into_iter().filter_map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Some(Value::Map(
                map.into_iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.to_lowercase(), v)))
                    .collect(),
            )),
        }
    }

    /// Parse a raw string (an environment variable) into a value shaped like
    /// `like`. Without a template the raw string is kept as-is.
    ///
    /// Booleans accept the usual spellings (`1`, `t`, `true`, `0`, `f`,
    /// `false`, any case); lists are whitespace separated. Maps cannot be
    /// supplied this way.
    pub fn coerce_str(raw: &str, like: Option<&Value>) -> Result<Value, &'static str> {
        match like {
            None | Some(Value::String(_)) => Ok(Value::String(raw.to_string())),
            Some(Value::Bool(_)) => parse_bool(raw).map(Value::Bool).ok_or("a boolean"),
            Some(Value::Int(_)) => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| "an integer"),
            Some(Value::Float(_)) => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| "a float"),
            Some(Value::List(_)) => Ok(Value::List(
                raw.split_whitespace()
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            )),
            Some(Value::Map(_)) => Err("a value that is not a map"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Renders values the way the `config` command prints them: lists as
/// `[a b]`, maps as `map[k:v]` with sorted keys. Strings are not quoted here;
/// quoting of top-level strings is the reporter's job.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("map[")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::String).collect())
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_lowercases_nested_keys() {
        let value = Value::from_json(json!({"Outer": {"InnerKey": 1}})).unwrap();
        let outer = value.as_map().unwrap().get("outer").unwrap();
        assert_eq!(outer.as_map().unwrap().get("innerkey"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_from_json_drops_nulls() {
        assert_eq!(Value::from_json(json!(null)), None);
        let value = Value::from_json(json!({"a": null, "b": [1, null]})).unwrap();
        let map = value.as_map().unwrap();
        assert!(!map.contains_key("a"));
        assert_eq!(map.get("b"), Some(&Value::List(vec![Value::Int(1)])));
    }

    #[test]
    fn test_display_matches_config_listing() {
        let mut map = ValueMap::new();
        map.insert("tag".into(), "tags".into());
        map.insert("category".into(), "categories".into());
        assert_eq!(Value::Map(map).to_string(), "map[category:categories tag:tags]");
        assert_eq!(
            Value::from(vec!["a".to_string(), "b".to_string()]).to_string(),
            "[a b]"
        );
        assert_eq!(Value::List(vec![]).to_string(), "[]");
        assert_eq!(Value::Int(-1).to_string(), "-1");
    }

    #[test]
    fn test_coerce_follows_template_type() {
        assert_eq!(
            Value::coerce_str("TRUE", Some(&Value::Bool(false))),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            Value::coerce_str(" 42 ", Some(&Value::Int(0))),
            Ok(Value::Int(42))
        );
        assert_eq!(
            Value::coerce_str("a b", Some(&Value::List(vec![]))),
            Ok(Value::from(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(Value::coerce_str("x", None), Ok(Value::from("x")));
        assert!(Value::coerce_str("yes", Some(&Value::Bool(false))).is_err());
        assert!(Value::coerce_str("x", Some(&Value::Map(ValueMap::new()))).is_err());
    }

    #[test]
    fn test_string_list_rejects_nested() {
        let nested = Value::List(vec![Value::List(vec![])]);
        assert_eq!(nested.as_string_list(), None);
        let scalars = Value::List(vec![Value::from("a"), Value::Int(2)]);
        assert_eq!(
            scalars.as_string_list(),
            Some(vec!["a".to_string(), "2".to_string()])
        );
    }
}
