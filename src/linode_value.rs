//! Local attribute values and wire conversions.
//!
//! Unique responsibility: model the values an entity holds locally and convert
//! them to and from the JSON scalars the Linode API exchanges.
//!
//! The API is loose about types: the same field may come back as `1`, `"1"`
//! or `""` depending on the endpoint. [`Conversion`] normalizes that.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::Value;

/// A locally held attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// No value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered list of values.
    List(Vec<AttrValue>),
    /// Nested mapping.
    Map(BTreeMap<String, AttrValue>),
}

/// The variant of an [`AttrValue`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`AttrValue::Null`].
    Null,
    /// [`AttrValue::Bool`].
    Bool,
    /// [`AttrValue::Int`].
    Int,
    /// [`AttrValue::Float`].
    Float,
    /// [`AttrValue::Text`].
    Text,
    /// [`AttrValue::List`].
    List,
    /// [`AttrValue::Map`].
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

impl AttrValue {
    /// Kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// Build a value from raw JSON, keeping its natural shape.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the value as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(x) => serde_json::Number::from_f64(*x).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Integer payload, if this is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Text payload, if this is a `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// List payload, if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for AttrValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Type conversion applied between the wire and the local representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Integer.
    Int,
    /// Text.
    Text,
    /// Boolean.
    Bool,
    /// Integer when the value converts cleanly, text otherwise.
    IntOrText,
}

impl Conversion {
    /// Convert a wire value into its local form.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the value cannot be converted.
    pub fn to_local(self, value: &Value) -> Result<AttrValue, String> {
        match self {
            Self::Int => match value {
                Value::Null => Ok(AttrValue::Null),
                other => json_to_int(other).map(AttrValue::Int),
            },
            Self::Text => Ok(AttrValue::Text(json_to_text(value))),
            Self::Bool => json_to_bool(value).map(AttrValue::Bool),
            Self::IntOrText => match value {
                Value::Null => Ok(AttrValue::Null),
                other => Ok(json_to_int(other)
                    .map_or_else(|_| AttrValue::Text(json_to_text(other)), AttrValue::Int)),
            },
        }
    }

    /// Convert a local value into the form the API expects.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the value cannot be converted.
    pub fn to_wire(self, value: &AttrValue) -> Result<Value, String> {
        let json = value.to_json();
        match self {
            Self::Int => match value {
                AttrValue::Null => Ok(Value::Null),
                _ => json_to_int(&json).map(Value::from),
            },
            Self::Text => Ok(Value::String(json_to_text(&json))),
            Self::Bool => json_to_bool(&json).map(Value::Bool),
            Self::IntOrText => match value {
                AttrValue::Int(i) => Ok(Value::from(*i)),
                AttrValue::Null => Ok(Value::Null),
                _ => Ok(Value::String(json_to_text(&json))),
            },
        }
    }
}

fn json_to_int(value: &Value) -> Result<i64, String> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                #[allow(clippy::cast_possible_truncation)]
                Some(x) if x.fract() == 0.0 && x.abs() < 9.0e15 => Ok(x as i64),
                _ => Err(format!("{n} is not an integer")),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{s}' is not an integer")),
        Value::Null => Err("null is not an integer".to_string()),
        Value::Array(_) | Value::Object(_) => Err(format!("{value} is not an integer")),
    }
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|x| x != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(format!("'{s}' is not a boolean")),
        },
        Value::Array(_) | Value::Object(_) => Err(format!("{value} is not a boolean")),
    }
}

/// Python-like truthiness used by the open key/value reader.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !matches!(s.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn int_accepts_numeric_strings_and_integral_floats() {
        assert_eq!(Conversion::Int.to_local(&json!(42)).unwrap(), AttrValue::Int(42));
        assert_eq!(Conversion::Int.to_local(&json!("17")).unwrap(), AttrValue::Int(17));
        assert_eq!(Conversion::Int.to_local(&json!(3.0)).unwrap(), AttrValue::Int(3));
        assert_eq!(Conversion::Int.to_local(&json!(true)).unwrap(), AttrValue::Int(1));
        assert!(Conversion::Int.to_local(&json!("abc")).is_err());
        assert!(Conversion::Int.to_local(&json!(2.5)).is_err());
    }

    #[test]
    fn text_renders_scalars() {
        assert_eq!(Conversion::Text.to_local(&json!(5)).unwrap(), AttrValue::from("5"));
        assert_eq!(Conversion::Text.to_local(&Value::Null).unwrap(), AttrValue::from(""));
    }

    #[test]
    fn bool_follows_wire_conventions() {
        assert_eq!(Conversion::Bool.to_local(&json!(1)).unwrap(), AttrValue::Bool(true));
        assert_eq!(Conversion::Bool.to_local(&json!("0")).unwrap(), AttrValue::Bool(false));
        assert_eq!(Conversion::Bool.to_local(&json!("")).unwrap(), AttrValue::Bool(false));
        assert_eq!(Conversion::Bool.to_local(&json!("true")).unwrap(), AttrValue::Bool(true));
        assert!(Conversion::Bool.to_local(&json!("maybe")).is_err());
    }

    #[test]
    fn int_or_text_keeps_ambiguous_blanks() {
        assert_eq!(Conversion::IntOrText.to_local(&json!("")).unwrap(), AttrValue::from(""));
        assert_eq!(Conversion::IntOrText.to_local(&json!(10)).unwrap(), AttrValue::Int(10));
        assert_eq!(Conversion::IntOrText.to_local(&json!("10")).unwrap(), AttrValue::Int(10));
    }

    #[test]
    fn bool_to_int_on_the_wire() {
        assert_eq!(Conversion::Int.to_wire(&AttrValue::Bool(true)).unwrap(), json!(1));
        assert_eq!(Conversion::Bool.to_wire(&AttrValue::Int(0)).unwrap(), json!(false));
    }

    #[test]
    fn truthiness() {
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("yes")));
        assert!(!truthy(&json!("0")));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&Value::Null));
    }

    #[test]
    fn display_renders_lists() {
        let v = AttrValue::from(vec![AttrValue::Int(1), AttrValue::Null]);
        assert_eq!(v.to_string(), "[1, null]");
    }
}
