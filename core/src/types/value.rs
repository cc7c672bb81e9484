//! Stat values and the numeric widening rule.
//!
//! A stat is an integer, a float, or a string. Increments only ever take a
//! numeric delta ([`StatNumber`]), and once either side of an addition is a
//! float the result is a float.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;


/// Numeric kind of a stat or delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Integer,
    Float,
}


/// A numeric stat value or increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatNumber {
    Integer(i64),
    Float(f64),
}

impl StatNumber {
    pub fn kind(&self) -> NumericKind {
        match self {
            StatNumber::Integer(_) => NumericKind::Integer,
            StatNumber::Float(_) => NumericKind::Float,
        }
    }

    /// Integer view; floats truncate toward zero (saturating at the i64 bounds).
    pub fn as_i64(&self) -> i64 {
        match *self {
            StatNumber::Integer(i) => i,
            StatNumber::Float(f) => f as i64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            StatNumber::Integer(i) => i as f64,
            StatNumber::Float(f) => f,
        }
    }

    /// Add `delta` to `self`. Float on either side widens the result to a
    /// float; two integers stay integer (wrapping on overflow).
    pub fn widening_add(self, delta: StatNumber) -> StatNumber {
        match (self, delta) {
            (StatNumber::Integer(a), StatNumber::Integer(b)) => StatNumber::Integer(a.wrapping_add(b)),
            (a, b) => StatNumber::Float(a.as_f64() + b.as_f64()),
        }
    }

    /// Zero of the given kind, used when a stat has never been written.
    pub fn zero(kind: NumericKind) -> StatNumber {
        match kind {
            NumericKind::Integer => StatNumber::Integer(0),
            NumericKind::Float => StatNumber::Float(0.0),
        }
    }
}

impl From<i64> for StatNumber {
    fn from(v: i64) -> Self {
        StatNumber::Integer(v)
    }
}

impl From<i32> for StatNumber {
    fn from(v: i32) -> Self {
        StatNumber::Integer(v as i64)
    }
}

impl From<f64> for StatNumber {
    fn from(v: f64) -> Self {
        StatNumber::Float(v)
    }
}

impl fmt::Display for StatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatNumber::Integer(i) => write!(f, "{}", i),
            StatNumber::Float(v) => write!(f, "{:?}", v),
        }
    }
}


/// A single stat as held in the cache or the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl StatValue {
    /// Numeric view, or `None` for text.
    pub fn as_number(&self) -> Option<StatNumber> {
        match self {
            StatValue::Integer(i) => Some(StatNumber::Integer(*i)),
            StatValue::Float(f) => Some(StatNumber::Float(*f)),
            StatValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().map(|n| n.as_i64())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|n| n.as_f64())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StatValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    /// Convert to a YAML scalar. Floats stay floats (`7.0`, not `7`) so the
    /// numeric kind survives a save/load cycle.
    pub fn to_yaml(&self) -> Value {
        match self {
            StatValue::Integer(i) => Value::Number((*i).into()),
            StatValue::Float(f) => Value::Number((*f).into()),
            StatValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Read a YAML scalar. Mappings, sequences and nulls are not stats.
    pub fn from_yaml(value: &Value) -> Option<StatValue> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(StatValue::Integer(i))
                } else {
                    n.as_f64().map(StatValue::Float)
                }
            }
            Value::String(s) => Some(StatValue::Text(s.clone())),
            Value::Bool(b) => Some(StatValue::Text(b.to_string())),
            Value::Tagged(tagged) => StatValue::from_yaml(&tagged.value),
            Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }
}

impl From<StatNumber> for StatValue {
    fn from(n: StatNumber) -> Self {
        match n {
            StatNumber::Integer(i) => StatValue::Integer(i),
            StatNumber::Float(f) => StatValue::Float(f),
        }
    }
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Integer(v)
    }
}

impl From<i32> for StatValue {
    fn from(v: i32) -> Self {
        StatValue::Integer(v as i64)
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        StatValue::Float(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Integer(i) => write!(f, "{}", i),
            StatValue::Float(v) => write!(f, "{:?}", v),
            StatValue::Text(s) => f.write_str(s),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_plus_integer_stays_integer() {
        let r = StatNumber::Integer(5).widening_add(StatNumber::Integer(2));
        assert_eq!(r, StatNumber::Integer(7));
    }

    #[test]
    fn float_delta_widens() {
        let r = StatNumber::Integer(5).widening_add(StatNumber::Float(2.5));
        assert_eq!(r, StatNumber::Float(7.5));
    }

    #[test]
    fn float_current_absorbs_integer_delta() {
        let r = StatNumber::Float(7.5).widening_add(StatNumber::Integer(1));
        assert_eq!(r, StatNumber::Float(8.5));
        assert_eq!(r.kind(), NumericKind::Float);
    }

    #[test]
    fn float_truncates_to_integer() {
        assert_eq!(StatNumber::Float(8.9).as_i64(), 8);
        assert_eq!(StatNumber::Float(-2.7).as_i64(), -2);
        assert_eq!(StatValue::Float(3.99).as_i64(), Some(3));
    }

    #[test]
    fn text_is_not_numeric() {
        let v = StatValue::from("Steve");
        assert!(!v.is_numeric());
        assert_eq!(v.as_i64(), None);
        assert_eq!(v.as_str(), Some("Steve"));
    }

    #[test]
    fn zero_matches_kind() {
        assert_eq!(StatNumber::zero(NumericKind::Integer), StatNumber::Integer(0));
        assert_eq!(StatNumber::zero(NumericKind::Float), StatNumber::Float(0.0));
    }

    #[test]
    fn yaml_float_keeps_decimal_point() {
        let yaml = serde_yaml::to_string(&StatValue::Float(7.0).to_yaml()).unwrap();
        assert_eq!(yaml.trim(), "7.0");
        let parsed: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(StatValue::from_yaml(&parsed), Some(StatValue::Float(7.0)));
    }

    #[test]
    fn yaml_scalars_map_to_values() {
        let v: Value = serde_yaml::from_str("42").unwrap();
        assert_eq!(StatValue::from_yaml(&v), Some(StatValue::Integer(42)));
        let v: Value = serde_yaml::from_str("hello").unwrap();
        assert_eq!(StatValue::from_yaml(&v), Some(StatValue::Text("hello".into())));
        let v: Value = serde_yaml::from_str("{a: 1}").unwrap();
        assert_eq!(StatValue::from_yaml(&v), None);
        assert_eq!(StatValue::from_yaml(&Value::Null), None);
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_string(&StatValue::Integer(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&StatValue::Float(2.5)).unwrap(), "2.5");
        assert_eq!(serde_json::to_string(&StatValue::from("x")).unwrap(), "\"x\"");
    }

    #[test]
    fn display_float_keeps_fraction() {
        assert_eq!(StatValue::Float(10.0).to_string(), "10.0");
        assert_eq!(StatValue::Integer(10).to_string(), "10");
    }
}
