use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable feature identifier: the `osm_id` property, or the engine's own
/// feature id when the property is absent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

impl FeatureId {
    /// Converts a JSON scalar. Integral floats become numbers; other floats,
    /// booleans, null and containers are rejected.
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(FeatureId::Number(i));
                }
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some(FeatureId::Number(f as i64))
                } else {
                    None
                }
            }
            Value::String(s) => Some(FeatureId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FeatureId::Number(n) => Value::from(*n),
            FeatureId::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{n}"),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(v: i64) -> Self {
        FeatureId::Number(v)
    }
}

impl From<i32> for FeatureId {
    fn from(v: i32) -> Self {
        FeatureId::Number(v.into())
    }
}

impl From<&str> for FeatureId {
    fn from(v: &str) -> Self {
        FeatureId::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureId;
    use serde_json::json;

    #[test]
    fn from_value_accepts_scalars() {
        assert_eq!(FeatureId::from_value(&json!(42)), Some(FeatureId::Number(42)));
        assert_eq!(FeatureId::from_value(&json!(42.0)), Some(FeatureId::Number(42)));
        assert_eq!(FeatureId::from_value(&json!("w42")), Some(FeatureId::from("w42")));
        assert_eq!(FeatureId::from_value(&json!(1.5)), None);
        assert_eq!(FeatureId::from_value(&json!(null)), None);
        assert_eq!(FeatureId::from_value(&json!(true)), None);
    }

    #[test]
    fn serde_is_untagged() {
        let n: FeatureId = serde_json::from_value(json!(7)).unwrap();
        let s: FeatureId = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(n, FeatureId::Number(7));
        assert_eq!(s, FeatureId::Text("7".into()));
        assert_eq!(serde_json::to_value(&n).unwrap(), json!(7));
    }
}
