//! Defines the [`Value`] type for author-supplied metadata and its conversion
//! into template values ([`gtmpl_value::Value`]).

use gtmpl_value::Value as TemplateValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Author-supplied metadata: a mapping from key to [`Value`].
pub type Metadata = BTreeMap<String, Value>;

/// A single front-matter value. Both YAML and JSON metadata blocks decode
/// into this type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the string contents if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders scalars the way an author would have written them. Used for
    /// keys like `date` and `time`, where YAML may hand us a number.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<&Value> for TemplateValue {
    /// Converts [`Value`]s into template values. Mappings become objects so
    /// templates can use field access (`.page.title`).
    fn from(v: &Value) -> TemplateValue {
        match v {
            Value::Null => TemplateValue::Nil,
            Value::Bool(b) => TemplateValue::Bool(*b),
            Value::Integer(i) => TemplateValue::from(*i),
            Value::Float(f) => TemplateValue::from(*f),
            Value::String(s) => TemplateValue::String(s.clone()),
            Value::Sequence(items) => {
                TemplateValue::Array(items.iter().map(TemplateValue::from).collect())
            }
            Value::Mapping(m) => object(m.iter().map(|(k, v)| (k.clone(), v.into()))),
        }
    }
}

/// Builds a [`TemplateValue::Object`] from key/value pairs.
pub fn object(pairs: impl IntoIterator<Item = (String, TemplateValue)>) -> TemplateValue {
    TemplateValue::Object(pairs.into_iter().collect::<HashMap<_, _>>())
}

/// Builds a [`TemplateValue::Array`] of strings.
pub fn strings<'a>(items: impl IntoIterator<Item = &'a String>) -> TemplateValue {
    TemplateValue::Array(
        items
            .into_iter()
            .map(|s| TemplateValue::String(s.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_untagged_yaml() {
        let meta: Metadata =
            serde_yaml::from_str("title: Hi\ncount: 3\nratio: 0.5\ntags: [a, b]\ndraft: false\n")
                .unwrap();
        assert_eq!(meta["title"], Value::from("Hi"));
        assert_eq!(meta["count"], Value::Integer(3));
        assert_eq!(meta["ratio"], Value::Float(0.5));
        assert_eq!(
            meta["tags"],
            Value::Sequence(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(meta["draft"], Value::Bool(false));
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(Value::Integer(2024).to_plain_string().as_deref(), Some("2024"));
        assert_eq!(Value::Null.to_plain_string(), None);
    }

    #[test]
    fn test_template_object() {
        let mut m = BTreeMap::new();
        m.insert("k".to_owned(), Value::from("v"));
        match TemplateValue::from(&Value::Mapping(m)) {
            TemplateValue::Object(obj) => match obj.get("k") {
                Some(TemplateValue::String(s)) => assert_eq!(s, "v"),
                _ => panic!("missing string field `k`"),
            },
            _ => panic!("expected an object"),
        }
    }
}
