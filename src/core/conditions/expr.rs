//! Compiled condition tree

use super::operator::{Connector, Operator};
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;

/// Triplet value (string, number, bool, null or list)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<ConditionValue>),
}

impl ConditionValue {
    /// Convert a JSON value; maps are not valid triplet values
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => ConditionValue::Null,
            Value::Bool(b) => ConditionValue::Bool(*b),
            Value::Number(n) => ConditionValue::Number(n.clone()),
            Value::String(s) => ConditionValue::String(s.clone()),
            Value::Array(items) => ConditionValue::List(
                items.iter().map(Self::from_json).collect::<Result<_>>()?,
            ),
            Value::Object(_) => {
                return Err(GateError::parsing(
                    "conditions",
                    value,
                    "a string, number, bool, null or list value",
                ))
            }
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            ConditionValue::Null => Value::Null,
            ConditionValue::Bool(b) => Value::Bool(*b),
            ConditionValue::Number(n) => Value::Number(n.clone()),
            ConditionValue::String(s) => Value::String(s.clone()),
            ConditionValue::List(items) => {
                Value::Array(items.iter().map(ConditionValue::to_value).collect())
            }
        }
    }
}

/// Atomic `(field, operator, value)` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Triplet {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl Triplet {
    pub fn new(field: impl Into<String>, operator: Operator, value: ConditionValue) -> Self {
        Triplet {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::String(self.field.clone()),
            Value::String(self.operator.as_str().to_string()),
            self.value.to_value(),
        ])
    }
}

/// Non-empty sequence of items with a connector between each adjacent pair
///
/// Invariant: `connectors.len() + 1 == items.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<T> {
    items: Vec<T>,
    connectors: Vec<Connector>,
}

impl<T> Sequence<T> {
    pub fn new(first: T) -> Self {
        Sequence {
            items: vec![first],
            connectors: Vec::new(),
        }
    }

    /// Append `item`, joined to the previous one by `connector`
    pub fn push(&mut self, connector: Connector, item: T) {
        self.connectors.push(connector);
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a compiled sequence
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn render(&self, item: impl Fn(&T) -> Value) -> Value {
        let mut out = Vec::with_capacity(self.items.len() * 2);
        for (i, entry) in self.items.iter().enumerate() {
            if i > 0 {
                out.push(Value::String(self.connectors[i - 1].as_str().to_string()));
            }
            out.push(item(entry));
        }
        Value::Array(out)
    }
}

/// A clause inside a group
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Triplet(Triplet),
    Group(Group),
}

impl Clause {
    pub fn to_value(&self) -> Value {
        match self {
            Clause::Triplet(t) => t.to_value(),
            Clause::Group(g) => g.to_value(),
        }
    }
}

/// Bracketed sequence of clauses
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub clauses: Sequence<Clause>,
}

impl Group {
    pub fn to_value(&self) -> Value {
        self.clauses.render(Clause::to_value)
    }

    fn collect_triplets<'a>(&'a self, out: &mut Vec<&'a Triplet>) {
        for clause in self.clauses.items() {
            match clause {
                Clause::Triplet(t) => out.push(t),
                Clause::Group(g) => g.collect_triplets(out),
            }
        }
    }
}

/// Top-level condition expression: groups joined by connectors
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpr {
    pub groups: Sequence<Group>,
}

impl ConditionExpr {
    /// Canonical nested-list form with explicit connectors
    pub fn to_value(&self) -> Value {
        self.groups.render(Group::to_value)
    }

    /// Leaf triplets in source order
    pub fn triplets(&self) -> Vec<&Triplet> {
        let mut out = Vec::new();
        for group in self.groups.items() {
            group.collect_triplets(&mut out);
        }
        out
    }

    /// Distinct referenced field names, first occurrence order
    pub fn fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for triplet in self.triplets() {
            if !out.contains(&triplet.field.as_str()) {
                out.push(&triplet.field);
            }
        }
        out
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for ConditionExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn triplet(field: &str, op: Operator, value: Value) -> Clause {
        Clause::Triplet(Triplet::new(
            field,
            op,
            ConditionValue::from_json(&value).unwrap(),
        ))
    }

    #[test]
    fn test_render_explicit_connectors() {
        let mut clauses = Sequence::new(triplet("nid", Operator::Eq, json!("xx")));
        clauses.push(Connector::And, triplet("depth", Operator::Gt, json!(1)));
        let expr = ConditionExpr {
            groups: Sequence::new(Group { clauses }),
        };

        assert_eq!(
            expr.to_value(),
            json!([[["nid", "=", "xx"], "AND", ["depth", ">", 1]]])
        );
        assert_eq!(
            expr.to_string(),
            r#"[[["nid","=","xx"],"AND",["depth",">",1]]]"#
        );
        assert_eq!(expr.fields(), vec!["nid", "depth"]);
    }

    #[test]
    fn test_value_rejects_maps() {
        assert!(ConditionValue::from_json(&json!({"a": 1})).is_err());
        assert!(ConditionValue::from_json(&json!([1, {"a": 1}])).is_err());
        assert_eq!(
            ConditionValue::from_json(&json!(["a", 1, null, true])).unwrap(),
            ConditionValue::List(vec![
                ConditionValue::String("a".into()),
                ConditionValue::Number(1.into()),
                ConditionValue::Null,
                ConditionValue::Bool(true),
            ])
        );
    }

    #[test]
    fn test_untagged_value_serde() {
        let value: ConditionValue = serde_json::from_str(r#"["x", 2.5]"#).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["x",2.5]"#);
    }
}
