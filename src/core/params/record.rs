//! Raw request parameters and their coerced record

use super::choice::{Relation, Style};
use super::decode::{self, Converter};
use super::name::ParamName;
use super::operation::Operation;
use crate::core::conditions::{ConditionCompiler, ConditionExpr};
use crate::error::{GateError, Result};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Default sort axis (ascending)
pub const DEFAULT_AXIS: i64 = 1;

/// Untyped parameters gathered from a request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams(Map<String, Value>);

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        RawParams(map)
    }

    /// Combine request sources; path wins over payload, payload over query
    ///
    /// Only `nid`, `nid0` and `nid1` are taken from the path, percent-decoded
    /// as UTF-8 (invalid sequences become U+FFFD). Query values given once
    /// collapse to a scalar string.
    pub fn merge<P, Q, K, V>(path: P, payload: Option<Map<String, Value>>, query: Q) -> Self
    where
        P: IntoIterator<Item = (K, V)>,
        Q: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = Map::new();

        for (key, mut values) in query {
            let value = if values.len() == 1 {
                values.pop().map(|v| Value::String(v.into())).unwrap_or(Value::Null)
            } else {
                Value::Array(values.into_iter().map(|v| Value::String(v.into())).collect())
            };
            merged.insert(key.into(), value);
        }

        if let Some(payload) = payload {
            merged.extend(payload);
        }

        for (key, value) in path {
            let key = key.into();
            if ParamName::from_wire(&key).is_some_and(|p| p.is_path_param()) {
                let value: String = value.into();
                let decoded = percent_decode_str(&value).decode_utf8_lossy();
                merged.insert(key, Value::String(decoded.into_owned()));
            }
        }

        RawParams(merged)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawParams {
    fn from(map: Map<String, Value>) -> Self {
        RawParams(map)
    }
}

/// A coerced parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Strings(Vec<String>),
    Int(i64),
    Bool(bool),
    Conditions(ConditionExpr),
    Relation(Relation),
    Style(Style),
    Map(Map<String, Value>),
    Pairs(Vec<(String, Value)>),
    Any(Value),
    List(Vec<Value>),
}

impl ParamValue {
    /// JSON form forwarded to the storage engine
    pub fn to_value(&self) -> Value {
        match self {
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::Strings(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Conditions(expr) => expr.to_value(),
            ParamValue::Relation(r) => Value::String(r.as_str().to_string()),
            ParamValue::Style(s) => Value::String(s.as_str().to_string()),
            ParamValue::Map(map) => Value::Object(map.clone()),
            ParamValue::Pairs(pairs) => Value::Array(
                pairs
                    .iter()
                    .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                    .collect(),
            ),
            ParamValue::Any(value) => value.clone(),
            ParamValue::List(items) => Value::Array(items.clone()),
        }
    }
}

/// Arguments selected for one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kwargs(BTreeMap<ParamName, ParamValue>);

impl Kwargs {
    pub fn get(&self, name: ParamName) -> Option<&ParamValue> {
        self.0.get(&name)
    }

    pub fn contains(&self, name: ParamName) -> bool {
        self.0.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = ParamName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamName, &ParamValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object keyed by wire names
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_value()))
                .collect(),
        )
    }
}

/// Sparse, typed request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    pub nid: Option<String>,
    pub fields: Option<Vec<String>>,
    pub order_by: Option<Vec<String>>,
    pub axis: i64,
    pub limit: Option<i64>,
    pub conditions: Option<ConditionExpr>,
    pub relation: Option<Relation>,
    pub include_base: Option<bool>,
    pub check_siblings: Option<bool>,
    pub nid0: Option<String>,
    pub nid1: Option<String>,
    pub to: Option<String>,
    pub node: Option<Map<String, Value>>,
    pub set_values: Option<Vec<(String, Value)>>,
    pub field_name: Option<String>,
    pub value: Option<Value>,
    pub values: Option<Vec<Value>>,
    pub style: Option<Style>,
    pub extra_space: Option<bool>,
}

impl Default for ParameterRecord {
    fn default() -> Self {
        ParameterRecord {
            nid: None,
            fields: None,
            order_by: None,
            axis: DEFAULT_AXIS,
            limit: None,
            conditions: None,
            relation: None,
            include_base: None,
            check_siblings: None,
            nid0: None,
            nid1: None,
            to: None,
            node: None,
            set_values: None,
            field_name: None,
            value: None,
            values: None,
            style: None,
            extra_space: None,
        }
    }
}

impl ParameterRecord {
    /// Coerce raw parameters field by field: converter, then validator
    ///
    /// Unknown keys are ignored; JSON `null` counts as absent.
    ///
    /// # Errors
    ///
    /// - `Conversion` when a converter cannot normalize the raw value
    /// - `Parsing` when the normalized value has the wrong shape
    /// - `UnknownChoice` for a relation or style outside its vocabulary
    pub fn from_raw(raw: &RawParams) -> Result<Self> {
        use ParamName as P;

        let record = ParameterRecord {
            nid: coerce(raw, P::Nid, decode::identity, string)?,
            fields: coerce(raw, P::Fields, decode::list, strings)?,
            order_by: coerce(raw, P::OrderBy, decode::list, strings)?,
            axis: coerce(raw, P::Axis, decode::int, int)?.unwrap_or(DEFAULT_AXIS),
            limit: coerce(raw, P::Limit, decode::int, int)?,
            conditions: coerce(raw, P::Conditions, decode::list, conditions)?,
            relation: coerce(raw, P::Relation, decode::identity, relation)?,
            include_base: coerce(raw, P::IncludeBase, decode::boolean, boolean)?,
            check_siblings: coerce(raw, P::CheckSiblings, decode::boolean, boolean)?,
            nid0: coerce(raw, P::Nid0, decode::identity, string)?,
            nid1: coerce(raw, P::Nid1, decode::identity, string)?,
            to: coerce(raw, P::To, decode::identity, string)?,
            node: coerce(raw, P::Node, decode::structured, map)?,
            set_values: coerce(raw, P::SetValues, decode::list, pairs)?,
            field_name: coerce(raw, P::FieldName, decode::identity, string)?,
            value: coerce(raw, P::Value, decode::structured, any)?,
            values: coerce(raw, P::Values, decode::list, list)?,
            style: coerce(raw, P::Style, decode::identity, style)?,
            extra_space: coerce(raw, P::ExtraSpace, decode::boolean, boolean)?,
        };
        debug!("Coerced {} raw parameters", raw.len());
        Ok(record)
    }

    /// Value of one field, `None` when absent
    pub fn get(&self, name: ParamName) -> Option<ParamValue> {
        use ParamName as P;

        match name {
            P::Nid => self.nid.clone().map(ParamValue::Str),
            P::Fields => self.fields.clone().map(ParamValue::Strings),
            P::OrderBy => self.order_by.clone().map(ParamValue::Strings),
            P::Axis => Some(ParamValue::Int(self.axis)),
            P::Limit => self.limit.map(ParamValue::Int),
            P::Conditions => self.conditions.clone().map(ParamValue::Conditions),
            P::Relation => self.relation.map(ParamValue::Relation),
            P::IncludeBase => self.include_base.map(ParamValue::Bool),
            P::CheckSiblings => self.check_siblings.map(ParamValue::Bool),
            P::Nid0 => self.nid0.clone().map(ParamValue::Str),
            P::Nid1 => self.nid1.clone().map(ParamValue::Str),
            P::To => self.to.clone().map(ParamValue::Str),
            P::Node => self.node.clone().map(ParamValue::Map),
            P::SetValues => self.set_values.clone().map(ParamValue::Pairs),
            P::FieldName => self.field_name.clone().map(ParamValue::Str),
            P::Value => self.value.clone().map(ParamValue::Any),
            P::Values => self.values.clone().map(ParamValue::List),
            P::Style => self.style.map(ParamValue::Style),
            P::ExtraSpace => self.extra_space.map(ParamValue::Bool),
        }
    }

    /// Non-null fields declared by `operation`
    pub fn get_kwargs(&self, operation: &dyn Operation) -> Kwargs {
        let kwargs: BTreeMap<_, _> = operation
            .accepts()
            .iter()
            .filter_map(|name| self.get(*name).map(|value| (*name, value)))
            .collect();
        debug!(
            "Forwarding {} parameters to '{}'",
            kwargs.len(),
            operation.name()
        );
        Kwargs(kwargs)
    }
}

type Validator<T> = fn(ParamName, Value) -> Result<T>;

fn coerce<T>(
    raw: &RawParams,
    name: ParamName,
    convert: Converter,
    validate: Validator<T>,
) -> Result<Option<T>> {
    let value = match raw.get(name.as_str()) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => convert(value.clone())?,
    };
    if value.is_null() {
        return Ok(None);
    }
    validate(name, value).map(Some)
}

fn mismatch(name: ParamName, value: &Value, expected: &str) -> GateError {
    GateError::parsing(name.as_str(), value, expected)
}

fn string(name: ParamName, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(mismatch(name, &other, "str | None")),
    }
}

fn strings(name: ParamName, value: Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(mismatch(name, &value, "list[str] | None"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(mismatch(name, &other, "list[str] | None")),
        })
        .collect()
}

fn list(name: ParamName, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(mismatch(name, &other, "list | None")),
    }
}

fn pairs(name: ParamName, value: Value) -> Result<Vec<(String, Value)>> {
    let Value::Array(items) = value else {
        return Err(mismatch(name, &value, "list[(str, Any)] | None"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Array(pair) => match <[Value; 2]>::try_from(pair) {
                Ok([Value::String(field), value]) => Ok((field, value)),
                Ok(pair) => Err(mismatch(name, &Value::Array(pair.into()), "(str, Any)")),
                Err(pair) => Err(mismatch(name, &Value::Array(pair), "(str, Any)")),
            },
            other => Err(mismatch(name, &other, "(str, Any)")),
        })
        .collect()
}

fn int(name: ParamName, value: Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| mismatch(name, &value, "int | None"))
}

fn boolean(name: ParamName, value: Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| mismatch(name, &value, "bool | None"))
}

fn map(name: ParamName, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(mismatch(name, &other, "dict[str, Any] | None")),
    }
}

fn any(_name: ParamName, value: Value) -> Result<Value> {
    Ok(value)
}

fn conditions(_name: ParamName, value: Value) -> Result<ConditionExpr> {
    ConditionCompiler::parse(&value)
}

fn relation(name: ParamName, value: Value) -> Result<Relation> {
    match value {
        Value::String(s) => s.parse(),
        other => Err(mismatch(name, &other, "str | None")),
    }
}

fn style(name: ParamName, value: Value) -> Result<Style> {
    match value {
        Value::String(s) => s.parse(),
        other => Err(mismatch(name, &other, "str | None")),
    }
}
