//! Condition grammar parser
//!
//! ```text
//! Conditions := Group (Connector Group)*
//! Group      := "[" Clause (Connector Clause)* "]"
//! Clause     := Triplet | Group
//! Triplet    := "[" Field "," Operator "," Value "]"
//! Connector  := "AND" | "OR"      (omitted => AND)
//! ```
//!
//! A bracketed element whose first entry is itself a list (or a connector)
//! is a group; any other bracketed element is a triplet. Three entries with
//! an operator in the middle always form a triplet, so a field may be named
//! `AND` or `OR`.

use super::expr::{Clause, ConditionExpr, ConditionValue, Group, Sequence, Triplet};
use super::operator::{Connector, Operator};
use crate::core::literal;
use crate::error::{GateError, Result};
use serde_json::Value;

const FIELD: &str = "conditions";

/// Maximum group nesting
pub const MAX_NESTING: usize = 32;

/// Compiles raw condition input into a validated [`ConditionExpr`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionCompiler;

impl ConditionCompiler {
    /// Parse structured input or a string literal
    pub fn parse(raw: &Value) -> Result<ConditionExpr> {
        match raw {
            Value::Array(items) => parse_conditions(items),
            Value::String(s) => Self::parse_str(s),
            other => Err(GateError::parsing(FIELD, other, "list of condition groups")),
        }
    }

    /// Parse a string through the structured-literal decoder
    pub fn parse_str(raw: &str) -> Result<ConditionExpr> {
        let items = literal::decode_list(raw)
            .ok_or_else(|| GateError::conversion(format!("{raw:?}"), "list"))?;
        parse_conditions(&items)
    }
}

fn parse_conditions(items: &[Value]) -> Result<ConditionExpr> {
    let groups = parse_sequence(items, |item| match item {
        Value::Array(inner) if is_group(inner) => parse_group(inner, 1),
        other => Err(GateError::parsing(
            FIELD,
            other,
            "a group of triplets at the top level",
        )),
    })?;
    Ok(ConditionExpr { groups })
}

fn parse_group(items: &[Value], depth: usize) -> Result<Group> {
    if depth > MAX_NESTING {
        return Err(GateError::parsing(
            FIELD,
            format!("nesting deeper than {MAX_NESTING}"),
            "shallower groups",
        ));
    }
    let clauses = parse_sequence(items, |item| parse_clause(item, depth))?;
    Ok(Group { clauses })
}

fn parse_clause(item: &Value, depth: usize) -> Result<Clause> {
    match item {
        Value::Array(inner) if is_group(inner) => {
            parse_group(inner, depth + 1).map(Clause::Group)
        }
        Value::Array(inner) => parse_triplet(inner).map(Clause::Triplet),
        other => Err(GateError::parsing(FIELD, other, "a triplet or group")),
    }
}

fn is_group(items: &[Value]) -> bool {
    match items.first() {
        None => true,
        Some(Value::Array(_)) => true,
        Some(first) => connector(first).is_some() && !is_keyword_triplet(items),
    }
}

fn is_keyword_triplet(items: &[Value]) -> bool {
    match items {
        [_, Value::String(op), _] => op.parse::<Operator>().is_ok(),
        _ => false,
    }
}

fn connector(item: &Value) -> Option<Connector> {
    item.as_str().and_then(Connector::from_keyword)
}

fn parse_sequence<T>(items: &[Value], parse_item: impl Fn(&Value) -> Result<T>) -> Result<Sequence<T>> {
    let mut sequence: Option<Sequence<T>> = None;
    let mut pending: Option<Connector> = None;

    for item in items {
        if let Some(conn) = connector(item) {
            if sequence.is_none() {
                return Err(GateError::parsing(
                    FIELD,
                    format!("connector `{conn}` as first element"),
                    "connectors only between clauses",
                ));
            }
            if pending.is_some() {
                return Err(GateError::parsing(
                    FIELD,
                    format!("adjacent connectors before `{conn}`"),
                    "a single connector between clauses",
                ));
            }
            pending = Some(conn);
            continue;
        }

        let parsed = parse_item(item)?;
        match sequence.as_mut() {
            None => sequence = Some(Sequence::new(parsed)),
            Some(seq) => seq.push(pending.take().unwrap_or_default(), parsed),
        }
    }

    if let Some(conn) = pending {
        return Err(GateError::parsing(
            FIELD,
            format!("connector `{conn}` as last element"),
            "connectors only between clauses",
        ));
    }
    sequence.ok_or_else(|| GateError::parsing(FIELD, "[]", "a non-empty sequence"))
}

fn parse_triplet(items: &[Value]) -> Result<Triplet> {
    let [field, operator, value] = items else {
        return Err(GateError::parsing(
            FIELD,
            Value::Array(items.to_vec()),
            "a triplet [field, operator, value]",
        ));
    };

    let field = match field {
        Value::String(s) if !s.is_empty() => s.clone(),
        other => return Err(GateError::parsing(FIELD, other, "a non-empty field name")),
    };
    let operator = match operator {
        Value::String(s) => s.parse::<Operator>()?,
        other => {
            return Err(GateError::parsing(
                FIELD,
                other,
                &format!("one of {}", Operator::vocabulary()),
            ))
        }
    };
    let value = ConditionValue::from_json(value)?;

    Ok(Triplet {
        field,
        operator,
        value,
    })
}
