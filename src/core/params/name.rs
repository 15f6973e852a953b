//! Parameter names

use serde::{Serialize, Serializer};
use std::fmt;

/// Name of a coercible request parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    Nid,
    Fields,
    OrderBy,
    Axis,
    Limit,
    Conditions,
    Relation,
    IncludeBase,
    CheckSiblings,
    Nid0,
    Nid1,
    To,
    Node,
    SetValues,
    FieldName,
    Value,
    Values,
    Style,
    ExtraSpace,
}

impl ParamName {
    pub const ALL: [ParamName; 19] = [
        ParamName::Nid,
        ParamName::Fields,
        ParamName::OrderBy,
        ParamName::Axis,
        ParamName::Limit,
        ParamName::Conditions,
        ParamName::Relation,
        ParamName::IncludeBase,
        ParamName::CheckSiblings,
        ParamName::Nid0,
        ParamName::Nid1,
        ParamName::To,
        ParamName::Node,
        ParamName::SetValues,
        ParamName::FieldName,
        ParamName::Value,
        ParamName::Values,
        ParamName::Style,
        ParamName::ExtraSpace,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamName::Nid => "nid",
            ParamName::Fields => "fields",
            ParamName::OrderBy => "order_by",
            ParamName::Axis => "axis",
            ParamName::Limit => "limit",
            ParamName::Conditions => "conditions",
            ParamName::Relation => "relation",
            ParamName::IncludeBase => "include_base",
            ParamName::CheckSiblings => "check_siblings",
            ParamName::Nid0 => "nid0",
            ParamName::Nid1 => "nid1",
            ParamName::To => "to",
            ParamName::Node => "node",
            ParamName::SetValues => "set_values",
            ParamName::FieldName => "field_name",
            ParamName::Value => "value",
            ParamName::Values => "values",
            ParamName::Style => "style",
            ParamName::ExtraSpace => "extra_space",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Names that may be taken from the request path
    pub fn is_path_param(&self) -> bool {
        matches!(self, ParamName::Nid | ParamName::Nid0 | ParamName::Nid1)
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ParamName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
