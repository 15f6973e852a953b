//! Operations consuming coerced parameters

use super::choice::Relation;
use super::name::ParamName;
use super::name::ParamName as P;
use crate::error::{GateError, Result};
use std::fmt;
use std::str::FromStr;

/// Anything that declares the parameters it accepts
pub trait Operation {
    /// Operation name, used in logs
    fn name(&self) -> &str;

    /// Parameters the operation accepts
    fn accepts(&self) -> &[ParamName];
}

/// Storage engine operations reachable from the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOperation {
    Node,
    NodesWhere,
    ParentNode,
    ChildrenNodes,
    SiblingsNodes,
    AncestorsNodes,
    DescendantsNodes,
    NodesRelationWhere,
    IsRelated,
    Path,
    DrawTree,
    AddNode,
    DeleteNode,
    DeleteNodesWhere,
    UpdateNode,
    UpdateNodesWhere,
    AppendNode,
    ExtendNode,
}

const LISTING: &[ParamName] = &[P::Nid, P::Fields, P::OrderBy, P::Axis, P::Limit];

impl EngineOperation {
    pub const ALL: [EngineOperation; 18] = [
        EngineOperation::Node,
        EngineOperation::NodesWhere,
        EngineOperation::ParentNode,
        EngineOperation::ChildrenNodes,
        EngineOperation::SiblingsNodes,
        EngineOperation::AncestorsNodes,
        EngineOperation::DescendantsNodes,
        EngineOperation::NodesRelationWhere,
        EngineOperation::IsRelated,
        EngineOperation::Path,
        EngineOperation::DrawTree,
        EngineOperation::AddNode,
        EngineOperation::DeleteNode,
        EngineOperation::DeleteNodesWhere,
        EngineOperation::UpdateNode,
        EngineOperation::UpdateNodesWhere,
        EngineOperation::AppendNode,
        EngineOperation::ExtendNode,
    ];

    /// Traversal operation for a relation kind
    pub fn for_relation(relation: Relation) -> Self {
        match relation {
            Relation::Parent => EngineOperation::ParentNode,
            Relation::Children => EngineOperation::ChildrenNodes,
            Relation::Siblings => EngineOperation::SiblingsNodes,
            Relation::Ancestors => EngineOperation::AncestorsNodes,
            Relation::Descendants => EngineOperation::DescendantsNodes,
        }
    }

    /// Single-node traversal; only `parent` yields one node
    pub fn single_relation(relation: Relation) -> Result<Self> {
        if !relation.is_single() {
            return Err(GateError::parsing("relation", relation, "parent"));
        }
        Ok(Self::for_relation(relation))
    }

    /// Listing traversal; `parent` is rejected
    pub fn listing_relation(relation: Relation) -> Result<Self> {
        if relation.is_single() {
            return Err(GateError::parsing(
                "relation",
                relation,
                "children, siblings, ancestors or descendants",
            ));
        }
        Ok(Self::for_relation(relation))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineOperation::Node => "node",
            EngineOperation::NodesWhere => "nodes_where",
            EngineOperation::ParentNode => "parent_node",
            EngineOperation::ChildrenNodes => "children_nodes",
            EngineOperation::SiblingsNodes => "siblings_nodes",
            EngineOperation::AncestorsNodes => "ancestors_nodes",
            EngineOperation::DescendantsNodes => "descendants_nodes",
            EngineOperation::NodesRelationWhere => "nodes_relation_where",
            EngineOperation::IsRelated => "is_related",
            EngineOperation::Path => "path",
            EngineOperation::DrawTree => "draw_tree",
            EngineOperation::AddNode => "add_node",
            EngineOperation::DeleteNode => "delete_node",
            EngineOperation::DeleteNodesWhere => "delete_nodes_where",
            EngineOperation::UpdateNode => "update_node",
            EngineOperation::UpdateNodesWhere => "update_nodes_where",
            EngineOperation::AppendNode => "append_node",
            EngineOperation::ExtendNode => "extend_node",
        }
    }

    /// True for operations that modify the tree
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            EngineOperation::AddNode
                | EngineOperation::DeleteNode
                | EngineOperation::DeleteNodesWhere
                | EngineOperation::UpdateNode
                | EngineOperation::UpdateNodesWhere
                | EngineOperation::AppendNode
                | EngineOperation::ExtendNode
        )
    }

    /// Blueprint the operation is served under, used as the authorization action
    pub fn blueprint(&self) -> &'static str {
        if self.is_write() {
            "writer"
        } else {
            "records"
        }
    }
}

impl Operation for EngineOperation {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn accepts(&self) -> &[ParamName] {
        match self {
            EngineOperation::Node | EngineOperation::ParentNode => &[P::Nid, P::Fields],
            EngineOperation::NodesWhere => {
                &[P::Conditions, P::Fields, P::OrderBy, P::Axis, P::Limit]
            }
            EngineOperation::ChildrenNodes
            | EngineOperation::SiblingsNodes
            | EngineOperation::AncestorsNodes
            | EngineOperation::DescendantsNodes => LISTING,
            EngineOperation::NodesRelationWhere => &[
                P::Relation,
                P::Conditions,
                P::Fields,
                P::OrderBy,
                P::Axis,
                P::Limit,
                P::IncludeBase,
            ],
            EngineOperation::IsRelated => &[P::Nid0, P::Nid1, P::CheckSiblings],
            EngineOperation::Path => &[P::Nid, P::To, P::Fields],
            EngineOperation::DrawTree => &[P::Nid, P::Style, P::ExtraSpace],
            EngineOperation::AddNode => &[P::Node],
            EngineOperation::DeleteNode => &[P::Nid],
            EngineOperation::DeleteNodesWhere => &[P::Conditions],
            EngineOperation::UpdateNode => &[P::Nid, P::SetValues],
            EngineOperation::UpdateNodesWhere => &[P::Conditions, P::SetValues],
            EngineOperation::AppendNode => &[P::Nid, P::FieldName, P::Value],
            EngineOperation::ExtendNode => &[P::Nid, P::FieldName, P::Values],
        }
    }
}

impl FromStr for EngineOperation {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        EngineOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| GateError::UnknownChoice {
                kind: "operation",
                value: s.to_string(),
                choices: EngineOperation::ALL.iter().map(|op| op.as_str()).collect(),
            })
    }
}

impl fmt::Display for EngineOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
