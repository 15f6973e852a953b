//! Closed-vocabulary parameters

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relation kind between a base node and the nodes searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Parent,
    Children,
    Siblings,
    Ancestors,
    Descendants,
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::Parent,
        Relation::Children,
        Relation::Siblings,
        Relation::Ancestors,
        Relation::Descendants,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Parent => "parent",
            Relation::Children => "children",
            Relation::Siblings => "siblings",
            Relation::Ancestors => "ancestors",
            Relation::Descendants => "descendants",
        }
    }

    /// True when the relation yields at most one node
    pub fn is_single(&self) -> bool {
        matches!(self, Relation::Parent)
    }
}

/// Tree rendering style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    #[serde(rename = "ascii")]
    Ascii,
    #[serde(rename = "ascii-ex")]
    AsciiEx,
    #[serde(rename = "ascii-exr")]
    AsciiExr,
    #[serde(rename = "ascii-emh")]
    AsciiEmh,
    #[serde(rename = "ascii-emv")]
    AsciiEmv,
    #[serde(rename = "ascii-em")]
    AsciiEm,
}

impl Style {
    pub const ALL: [Style; 6] = [
        Style::Ascii,
        Style::AsciiEx,
        Style::AsciiExr,
        Style::AsciiEmh,
        Style::AsciiEmv,
        Style::AsciiEm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Ascii => "ascii",
            Style::AsciiEx => "ascii-ex",
            Style::AsciiExr => "ascii-exr",
            Style::AsciiEmh => "ascii-emh",
            Style::AsciiEmv => "ascii-emv",
            Style::AsciiEm => "ascii-em",
        }
    }
}

macro_rules! closed_choice {
    ($ty:ty, $kind:literal) => {
        impl FromStr for $ty {
            type Err = GateError;

            fn from_str(s: &str) -> Result<Self> {
                <$ty>::ALL
                    .into_iter()
                    .find(|choice| choice.as_str() == s)
                    .ok_or_else(|| GateError::UnknownChoice {
                        kind: $kind,
                        value: s.to_string(),
                        choices: <$ty>::ALL.iter().map(|c| c.as_str()).collect(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_choice!(Relation, "relation");
closed_choice!(Style, "style");
