//! Filter abstract syntax tree.

use crate::attributes::AttributeReference;

use serde_json::Number;
use std::fmt;

/// Comparison operators of the filter grammar (`pr` is [`Filter::Present`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Match an operator keyword, ignoring case. `pr` is not a comparison.
    pub fn from_keyword(word: &str) -> Option<Self> {
        let op = match word.to_ascii_lowercase().as_str() {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "co" => Self::Co,
            "sw" => Self::Sw,
            "ew" => Self::Ew,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            _ => return None,
        };
        Some(op)
    }

    /// Ordering operators require an ordinal attribute type.
    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Ge | Self::Lt | Self::Le)
    }

    /// Substring operators require a string attribute type.
    pub fn is_substring(self) -> bool {
        matches!(self, Self::Co | Self::Sw | Self::Ew)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Co => "co",
            Self::Sw => "sw",
            Self::Ew => "ew",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // JSON string escaping matches the grammar's \" and \\ escapes
            Self::String(s) => write!(f, "{}", serde_json::Value::String(s.clone())),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => f.write_str("null"),
        }
    }
}

/// A parsed filter expression.
///
/// Trees are immutable once parsed and carry no resource state, so one parsed
/// filter can be evaluated against any number of resources.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `attr op value`
    Comparison {
        attribute: AttributeReference,
        op: CompareOp,
        value: FilterValue,
    },
    /// `attr pr`
    Present(AttributeReference),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    /// Parenthesised expression
    Group(Box<Filter>),
    /// `attr[filter]`: some element of a multi-valued complex attribute matches
    Complex {
        attribute: AttributeReference,
        filter: Box<Filter>,
    },
}

impl Filter {
    pub fn and(left: Filter, right: Filter) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Filter, right: Filter) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison {
                attribute,
                op,
                value,
            } => write!(f, "{} {} {}", attribute, op, value),
            Self::Present(attribute) => write!(f, "{} pr", attribute),
            Self::And(left, right) => write!(f, "{} and {}", left, right),
            Self::Or(left, right) => write!(f, "{} or {}", left, right),
            Self::Not(inner) => write!(f, "not ({})", inner),
            Self::Group(inner) => write!(f, "({})", inner),
            Self::Complex { attribute, filter } => write!(f, "{}[{}]", attribute, filter),
        }
    }
}
