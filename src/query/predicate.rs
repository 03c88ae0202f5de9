//! Typed predicate tree.
//!
//! The compiler builds a [`Predicate`] out of [`PredicateGroup`]s, each of
//! which holds leaf [`Condition`]s that refer to bound parameters through
//! [`Placeholder`]s. Rendering to SQL text is a separate, deterministic step.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// String-literal escaping supplied by the storage backend.
///
/// Used for values that must be embedded in the statement text rather than
/// bound, such as JSON path segments.
pub trait Escaper {
    /// Escape `value` for use between single quotes.
    fn escape_literal(&self, value: &str) -> String;
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Uuid(Uuid),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
}

/// Positional parameter marker, rendered as `$n` (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Placeholder(pub usize);

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Journal table columns referenced by predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Topic,
    Timestamp,
    Payload,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Topic => "topic",
            Column::Timestamp => "timestamp",
            Column::Payload => "payload",
        }
    }
}

/// SQL type used for the payload column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadType {
    /// Binary JSON (PostgreSQL 9.4+).
    #[default]
    Jsonb,
    /// JSON text.
    Json,
}

impl PayloadType {
    pub fn for_capability(jsonb: bool) -> Self {
        if jsonb {
            PayloadType::Jsonb
        } else {
            PayloadType::Json
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            PayloadType::Jsonb => "JSONB",
            PayloadType::Json => "JSON",
        }
    }
}

/// How the value at the end of a payload path is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLeaf {
    /// Scalar: extracted as text with `->>` and compared to a text parameter.
    Text,
    /// Object or array: extracted with `->` and compared as a document.
    ///
    /// JSONB compares structurally against the parameter cast to JSONB. JSON
    /// has no equality operator, so the stored text is compared verbatim.
    Document(PayloadType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    ILike,
    Gte,
    Lte,
}

impl Comparator {
    fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::ILike => "ILIKE",
            Comparator::Gte => ">=",
            Comparator::Lte => "<=",
        }
    }
}

/// Logical operator joining the items of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    fn as_sql(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

/// Leaf condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <op> $n`
    Compare {
        column: Column,
        op: Comparator,
        value: Placeholder,
    },
    /// `column->'a'->'b'->>'c' = $n`
    ///
    /// Every segment but the last navigates structured JSON; how the last one
    /// is extracted and compared depends on `leaf`.
    JsonFieldEq {
        column: Column,
        path: Vec<String>,
        value: Placeholder,
        leaf: JsonLeaf,
    },
}

impl Condition {
    pub fn render(&self, escaper: &dyn Escaper) -> String {
        match self {
            Condition::Compare { column, op, value } => {
                format!("{} {} {}", column.as_str(), op.as_sql(), value)
            }
            Condition::JsonFieldEq {
                column,
                path,
                value,
                leaf,
            } => {
                let mut selector = column.as_str().to_string();
                let last = path.len().saturating_sub(1);
                for (i, segment) in path.iter().enumerate() {
                    let arrow = if i == last && *leaf == JsonLeaf::Text {
                        "->>"
                    } else {
                        "->"
                    };
                    selector.push_str(arrow);
                    selector.push('\'');
                    selector.push_str(&escaper.escape_literal(segment));
                    selector.push('\'');
                }
                match leaf {
                    JsonLeaf::Text => format!("{} = {}", selector, value),
                    JsonLeaf::Document(PayloadType::Jsonb) => {
                        format!("{} = CAST({} AS JSONB)", selector, value)
                    }
                    JsonLeaf::Document(PayloadType::Json) => {
                        format!("CAST({} AS TEXT) = {}", selector, value)
                    }
                }
            }
        }
    }
}

/// One constraint group, rendered as a single parenthesized clause.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateGroup {
    pub op: Operator,
    pub conditions: Vec<Condition>,
}

impl PredicateGroup {
    pub fn new(op: Operator, conditions: Vec<Condition>) -> Self {
        Self { op, conditions }
    }

    pub fn render(&self, escaper: &dyn Escaper) -> String {
        let separator = format!(" {} ", self.op.as_sql());
        let items: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| condition.render(escaper))
            .collect();
        format!("({})", items.join(&separator))
    }
}

/// Top-level predicate: groups joined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub groups: Vec<PredicateGroup>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Render to SQL. An empty predicate renders as an empty string.
    pub fn render(&self, escaper: &dyn Escaper) -> String {
        self.groups
            .iter()
            .map(|group| group.render(escaper))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}
