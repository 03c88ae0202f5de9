//! Query compiler.
//!
//! Translates a [`Query`] into a parameterized SQL predicate. Group order is
//! fixed (id, topic, timestamp, payload) and placeholders are numbered in
//! order of first use, so the same query always compiles to the same text.

use serde_json::Value;

use super::predicate::{
    Column, Comparator, Condition, Escaper, JsonLeaf, Operator, Param, PayloadType, Placeholder,
    Predicate, PredicateGroup,
};
use super::Query;

/// Predicate text plus the parameters its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Rendered predicate; empty when the query is unconstrained.
    pub predicate: String,
    /// `params[i]` binds to placeholder `$i+1`.
    pub params: Vec<Param>,
}

impl CompiledQuery {
    /// Predicate suitable for a `WHERE` clause.
    ///
    /// An unconstrained query matches every row and yields `TRUE`.
    pub fn where_clause(&self) -> &str {
        if self.predicate.is_empty() {
            "TRUE"
        } else {
            &self.predicate
        }
    }
}

/// Ordered parameter list handing out placeholders.
#[derive(Debug, Default)]
struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    fn bind(&mut self, param: Param) -> Placeholder {
        self.params.push(param);
        Placeholder(self.params.len())
    }
}

/// Compiles queries against a backend-supplied [`Escaper`].
pub struct QueryCompiler<'e> {
    escaper: &'e dyn Escaper,
    payload_type: PayloadType,
}

impl<'e> QueryCompiler<'e> {
    /// Compiler for a JSONB payload column.
    pub fn new(escaper: &'e dyn Escaper) -> Self {
        Self {
            escaper,
            payload_type: PayloadType::default(),
        }
    }

    /// Set the payload column type object and array values are compared as.
    pub fn payload_type(mut self, payload_type: PayloadType) -> Self {
        self.payload_type = payload_type;
        self
    }

    pub fn compile(&self, query: &Query) -> CompiledQuery {
        let (predicate, params) = plan(query, self.payload_type);
        CompiledQuery {
            predicate: predicate.render(self.escaper),
            params,
        }
    }
}

/// Build the predicate tree and its parameter list without rendering.
pub fn plan(query: &Query, payload_type: PayloadType) -> (Predicate, Vec<Param>) {
    let mut params = ParamList::default();
    let mut predicate = Predicate::default();

    if !query.id.is_empty() {
        let conditions = query
            .id
            .iter()
            .map(|id| Condition::Compare {
                column: Column::Id,
                op: Comparator::Eq,
                value: params.bind(Param::Uuid(*id)),
            })
            .collect();
        predicate
            .groups
            .push(PredicateGroup::new(Operator::Or, conditions));
    }

    if !query.topic.is_empty() {
        let conditions = query
            .topic
            .iter()
            .map(|pattern| Condition::Compare {
                column: Column::Topic,
                op: Comparator::ILike,
                value: params.bind(Param::Text(glob_to_like(pattern))),
            })
            .collect();
        predicate
            .groups
            .push(PredicateGroup::new(Operator::Or, conditions));
    }

    if !query.timestamp.is_unbounded() {
        let mut conditions = Vec::with_capacity(2);
        if let Some(from) = query.timestamp.from {
            conditions.push(Condition::Compare {
                column: Column::Timestamp,
                op: Comparator::Gte,
                value: params.bind(Param::Timestamp(from)),
            });
        }
        if let Some(to) = query.timestamp.to {
            conditions.push(Condition::Compare {
                column: Column::Timestamp,
                op: Comparator::Lte,
                value: params.bind(Param::Timestamp(to)),
            });
        }
        predicate
            .groups
            .push(PredicateGroup::new(Operator::And, conditions));
    }

    // Payload fields are ORed: a message matches if any one field matches.
    if !query.payload.is_empty() {
        let conditions = query
            .payload
            .iter()
            .map(|(path, value)| {
                let leaf = match value {
                    Value::Object(_) | Value::Array(_) => JsonLeaf::Document(payload_type),
                    _ => JsonLeaf::Text,
                };
                Condition::JsonFieldEq {
                    column: Column::Payload,
                    path: path.split('.').map(str::to_string).collect(),
                    value: params.bind(Param::Text(json_leaf_text(value))),
                    leaf,
                }
            })
            .collect();
        predicate
            .groups
            .push(PredicateGroup::new(Operator::Or, conditions));
    }

    (predicate, params.params)
}

/// Rewrite a topic glob into an ILIKE pattern.
///
/// Only `*` is translated; literal `%` and `_` keep their LIKE meaning.
pub fn glob_to_like(pattern: &str) -> String {
    pattern.replace('*', "%")
}

/// Parameter text for a payload leaf.
///
/// Strings bind their contents, matching what `->>` extracts. Numbers and
/// booleans bind their JSON text, which `->>` also yields for them. Objects
/// and arrays bind compact JSON, which is cast to JSONB on the server or, on
/// a JSON column, matches text stored by this crate's encoder.
fn json_leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
