//! Filter trees (`where`) and ordering (`order_by`).

use std::fmt;
use std::str::FromStr;

use displaydoc::Display;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::json_ext::ValueExt;
use crate::payload::InputValue;
use crate::payload::PayloadError;

/// Key of the conjunction combinator.
pub const AND: &str = "_and";
/// Key of the disjunction combinator.
pub const OR: &str = "_or";

/// Errors raised while building a filter tree from loose JSON.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterError {
    /// a filter must be a JSON object, found {found} at '{at}'
    NotAnObject { at: String, found: &'static str },
    /// '{key}' at '{at}' must hold a list of filters
    CombinatorNotAList { at: String, key: String },
    /// '{at}' mixes comparison operators with nested fields
    MixedLeaf { at: String },
    /// operator '{operator}' at '{at}' expects a scalar or a list of scalars, found {found}
    InvalidOperand {
        at: String,
        operator: String,
        found: &'static str,
    },
    /// integer {value} at '{at}' does not fit in a signed 64-bit integer
    IntegerOutOfRange { at: String, value: String },
    /// unknown comparison operator '{0}'
    UnknownOperator(String),
    /// unknown order direction '{0}', expected 'asc' or 'desc'
    UnknownDirection(String),
}

/// A comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Like,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Like,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "_eq",
            Operator::Gt => "_gt",
            Operator::Gte => "_gte",
            Operator::Lt => "_lt",
            Operator::Lte => "_lte",
            Operator::In => "_in",
            Operator::Like => "_like",
        }
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|operator| operator.as_str() == s)
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar operand.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
}

/// The right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// Comparison operators applied to one field: the leaf of a filter tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison {
    operators: IndexMap<Operator, Operand>,
}

impl Comparison {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `operator`, replacing any earlier operand for it.
    pub fn with(mut self, operator: Operator, operand: impl Into<Operand>) -> Self {
        self.operators.insert(operator, operand.into());
        self
    }

    pub fn eq(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Eq, Operand::Scalar(value.into()))
    }

    pub fn gt(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Gt, Operand::Scalar(value.into()))
    }

    pub fn gte(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Gte, Operand::Scalar(value.into()))
    }

    pub fn lt(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Lt, Operand::Scalar(value.into()))
    }

    pub fn lte(self, value: impl Into<Scalar>) -> Self {
        self.with(Operator::Lte, Operand::Scalar(value.into()))
    }

    /// `_in`.
    pub fn one_of<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        self.with(
            Operator::In,
            Operand::List(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn like(self, pattern: impl Into<String>) -> Self {
        self.with(Operator::Like, Scalar::String(pattern.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operator, &Operand)> {
        self.operators.iter().map(|(operator, operand)| (*operator, operand))
    }
}

/// What a key of a [`Where`] tree maps to.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Operators applied to a field.
    Compare(Comparison),
    /// A filter on a related entity.
    Nested(Where),
    /// `_and`: every filter must match.
    All(Vec<Where>),
    /// `_or`: at least one filter must match.
    Any(Vec<Where>),
}

/// A `where` filter tree.
///
/// Keys are field names or the `_and`/`_or` combinators, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Where {
    entries: IndexMap<String, Filter>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `field` with the operators of `comparison`.
    pub fn field(mut self, field: impl Into<String>, comparison: Comparison) -> Self {
        self.entries
            .insert(field.into(), Filter::Compare(comparison));
        self
    }

    /// Filters on the related entity reached through `field`.
    pub fn nested(mut self, field: impl Into<String>, filter: Where) -> Self {
        self.entries.insert(field.into(), Filter::Nested(filter));
        self
    }

    /// Shorthand for `field(name, Comparison::new().eq(value))`.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.field(field, Comparison::new().eq(value))
    }

    /// `_and` over `filters`.
    pub fn and(mut self, filters: impl IntoIterator<Item = Where>) -> Self {
        self.entries
            .insert(AND.to_string(), Filter::All(filters.into_iter().collect()));
        self
    }

    /// `_or` over `filters`.
    pub fn or(mut self, filters: impl IntoIterator<Item = Where>) -> Self {
        self.entries
            .insert(OR.to_string(), Filter::Any(filters.into_iter().collect()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.entries.iter().map(|(key, filter)| (key.as_str(), filter))
    }

    /// Builds a filter tree from its JSON form, e.g.
    /// `{"author": {"name": {"_eq": "Ada"}}, "_or": [{"id": {"_gt": 3}}]}`.
    ///
    /// An object whose keys are all operators is a comparison; an object
    /// without operator keys is a nested filter; anything in between is an
    /// error.
    pub fn from_json(value: Value) -> Result<Self, FilterError> {
        Self::from_json_at(value, "")
    }

    fn from_json_at(value: Value, at: &str) -> Result<Self, FilterError> {
        let found = value.kind();
        let Value::Object(object) = value else {
            return Err(FilterError::NotAnObject {
                at: display_at(at),
                found,
            });
        };
        let mut filter = Where::new();
        for (key, value) in object {
            let key_at = if at.is_empty() {
                key.clone()
            } else {
                format!("{at}.{key}")
            };
            let entry = if key == AND || key == OR {
                let Value::Array(items) = value else {
                    return Err(FilterError::CombinatorNotAList { at: key_at, key });
                };
                let items = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| Self::from_json_at(item, &format!("{key_at}.{index}")))
                    .collect::<Result<Vec<_>, _>>()?;
                if key == AND {
                    Filter::All(items)
                } else {
                    Filter::Any(items)
                }
            } else {
                Self::filter_from_json(value, &key_at)?
            };
            filter.entries.insert(key, entry);
        }
        Ok(filter)
    }

    fn filter_from_json(value: Value, at: &str) -> Result<Filter, FilterError> {
        let found = value.kind();
        let Value::Object(object) = value else {
            return Err(FilterError::NotAnObject {
                at: at.to_string(),
                found,
            });
        };
        let operators = object
            .keys()
            .filter(|key| key.parse::<Operator>().is_ok())
            .count();
        if operators == 0 {
            return Self::from_json_at(Value::Object(object), at).map(Filter::Nested);
        }
        if operators != object.len() {
            return Err(FilterError::MixedLeaf { at: at.to_string() });
        }
        let mut comparison = Comparison::new();
        for (key, operand) in object {
            let operator = key.parse::<Operator>()?;
            let operand = Operand::from_json(operand).map_err(|error| match error {
                OperandError::Kind(found) => FilterError::InvalidOperand {
                    at: at.to_string(),
                    operator: key.clone(),
                    found,
                },
                OperandError::OutOfRange(value) => FilterError::IntegerOutOfRange {
                    at: at.to_string(),
                    value,
                },
            })?;
            comparison = comparison.with(operator, operand);
        }
        Ok(Filter::Compare(comparison))
    }

    /// The GraphQL input object for this tree.
    pub fn to_input_value(&self) -> InputValue {
        InputValue::Object(
            self.entries
                .iter()
                .map(|(key, filter)| (key.clone(), filter.to_input_value()))
                .collect(),
        )
    }

    /// Renders the tree as a GraphQL input object literal.
    pub fn serialize(&self) -> Result<String, PayloadError> {
        crate::payload::serialize(&self.to_input_value())
    }
}

impl TryFrom<Value> for Where {
    type Error = FilterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Where::from_json(value)
    }
}

fn display_at(at: &str) -> String {
    if at.is_empty() {
        "<root>".to_string()
    } else {
        at.to_string()
    }
}

impl Filter {
    fn to_input_value(&self) -> InputValue {
        match self {
            Filter::Compare(comparison) => InputValue::Object(
                comparison
                    .iter()
                    .map(|(operator, operand)| {
                        (operator.as_str().to_string(), operand.to_input_value())
                    })
                    .collect(),
            ),
            Filter::Nested(filter) => filter.to_input_value(),
            Filter::All(filters) | Filter::Any(filters) => {
                InputValue::List(filters.iter().map(Where::to_input_value).collect())
            }
        }
    }
}

/// Why a JSON value is not a valid operand.
enum OperandError {
    Kind(&'static str),
    OutOfRange(String),
}

impl Operand {
    fn from_json(value: Value) -> Result<Self, OperandError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(Scalar::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Operand::List),
            other => Scalar::from_json(other).map(Operand::Scalar),
        }
    }

    fn to_input_value(&self) -> InputValue {
        match self {
            Operand::Scalar(scalar) => scalar.to_input_value(),
            Operand::List(items) => {
                InputValue::List(items.iter().map(Scalar::to_input_value).collect())
            }
        }
    }
}

impl Scalar {
    fn from_json(value: Value) -> Result<Self, OperandError> {
        match value {
            Value::String(s) => Ok(Scalar::String(s)),
            Value::Bool(b) => Ok(Scalar::Boolean(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Scalar::Int(i)),
                None if n.is_u64() => Err(OperandError::OutOfRange(n.to_string())),
                None => n
                    .as_f64()
                    .map(Scalar::Float)
                    .ok_or(OperandError::Kind("number")),
            },
            other => Err(OperandError::Kind(other.kind())),
        }
    }

    fn to_input_value(&self) -> InputValue {
        match self {
            Scalar::String(s) => InputValue::String(s.clone()),
            Scalar::Int(i) => InputValue::Int(*i),
            Scalar::Float(f) => InputValue::Float(*f),
            Scalar::Boolean(b) => InputValue::Boolean(*b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<Scalar> for Operand {
    fn from(value: Scalar) -> Self {
        Operand::Scalar(value)
    }
}

impl From<Vec<Scalar>> for Operand {
    fn from(values: Vec<Scalar>) -> Self {
        Operand::List(values)
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl FromStr for Direction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(FilterError::UnknownDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordering term: a direction, or an ordering of a related entity.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderTerm {
    Direction(Direction),
    Nested(OrderBy),
}

/// `order_by`: fields in priority order, each with a direction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct OrderBy {
    terms: IndexMap<String, OrderTerm>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.terms
            .insert(field.into(), OrderTerm::Direction(direction));
        self
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.by(field, Direction::Asc)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.by(field, Direction::Desc)
    }

    /// Orders by fields of the related entity reached through `field`.
    pub fn nested(mut self, field: impl Into<String>, order: OrderBy) -> Self {
        self.terms.insert(field.into(), OrderTerm::Nested(order));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The GraphQL input object, with directions marked as enum values.
    pub fn to_input_value(&self) -> InputValue {
        InputValue::Object(
            self.terms
                .iter()
                .map(|(field, term)| {
                    let value = match term {
                        OrderTerm::Direction(direction) => {
                            InputValue::Enum(direction.as_str().to_string())
                        }
                        OrderTerm::Nested(order) => order.to_input_value(),
                    };
                    (field.clone(), value)
                })
                .collect(),
        )
    }

    /// Renders the ordering with unquoted directions: `{ created_at: desc }`.
    pub fn serialize(&self) -> Result<String, PayloadError> {
        crate::payload::serialize_enum_payload(&self.to_input_value())
    }
}
