//! The filter DSL.
//!
//! Callers send a JSON mapping from column name to either a bare value
//! (equality), a two-element `[op, value]` array, or an `{"op": .., "value": ..}`
//! object. The shape is decided once, in [`Filter::from_json`]; everything
//! downstream works on the typed [`Filter`] and [`Predicate`].

use crate::binder::Binder;
use crate::date::coerce_date;
use crate::dialect::Dialect;
use crate::error::QueryError;
use core_types::SqlValue;
use guardrails::{QueryLimits, TableSchema};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// A comparison operator accepted by the filter DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    ILike,
    NotILike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

/// The operand shape an operator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Scalar,
    List,
    Pair,
    None,
}

impl Shape {
    fn expected(self) -> &'static str {
        match self {
            Shape::Scalar => "a single value",
            Shape::List => "a non-empty list",
            Shape::Pair => "a list of two values",
            Shape::None => "no value",
        }
    }
}

impl FilterOp {
    pub const ALL: [FilterOp; 15] = [
        FilterOp::Eq,
        FilterOp::Neq,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::Like,
        FilterOp::NotLike,
        FilterOp::ILike,
        FilterOp::NotILike,
        FilterOp::In,
        FilterOp::NotIn,
        FilterOp::Between,
        FilterOp::IsNull,
        FilterOp::IsNotNull,
    ];

    /// Parses an operator name or symbolic alias, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let op = match raw.trim().to_lowercase().as_str() {
            "eq" | "=" => FilterOp::Eq,
            "neq" | "!=" | "<>" => FilterOp::Neq,
            "gt" | ">" => FilterOp::Gt,
            "gte" | ">=" => FilterOp::Gte,
            "lt" | "<" => FilterOp::Lt,
            "lte" | "<=" => FilterOp::Lte,
            "like" => FilterOp::Like,
            "not_like" => FilterOp::NotLike,
            "ilike" => FilterOp::ILike,
            "not_ilike" => FilterOp::NotILike,
            "in" => FilterOp::In,
            "not_in" => FilterOp::NotIn,
            "between" => FilterOp::Between,
            "is_null" => FilterOp::IsNull,
            "is_not_null" => FilterOp::IsNotNull,
            _ => return Err(QueryError::UnknownOperator(raw.to_string())),
        };
        Ok(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::NotLike => "not_like",
            FilterOp::ILike => "ilike",
            FilterOp::NotILike => "not_ilike",
            FilterOp::In => "in",
            FilterOp::NotIn => "not_in",
            FilterOp::Between => "between",
            FilterOp::IsNull => "is_null",
            FilterOp::IsNotNull => "is_not_null",
        }
    }

    fn shape(&self) -> Shape {
        match self {
            FilterOp::In | FilterOp::NotIn => Shape::List,
            FilterOp::Between => Shape::Pair,
            FilterOp::IsNull | FilterOp::IsNotNull => Shape::None,
            _ => Shape::Scalar,
        }
    }

    /// Pattern operators bind their operand verbatim, never as a date.
    fn is_pattern(&self) -> bool {
        matches!(
            self,
            FilterOp::Like | FilterOp::NotLike | FilterOp::ILike | FilterOp::NotILike
        )
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value side of a filter, already in the shape its operator needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(SqlValue),
    List(Vec<SqlValue>),
    Pair(SqlValue, SqlValue),
    Absent,
}

impl Operand {
    fn map(self, f: impl Fn(SqlValue) -> SqlValue) -> Operand {
        match self {
            Operand::Scalar(v) => Operand::Scalar(f(v)),
            Operand::List(vs) => Operand::List(vs.into_iter().map(f).collect()),
            Operand::Pair(a, b) => Operand::Pair(f(a), f(b)),
            Operand::Absent => Operand::Absent,
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Operand::Scalar(v) => v.to_json(),
            Operand::List(vs) => JsonValue::Array(vs.iter().map(SqlValue::to_json).collect()),
            Operand::Pair(a, b) => JsonValue::Array(vec![a.to_json(), b.to_json()]),
            Operand::Absent => JsonValue::Null,
        }
    }
}

/// One filter entry, decided at the input boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// A bare value: `column = value`.
    Equals(SqlValue),
    /// An explicit operator with an operand of the matching shape.
    Operator { op: FilterOp, operand: Operand },
}

impl Filter {
    /// Builds a filter from an operator and its raw JSON operand, checking the
    /// operand shape. An explicit `eq` collapses to [`Filter::Equals`].
    pub fn new(column: &str, op: FilterOp, operand: Option<&JsonValue>) -> Result<Self, QueryError> {
        let invalid = |expected: &'static str| QueryError::InvalidOperand {
            column: column.to_string(),
            op: op.as_str().to_string(),
            expected,
        };

        let operand = match op.shape() {
            Shape::None => Operand::Absent,
            Shape::Scalar => match operand {
                Some(value) if !value.is_array() && !value.is_object() => {
                    Operand::Scalar(SqlValue::from_json(value)?)
                }
                _ => return Err(invalid("a single value")),
            },
            Shape::List => match operand {
                Some(JsonValue::Array(items)) if !items.is_empty() => Operand::List(
                    items
                        .iter()
                        .map(SqlValue::from_json)
                        .collect::<Result<_, _>>()?,
                ),
                _ => return Err(invalid("a non-empty list")),
            },
            Shape::Pair => match operand {
                Some(JsonValue::Array(items)) if items.len() == 2 => Operand::Pair(
                    SqlValue::from_json(&items[0])?,
                    SqlValue::from_json(&items[1])?,
                ),
                _ => return Err(invalid("a list of two values")),
            },
        };

        Ok(match (op, operand) {
            (FilterOp::Eq, Operand::Scalar(value)) => Filter::Equals(value),
            (op, operand) => Filter::Operator { op, operand },
        })
    }

    /// Decides the shape of one raw filter value.
    pub fn from_json(column: &str, raw: &JsonValue) -> Result<Self, QueryError> {
        match raw {
            JsonValue::Array(items) if items.len() == 2 => match &items[0] {
                JsonValue::String(op) => Filter::new(column, FilterOp::parse(op)?, Some(&items[1])),
                other => Err(QueryError::UnknownOperator(other.to_string())),
            },
            JsonValue::Object(descriptor) => match descriptor.get("op") {
                Some(JsonValue::String(op)) => {
                    Filter::new(column, FilterOp::parse(op)?, descriptor.get("value"))
                }
                Some(other) => Err(QueryError::UnknownOperator(other.to_string())),
                None => Err(QueryError::InvalidOperand {
                    column: column.to_string(),
                    op: FilterOp::Eq.as_str().to_string(),
                    expected: "a single value or an {op, value} descriptor",
                }),
            },
            JsonValue::Array(_) => Err(QueryError::InvalidOperand {
                column: column.to_string(),
                op: FilterOp::Eq.as_str().to_string(),
                expected: "a single value or an [op, value] pair",
            }),
            scalar => Ok(Filter::Equals(SqlValue::from_json(scalar)?)),
        }
    }

    pub fn op(&self) -> FilterOp {
        match self {
            Filter::Equals(_) => FilterOp::Eq,
            Filter::Operator { op, .. } => *op,
        }
    }

    pub fn operand(&self) -> Operand {
        match self {
            Filter::Equals(value) => Operand::Scalar(value.clone()),
            Filter::Operator { operand, .. } => operand.clone(),
        }
    }

    /// The canonical JSON spelling: a bare value, or `{"op", "value"}`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Filter::Equals(value) => value.to_json(),
            Filter::Operator { op, operand } => {
                let mut descriptor = Map::new();
                descriptor.insert("op".into(), JsonValue::String(op.as_str().into()));
                if !matches!(operand, Operand::Absent) {
                    descriptor.insert("value".into(), operand.to_json());
                }
                JsonValue::Object(descriptor)
            }
        }
    }
}

/// An ordered set of filters keyed by column, in caller insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<(String, Filter)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an optional JSON filter mapping. `null` and absent mean "no filters".
    pub fn from_json(raw: Option<&JsonValue>) -> Result<Self, QueryError> {
        match raw {
            None | Some(JsonValue::Null) => Ok(Self::new()),
            Some(JsonValue::Object(map)) => Self::from_map(map),
            Some(_) => Err(QueryError::FiltersNotAMapping),
        }
    }

    pub fn from_map(map: &Map<String, JsonValue>) -> Result<Self, QueryError> {
        let entries = map
            .iter()
            .map(|(column, raw)| Ok((column.clone(), Filter::from_json(column, raw)?)))
            .collect::<Result<_, QueryError>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.entries.iter().map(|(c, f)| (c.as_str(), f))
    }

    fn position(&self, column: &str) -> Option<usize> {
        let wanted = column.trim();
        self.entries
            .iter()
            .position(|(c, _)| c.trim().eq_ignore_ascii_case(wanted))
    }

    /// Case-insensitive column lookup.
    pub fn get(&self, column: &str) -> Option<&Filter> {
        self.position(column).map(|i| &self.entries[i].1)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// Replaces the filter on `column` (matched case-insensitively) in place,
    /// or appends it.
    pub fn insert(&mut self, column: &str, filter: Filter) {
        match self.position(column) {
            Some(i) => self.entries[i].1 = filter,
            None => self.entries.push((column.to_string(), filter)),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(c, f)| (c.clone(), f.to_json()))
                .collect(),
        )
    }
}

/// The SQL test a condition renders to. Only operator/operand pairings that
/// mean something have a variant.
#[derive(Debug, Clone, PartialEq)]
enum Test {
    IsNull,
    IsNotNull,
    Compare(&'static str, SqlValue),
    CaseInsensitive { negated: bool, pattern: SqlValue },
    Members { negated: bool, values: Vec<SqlValue> },
    Between(SqlValue, SqlValue),
}

impl Test {
    fn new(column: &str, op: FilterOp, operand: Operand) -> Result<Self, QueryError> {
        let mismatch = || QueryError::InvalidOperand {
            column: column.to_string(),
            op: op.as_str().to_string(),
            expected: op.shape().expected(),
        };

        Ok(match (op, operand) {
            (FilterOp::IsNull, Operand::Absent) => Test::IsNull,
            (FilterOp::IsNotNull, Operand::Absent) => Test::IsNotNull,
            (FilterOp::ILike, Operand::Scalar(pattern)) => Test::CaseInsensitive { negated: false, pattern },
            (FilterOp::NotILike, Operand::Scalar(pattern)) => Test::CaseInsensitive { negated: true, pattern },
            (FilterOp::In, Operand::List(values)) if !values.is_empty() => {
                Test::Members { negated: false, values }
            }
            (FilterOp::NotIn, Operand::List(values)) if !values.is_empty() => {
                Test::Members { negated: true, values }
            }
            (FilterOp::Between, Operand::Pair(low, high)) => Test::Between(low, high),
            (op, Operand::Scalar(value)) => match comparator(op) {
                Some(comparator) => Test::Compare(comparator, value),
                None => return Err(mismatch()),
            },
            _ => return Err(mismatch()),
        })
    }
}

fn comparator(op: FilterOp) -> Option<&'static str> {
    match op {
        FilterOp::Eq => Some("="),
        FilterOp::Neq => Some("<>"),
        FilterOp::Gt => Some(">"),
        FilterOp::Gte => Some(">="),
        FilterOp::Lt => Some("<"),
        FilterOp::Lte => Some("<="),
        FilterOp::Like => Some("LIKE"),
        FilterOp::NotLike => Some("NOT LIKE"),
        FilterOp::ILike
        | FilterOp::NotILike
        | FilterOp::In
        | FilterOp::NotIn
        | FilterOp::Between
        | FilterOp::IsNull
        | FilterOp::IsNotNull => None,
    }
}

/// A validated comparison against a canonical (lowercase) column.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    column: String,
    op: FilterOp,
    operand: Operand,
    test: Test,
}

impl Condition {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> FilterOp {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// The DSL filter this condition was translated from.
    pub fn to_filter(&self) -> Filter {
        match (self.op, &self.operand) {
            (FilterOp::Eq, Operand::Scalar(value)) => Filter::Equals(value.clone()),
            (op, operand) => Filter::Operator {
                op,
                operand: operand.clone(),
            },
        }
    }

    fn render(&self, dialect: &dyn Dialect, alias: Option<&str>, binder: &mut Binder) -> String {
        let ident = dialect.ident(&self.column);
        let column = match alias {
            Some(alias) => format!("{alias}.{ident}"),
            None => ident,
        };

        match &self.test {
            Test::IsNull => format!("{column} IS NULL"),
            Test::IsNotNull => format!("{column} IS NOT NULL"),
            Test::Compare(comparator, value) => {
                let placeholder = binder.bind(value.clone());
                format!("{column} {comparator} {placeholder}")
            }
            Test::CaseInsensitive { negated, pattern } => {
                let placeholder = binder.bind(pattern.clone());
                dialect.ilike(&column, &placeholder, *negated)
            }
            Test::Members { negated, values } => {
                let placeholders: Vec<String> =
                    values.iter().map(|v| binder.bind(v.clone())).collect();
                let comparator = if *negated { "NOT IN" } else { "IN" };
                format!("{column} {comparator} ({})", placeholders.join(", "))
            }
            Test::Between(low, high) => {
                let low = binder.bind(low.clone());
                let high = binder.bind(high.clone());
                format!("{column} BETWEEN {low} AND {high}")
            }
        }
    }
}

/// The conjunction of every filter on one table, validated against its schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Validates `filters` against `schema` and resolves every column.
    ///
    /// When `coerce_dates` is set, date-like text operands of comparison,
    /// list and range operators become date values.
    pub fn translate(
        filters: &FilterSet,
        schema: &TableSchema,
        limits: &QueryLimits,
        coerce_dates: bool,
    ) -> Result<Self, QueryError> {
        limits.validate_filter_count(filters.len())?;

        let mut conditions = Vec::with_capacity(filters.len());
        for (raw_column, filter) in filters.iter() {
            let column = schema
                .resolve_column(raw_column)
                .ok_or_else(|| QueryError::UnknownFilterColumn {
                    table: schema.name().to_string(),
                    column: raw_column.to_string(),
                })?
                .to_string();

            let op = filter.op();
            let mut operand = filter.operand();
            if let Operand::List(values) = &operand {
                limits.validate_in_values(&column, values.len())?;
            }
            if coerce_dates && !op.is_pattern() {
                operand = operand.map(coerce_date);
            }
            let test = Test::new(&column, op, operand.clone())?;
            conditions.push(Condition {
                column,
                op,
                operand,
                test,
            });
        }
        Ok(Self { conditions })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders the clauses joined with `AND`, binding operands through `binder`.
    /// Returns `None` when there is nothing to filter on.
    pub fn render(
        &self,
        dialect: &dyn Dialect,
        alias: Option<&str>,
        binder: &mut Binder,
    ) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|c| c.render(dialect, alias, binder))
            .collect();
        Some(clauses.join(" AND "))
    }

    /// The filters this predicate was translated from, keyed by canonical column.
    pub fn to_filter_set(&self) -> FilterSet {
        let mut set = FilterSet::new();
        for condition in &self.conditions {
            set.insert(&condition.column, condition.to_filter());
        }
        set
    }
}
