use crate::error::QueryError;
use guardrails::TableSchema;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw.to_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(QueryError::InvalidDirection(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `ORDER BY` target. The column is interpolated as an identifier,
/// so it is only ever built from a schema lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    column: String,
    direction: Direction,
}

impl OrderBy {
    /// Parses `"<column>"` or `"<column> ASC|DESC"` against `schema`.
    pub fn parse(raw: &str, schema: &TableSchema) -> Result<Self, QueryError> {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        let (column, direction) = match parts.as_slice() {
            [column] => (*column, Direction::Asc),
            [column, direction] => (*column, Direction::parse(direction)?),
            _ => return Err(QueryError::MalformedOrderBy(raw.to_string())),
        };
        let column = schema
            .resolve_column(column)
            .ok_or_else(|| QueryError::UnknownOrderColumn {
                table: schema.name().to_string(),
                column: column.to_string(),
            })?;
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }

    /// Parses an optional, possibly blank, order spec.
    pub fn parse_opt(raw: Option<&str>, schema: &TableSchema) -> Result<Option<Self>, QueryError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Self::parse(raw, schema).map(Some),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrails::SchemaRegistry;

    #[test]
    fn direction_defaults_and_normalizes() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("transaction").unwrap();

        let order = OrderBy::parse("CALL_START_TIME desc", schema).unwrap();
        assert_eq!(order.column(), "call_start_time");
        assert_eq!(order.direction(), Direction::Desc);

        let order = OrderBy::parse("outcome", schema).unwrap();
        assert_eq!(order.direction(), Direction::Asc);
    }

    #[test]
    fn bad_order_specs_fail() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("contact").unwrap();
        assert!(matches!(
            OrderBy::parse("nope", schema),
            Err(QueryError::UnknownOrderColumn { .. })
        ));
        assert!(matches!(
            OrderBy::parse("account sideways", schema),
            Err(QueryError::InvalidDirection(_))
        ));
        assert!(matches!(
            OrderBy::parse("account ASC; DROP TABLE x", schema),
            Err(QueryError::MalformedOrderBy(_))
        ));
        assert_eq!(OrderBy::parse_opt(Some("  "), schema), Ok(None));
    }
}
