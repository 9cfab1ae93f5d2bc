use crate::error::GuardrailError;

/// Bounds applied to every query built by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Maximum number of rows a caller may ask for.
    pub max_rows: i64,
    /// Row limit used when the caller does not give one.
    pub default_limit: i64,
    /// Maximum pagination offset (prevents scanning huge result sets).
    pub max_offset: i64,
    /// Rows a single statement returns, applied after `max_rows`.
    pub page_cap: i64,
    /// Maximum number of values in an IN / NOT IN list.
    pub max_in_values: usize,
    /// Maximum number of filter conditions in one request.
    pub max_filters: usize,
}

impl QueryLimits {
    pub const DEFAULT: QueryLimits = QueryLimits {
        max_rows: 10_000,
        default_limit: 100,
        max_offset: 100_000,
        page_cap: 1_000,
        max_in_values: 1_000,
        max_filters: 20,
    };

    /// Validates the requested row limit and clamps it to `max_rows`.
    pub fn validate_limit(&self, limit: Option<i64>) -> Result<i64, GuardrailError> {
        match limit {
            None => Ok(self.default_limit),
            Some(n) if n < 1 => Err(GuardrailError::InvalidLimit),
            Some(n) => Ok(n.min(self.max_rows)),
        }
    }

    /// Validates the requested offset. Offsets beyond `max_offset` are rejected,
    /// not clamped.
    pub fn validate_offset(&self, offset: Option<i64>) -> Result<i64, GuardrailError> {
        match offset {
            None => Ok(0),
            Some(n) if n < 0 => Err(GuardrailError::NegativeOffset),
            Some(n) if n > self.max_offset => Err(GuardrailError::OffsetTooLarge(self.max_offset)),
            Some(n) => Ok(n),
        }
    }

    /// The number of rows one statement may actually fetch.
    pub fn clamp_page(&self, limit: i64) -> i64 {
        limit.clamp(1, self.page_cap)
    }

    pub fn validate_filter_count(&self, count: usize) -> Result<(), GuardrailError> {
        if count > self.max_filters {
            return Err(GuardrailError::TooManyFilters(self.max_filters));
        }
        Ok(())
    }

    pub fn validate_in_values(&self, column: &str, count: usize) -> Result<(), GuardrailError> {
        if count > self.max_in_values {
            return Err(GuardrailError::TooManyInValues {
                column: column.to_string(),
                max: self.max_in_values,
            });
        }
        Ok(())
    }
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_limit_uses_default() {
        assert_eq!(QueryLimits::DEFAULT.validate_limit(None).unwrap(), 100);
    }

    #[test]
    fn limit_is_clamped_to_max_rows_then_page_cap() {
        let limits = QueryLimits::DEFAULT;
        let validated = limits.validate_limit(Some(5_000)).unwrap();
        assert_eq!(validated, 5_000);
        assert_eq!(limits.clamp_page(validated), 1_000);
        assert_eq!(limits.validate_limit(Some(50_000)).unwrap(), 10_000);
    }

    #[test]
    fn non_positive_limits_fail() {
        let limits = QueryLimits::DEFAULT;
        assert_eq!(limits.validate_limit(Some(0)), Err(GuardrailError::InvalidLimit));
        assert_eq!(limits.validate_limit(Some(-1)), Err(GuardrailError::InvalidLimit));
    }

    #[test]
    fn offsets_are_bounded() {
        let limits = QueryLimits::DEFAULT;
        assert_eq!(limits.validate_offset(None).unwrap(), 0);
        assert_eq!(limits.validate_offset(Some(100_000)).unwrap(), 100_000);
        assert_eq!(limits.validate_offset(Some(-5)), Err(GuardrailError::NegativeOffset));
        assert_eq!(
            limits.validate_offset(Some(100_001)),
            Err(GuardrailError::OffsetTooLarge(100_000))
        );
    }

    #[test]
    fn filter_and_in_list_sizes_are_bounded() {
        let limits = QueryLimits::DEFAULT;
        assert!(limits.validate_filter_count(20).is_ok());
        assert!(limits.validate_filter_count(21).is_err());
        assert!(limits.validate_in_values("account", 1_000).is_ok());
        assert!(matches!(
            limits.validate_in_values("account", 1_001),
            Err(GuardrailError::TooManyInValues { .. })
        ));
    }
}
