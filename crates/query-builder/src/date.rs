use chrono::{NaiveDate, NaiveDateTime};
use core_types::SqlValue;

/// Accepted date spellings, tried in order. `true` marks formats with a time part.
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%Y-%m-%d", false),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%d-%b-%Y", false),
    ("%d-%b-%y", false),
];

/// Converts a date-like text value into a date or datetime bind value.
///
/// The first matching format wins; anything else is returned unchanged.
pub fn coerce_date(value: SqlValue) -> SqlValue {
    let SqlValue::Text(text) = &value else {
        return value;
    };
    let text = text.trim();
    for (format, has_time) in DATE_FORMATS {
        if *has_time {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
                return SqlValue::DateTime(parsed);
            }
        } else if let Ok(parsed) = NaiveDate::parse_from_str(text, format) {
            return SqlValue::Date(parsed);
        }
    }
    value
}
