use crate::error::QueryError;
use chrono::{Datelike, NaiveDate};

const LIVE_TABLE: &str = "LVOUSR.TRANSACTION";

/// The `archive_count` calendar months strictly before `reference`'s month,
/// most recent first, as `(month, year)`.
fn previous_months(reference: NaiveDate, archive_count: u32) -> Vec<(u32, i32)> {
    let (mut month, mut year) = (reference.month(), reference.year());
    (0..archive_count)
        .map(|_| {
            if month == 1 {
                month = 12;
                year -= 1;
            } else {
                month -= 1;
            }
            (month, year)
        })
        .collect()
}

/// Lists the transaction tables a historical query unions over.
///
/// The live table on `dialing_db` always comes first. When `reporting_db` is
/// present, `archive_count` month-suffixed (`_MMYY`) archives on it follow,
/// newest first.
pub fn resolve_transaction_tables(
    dialing_db: &str,
    reporting_db: Option<&str>,
    archive_count: u32,
    reference: NaiveDate,
) -> Result<Vec<String>, QueryError> {
    let dialing_db = dialing_db.trim();
    if dialing_db.is_empty() {
        return Err(QueryError::MissingDialingDb);
    }

    let mut tables = vec![format!("{LIVE_TABLE}@{dialing_db}")];
    if let Some(reporting_db) = reporting_db.map(str::trim).filter(|r| !r.is_empty()) {
        for (month, year) in previous_months(reference, archive_count) {
            let suffix = format!("{month:02}{:02}", year.rem_euclid(100));
            tables.push(format!("{LIVE_TABLE}_{suffix}@{reporting_db}"));
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn archives_roll_back_across_the_year_boundary() {
        let tables = resolve_transaction_tables("D", Some("R"), 2, day(2026, 2, 18)).unwrap();
        assert_eq!(
            tables,
            vec![
                "LVOUSR.TRANSACTION@D",
                "LVOUSR.TRANSACTION_0126@R",
                "LVOUSR.TRANSACTION_1225@R",
            ]
        );
    }

    #[test]
    fn january_reaches_into_the_previous_year() {
        let tables = resolve_transaction_tables("D", Some("R"), 1, day(2026, 1, 5)).unwrap();
        assert_eq!(tables[1], "LVOUSR.TRANSACTION_1225@R");
    }

    #[test]
    fn no_reporting_db_or_zero_count_means_live_table_only() {
        assert_eq!(
            resolve_transaction_tables("D", None, 2, day(2026, 2, 18)).unwrap(),
            vec!["LVOUSR.TRANSACTION@D"]
        );
        assert_eq!(
            resolve_transaction_tables("D", Some("R"), 0, day(2026, 2, 18)).unwrap(),
            vec!["LVOUSR.TRANSACTION@D"]
        );
    }

    #[test]
    fn counts_beyond_the_configured_range_are_tolerated() {
        let tables = resolve_transaction_tables("D", Some("R"), 14, day(2026, 2, 18)).unwrap();
        assert_eq!(tables.len(), 15);
        assert_eq!(tables[14], "LVOUSR.TRANSACTION_1224@R");
    }

    #[test]
    fn dialing_db_is_required() {
        assert_eq!(
            resolve_transaction_tables(" ", Some("R"), 2, day(2026, 2, 18)),
            Err(QueryError::MissingDialingDb)
        );
    }
}
