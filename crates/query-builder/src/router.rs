use core_types::DatabaseType;

/// Marker substring that routes a database link to Postgres.
pub const DEFAULT_POSTGRES_MARKER: &str = "postgres";

/// Classifies a database link by naming convention.
///
/// Links containing `marker` (case-insensitively) are Postgres; everything
/// else, including a missing or empty link, is Oracle. Never fails.
pub fn classify(db_link: Option<&str>, marker: &str) -> DatabaseType {
    let marker = marker.trim().to_lowercase();
    match db_link {
        Some(link) if !marker.is_empty() && link.to_lowercase().contains(&marker) => {
            DatabaseType::Postgres
        }
        _ => DatabaseType::Oracle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_match_is_case_insensitive() {
        assert_eq!(classify(Some("PG_POSTGRES_01"), DEFAULT_POSTGRES_MARKER), DatabaseType::Postgres);
        assert_eq!(classify(Some("dial.postgres.internal"), "Postgres"), DatabaseType::Postgres);
    }

    #[test]
    fn everything_else_is_oracle() {
        assert_eq!(classify(Some("DIAL01.WORLD"), DEFAULT_POSTGRES_MARKER), DatabaseType::Oracle);
        assert_eq!(classify(Some(""), DEFAULT_POSTGRES_MARKER), DatabaseType::Oracle);
        assert_eq!(classify(None, DEFAULT_POSTGRES_MARKER), DatabaseType::Oracle);
        assert_eq!(classify(Some("postgres"), ""), DatabaseType::Oracle);
    }
}
